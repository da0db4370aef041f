use serde::{Deserialize, Serialize};

/// The derived feature vector consumed by training and inference alike.
///
/// Field order matches [`MeterFeatures::FIELD_NAMES`] and the column order of
/// the persisted feature dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterFeatures {
    pub voltage: f64,
    pub temperature: f64,
    pub power_factor: f64,
    pub load_kw: f64,
    pub frequency_hz: f64,
    pub hour: i64,
    pub day_of_week: i64,
    pub is_weekend: i64,
    pub voltage_flag: i64,
    pub pf_issue: i64,
    pub high_temp: i64,
    pub load_intensity: f64,
}

impl MeterFeatures {
    pub const FIELD_NAMES: [&'static str; 12] = [
        "voltage",
        "temperature",
        "power_factor",
        "load_kw",
        "frequency_hz",
        "hour",
        "day_of_week",
        "is_weekend",
        "voltage_flag",
        "pf_issue",
        "high_temp",
        "load_intensity",
    ];

    /// Flatten into model input order.
    pub fn to_vector(&self) -> [f64; 12] {
        [
            self.voltage,
            self.temperature,
            self.power_factor,
            self.load_kw,
            self.frequency_hz,
            self.hour as f64,
            self.day_of_week as f64,
            self.is_weekend as f64,
            self.voltage_flag as f64,
            self.pf_issue as f64,
            self.high_temp as f64,
            self.load_intensity,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "voltage": 220.5,
            "temperature": 25.0,
            "power_factor": 0.95,
            "load_kw": 2.5,
            "frequency_hz": 50.0,
            "hour": 12,
            "day_of_week": 2,
            "is_weekend": 0,
            "voltage_flag": 1,
            "pf_issue": 0,
            "high_temp": 0,
            "load_intensity": 10.5
        })
    }

    #[test]
    fn deserializes_complete_record() {
        let f: MeterFeatures = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(f.voltage, 220.5);
        assert_eq!(f.hour, 12);
        assert_eq!(f.to_vector()[5], 12.0);
        assert_eq!(f.to_vector()[11], 10.5);
    }

    #[test]
    fn rejects_missing_field() {
        let mut v = sample_json();
        v.as_object_mut().unwrap().remove("load_intensity");
        assert!(serde_json::from_value::<MeterFeatures>(v).is_err());
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        let mut v = sample_json();
        v["voltage"] = serde_json::json!("not_a_number");
        assert!(serde_json::from_value::<MeterFeatures>(v).is_err());

        let mut v = sample_json();
        v["hour"] = serde_json::json!(12.5);
        assert!(serde_json::from_value::<MeterFeatures>(v).is_err());
    }

    #[test]
    fn rejects_unknown_field() {
        let mut v = sample_json();
        v["units"] = serde_json::json!(5.0);
        assert!(serde_json::from_value::<MeterFeatures>(v).is_err());
    }
}
