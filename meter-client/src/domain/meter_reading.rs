/// One raw meter reading joined with the owning customer's metadata.
///
/// Every column is fetched as text: raw tables are loaded from CSV exports
/// and their column types are not trusted. Numeric coercion happens later in
/// the feature pipeline, where unparseable cells become missing values.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct MeterReadingRow {
    pub id: Option<String>,
    pub meter_id: Option<String>,
    pub reading_date: Option<String>,
    pub units: Option<String>,
    pub voltage: Option<String>,
    pub temperature: Option<String>,
    pub power_factor: Option<String>,
    pub load_kw: Option<String>,
    pub frequency_hz: Option<String>,
    pub phase: Option<String>,
    pub status: Option<String>,

    // customer metadata
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub connection_type: Option<String>,
    pub tariff_plan: Option<String>,
    pub connection_date: Option<String>,
}

impl MeterReadingRow {
    /// Column names in the order returned by [`MeterReadingRow::cells`].
    pub const COLUMNS: [&'static str; 19] = [
        "id",
        "meter_id",
        "reading_date",
        "units",
        "voltage",
        "temperature",
        "power_factor",
        "load_kw",
        "frequency_hz",
        "phase",
        "status",
        "name",
        "mobile_number",
        "address",
        "city",
        "pincode",
        "connection_type",
        "tariff_plan",
        "connection_date",
    ];

    pub fn cells(&self) -> [Option<&str>; 19] {
        [
            self.id.as_deref(),
            self.meter_id.as_deref(),
            self.reading_date.as_deref(),
            self.units.as_deref(),
            self.voltage.as_deref(),
            self.temperature.as_deref(),
            self.power_factor.as_deref(),
            self.load_kw.as_deref(),
            self.frequency_hz.as_deref(),
            self.phase.as_deref(),
            self.status.as_deref(),
            self.name.as_deref(),
            self.mobile_number.as_deref(),
            self.address.as_deref(),
            self.city.as_deref(),
            self.pincode.as_deref(),
            self.connection_type.as_deref(),
            self.tariff_plan.as_deref(),
            self.connection_date.as_deref(),
        ]
    }
}
