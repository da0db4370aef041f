use polars::prelude::*;

use crate::{
    frame::{has_column, numeric_column, text_column},
    model::Regressor,
    pipeline::PipelineError,
    training::{feature_matrix, TARGET},
};

/// Identifier columns carried from the dataset into the predictions file.
const ID_COLUMNS: [&str; 2] = ["id", "meter_id"];

/// Score every row of a prepared dataset.
///
/// Missing feature cells are imputed with their column mean. The output has
/// `id`, `meter_id`, `actual_units` and `predicted_units`; identifier or target
/// columns absent from the dataset come out empty.
pub fn score_table(model: &dyn Regressor, df: &DataFrame) -> Result<DataFrame, PipelineError> {
    let x = feature_matrix(df, model.feature_names())?;
    let predicted: Vec<f64> = x.outer_iter().map(|row| model.predict(row)).collect();

    let n = df.height();
    let mut columns = Vec::with_capacity(ID_COLUMNS.len() + 2);
    for name in ID_COLUMNS {
        let ids = if has_column(df, name) {
            text_column(df, name)?.with_name(name.into()).into_series()
        } else {
            Series::full_null(name.into(), n, &DataType::String)
        };
        columns.push(ids.into_column());
    }
    let actual = if has_column(df, TARGET) {
        numeric_column(df, TARGET)?.into_series()
    } else {
        Series::full_null(TARGET.into(), n, &DataType::Float64)
    };
    columns.push(actual.with_name("actual_units".into()).into_column());
    columns.push(Series::new("predicted_units".into(), predicted).into_column());

    metrics::counter!("batch_predictions_total").increment(n as u64);
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView1;

    use crate::frame::column_names;

    struct SumModel {
        names: Vec<String>,
    }

    impl Regressor for SumModel {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
            features.sum()
        }
    }

    #[test]
    fn scores_rows_with_mean_imputation() {
        let model = SumModel {
            names: vec!["a".to_string(), "b".to_string()],
        };
        let df = df!(
            "meter_id" => ["M-1", "M-2"],
            "units" => [Some(4.0), None],
            "a" => [1i64, 3],
            "b" => [None, Some(10.0)]
        )
        .unwrap();

        let out = score_table(&model, &df).unwrap();
        assert_eq!(column_names(&out), vec!["id", "meter_id", "actual_units", "predicted_units"]);
        assert_eq!(out.column("id").unwrap().null_count(), 2);
        assert_eq!(text_column(&out, "meter_id").unwrap().get(1), Some("M-2"));

        let actual: Vec<Option<f64>> = numeric_column(&out, "actual_units").unwrap().iter().collect();
        assert_eq!(actual, vec![Some(4.0), None]);
        let predicted: Vec<Option<f64>> = numeric_column(&out, "predicted_units").unwrap().iter().collect();
        assert_eq!(predicted, vec![Some(11.0), Some(13.0)]);
    }

    #[test]
    fn missing_feature_column_is_fatal() {
        let model = SumModel {
            names: vec!["load_intensity".to_string()],
        };
        let df = df!("units" => [1i64]).unwrap();
        let err = score_table(&model, &df).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "load_intensity"));
    }
}
