use polars::prelude::DataFrame;

use crate::pipeline::{PipelineError, Transform};

/// Customer-identifying and non-predictive columns removed before the
/// dataset is persisted.
pub const DEFAULT_DROP_COLUMNS: [&str; 12] = [
    "name",
    "mobile_number",
    "address",
    "city",
    "pincode",
    "connection_type",
    "tariff_plan",
    "connection_date",
    "phase",
    "status",
    "reading_date",
    "voltage_status",
];

/// Name-list-driven column drop. Absent columns are ignored.
#[derive(Clone, Debug)]
pub struct ColumnPruner {
    drop_columns: Vec<String>,
}

impl Default for ColumnPruner {
    fn default() -> Self {
        Self {
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ColumnPruner {
    /// The default drop-list extended with `extra` columns.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pruner = Self::default();
        for name in extra {
            let name = name.into();
            if !pruner.drop_columns.contains(&name) {
                pruner.drop_columns.push(name);
            }
        }
        pruner
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    pub fn prune(&self, mut df: DataFrame) -> DataFrame {
        let dropped: Vec<&str> = self
            .drop_columns
            .iter()
            .map(String::as_str)
            .filter(|name| df.drop_in_place(name).is_ok())
            .collect();
        metrics::counter!("pruned_columns_total").increment(dropped.len() as u64);
        tracing::debug!(dropped = ?dropped, "columns removed");
        df
    }
}

impl Transform for ColumnPruner {
    fn name(&self) -> &'static str {
        "column_pruner"
    }

    fn apply(&self, input: DataFrame) -> Result<DataFrame, PipelineError> {
        Ok(self.prune(input))
    }
}
