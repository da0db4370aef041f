pub mod features;
pub mod prune;
pub mod quality;

pub use features::FeatureTransformer;
pub use prune::ColumnPruner;
pub use quality::RequireRows;

use std::sync::Arc;

use crate::pipeline::Transform;

/// The standard dataset-preparation chain: quality check, feature
/// derivation, then column pruning.
pub fn standard_chain(pruner: ColumnPruner) -> Vec<Arc<dyn Transform>> {
    vec![
        Arc::new(RequireRows),
        Arc::new(FeatureTransformer),
        Arc::new(pruner),
    ]
}
