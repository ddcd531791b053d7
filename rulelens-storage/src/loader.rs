//! Loads the three datasets and assembles the validated Dataset

use rulelens_core::{Dataset, FeatureIndex};

use crate::{DatasetSource, StorageError};

/// Fetch all three datasets concurrently, then validate and index them.
///
/// Any failed fetch aborts the load; nothing is evaluated on partial data.
pub async fn load_dataset(source: &dyn DatasetSource) -> Result<Dataset, StorageError> {
    tracing::info!("Loading datasets from {}", source.describe());

    let (transactions, feature_vectors, rules) = tokio::try_join!(
        source.load_transactions(),
        source.load_feature_vectors(),
        source.load_rules(),
    )?;

    let features = FeatureIndex::build(feature_vectors)?;
    let dataset = Dataset::new(transactions, features, rules)?;

    let orphans = dataset.orphan_feature_count();
    if orphans > 0 {
        tracing::warn!(
            "{} feature vectors reference unknown transactions and will be ignored",
            orphans
        );
    }

    tracing::info!(
        "Loaded {} transactions, {} feature vectors, {} rules",
        dataset.transactions().len(),
        dataset.features().len(),
        dataset.rules().len()
    );

    Ok(dataset)
}
