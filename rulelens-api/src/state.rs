//! Application state shared across handlers

use rulelens_core::Dataset;
use rulelens_engine::BatchEvaluator;
use rulelens_storage::{load_dataset, DatasetSource, StorageError};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::selection::{Selection, SelectionAction, SelectionError};

/// Shared application state
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub selection: Arc<RwLock<Selection>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_dataset(Dataset::empty())
    }

    /// Create around an already loaded dataset
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            selection: Arc::new(RwLock::new(Selection::default())),
        }
    }

    /// Load every dataset from `source` before serving anything
    pub async fn from_source(source: &dyn DatasetSource) -> Result<Self, StorageError> {
        let dataset = load_dataset(source).await?;
        Ok(Self::with_dataset(dataset))
    }

    pub fn batch(&self) -> BatchEvaluator<'_> {
        BatchEvaluator::from_dataset(&self.dataset)
    }

    pub async fn selection(&self) -> Selection {
        self.selection.read().await.clone()
    }

    /// Replace the selection with the result of `action`.
    pub async fn update_selection(
        &self,
        action: &SelectionAction,
    ) -> Result<Selection, SelectionError> {
        let mut guard = self.selection.write().await;
        let next = guard.apply(action, &self.dataset)?;
        *guard = next.clone();
        Ok(next)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
