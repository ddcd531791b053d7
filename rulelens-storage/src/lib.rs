//! Dataset loading for RuleLens
//!
//! Provides the read-only sources for transactions, feature vectors
//! and rules. Supports both in-memory (for development) and JSON file
//! backends.

pub mod error;
pub mod file;
pub mod loader;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use file::JsonFileSource;
pub use loader::load_dataset;
pub use memory::InMemorySource;
pub use traits::DatasetSource;
