//! Configuration for the storage engine

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration options for the storage engine
///
/// The memtable consumes exactly one knob, `memtable_size`; it is handed
/// to [`MemTable::from_config`] explicitly rather than read from a
/// process-wide source, so tests and embedders can run several engines
/// with different limits side by side.
///
/// # Example
///
/// ```
/// use siltdb_storage::StorageConfig;
///
/// let config = StorageConfig {
///     data_dir: "./data".into(),
///     memtable_size: 4 * 1024 * 1024, // 4MB
/// };
/// assert_eq!(config.memtable_size, 4 * 1024 * 1024);
/// ```
///
/// [`MemTable::from_config`]: crate::MemTable::from_config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where flushed sorted tables are placed
    pub data_dir: PathBuf,

    /// Maximum byte size of the active skip list before it is frozen
    pub memtable_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            memtable_size: 4 * 1024 * 1024, // 4MB
        }
    }
}
