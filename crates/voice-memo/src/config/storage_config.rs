use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where recordings are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory; recordings land in `<root>/recordings/<folder>/`.
    pub recordings_root: PathBuf,
}
