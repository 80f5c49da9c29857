use crate::AppResult;

use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;
use voice_memo_core::{PermissionKind, PermissionOracle, PermissionStatus};

/// Permission oracle for desktop hosts.
///
/// Desktop audio APIs do not prompt, so the microphone is always granted;
/// missing hardware is reported separately by the capture service. Storage
/// is granted when the recordings root is writable.
pub struct DesktopPermissionOracle {
    recordings_root: PathBuf,
}

impl DesktopPermissionOracle {
    /// Oracle checking writability of `recordings_root`.
    pub fn new(recordings_root: impl Into<PathBuf>) -> Self {
        Self {
            recordings_root: recordings_root.into(),
        }
    }

    fn storage_status(&self) -> PermissionStatus {
        match Self::probe_writable(&self.recordings_root) {
            Ok(()) => PermissionStatus::Granted,
            Err(e) => {
                warn!(recordings_root = ?self.recordings_root, error = %e, "Recordings root is not writable");
                PermissionStatus::Denied
            }
        }
    }

    #[track_caller]
    fn probe_writable(root: &Path) -> AppResult<()> {
        fs::create_dir_all(root)?;
        let probe = root.join(format!(".write-probe-{}", Uuid::new_v4()));
        fs::File::create(&probe)?;
        fs::remove_file(&probe)?;
        debug!(recordings_root = ?root, "Recordings root is writable");
        Ok(())
    }
}

#[async_trait]
impl PermissionOracle for DesktopPermissionOracle {
    async fn status(&self, kind: PermissionKind) -> PermissionStatus {
        match kind {
            PermissionKind::Microphone => PermissionStatus::Granted,
            PermissionKind::Storage => self.storage_status(),
        }
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        // Nothing to prompt on desktop; re-check in case the user fixed it.
        let status = self.status(kind).await;
        info!(permission = %kind, status = %status, "Permission re-checked");
        status
    }
}
