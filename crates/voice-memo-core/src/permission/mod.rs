//! Permission oracle contract.
//!
//! The oracle answers with a fixed enum and never fails across the boundary;
//! implementations map their own errors onto [`PermissionStatus`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which authorization is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Microphone input.
    Microphone,
    /// Platform storage for the recording artifact.
    Storage,
}

impl PermissionKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Microphone => "microphone",
            PermissionKind::Storage => "storage",
        }
    }

    /// Capitalized name for messages.
    pub fn label(&self) -> &'static str {
        match self {
            PermissionKind::Microphone => "Microphone",
            PermissionKind::Storage => "Storage",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Fully authorized.
    Granted,
    /// Refused, the user may be asked again.
    Denied,
    /// Refused and the platform will not prompt again.
    PermanentlyDenied,
    /// Blocked by policy (parental controls, MDM).
    Restricted,
    /// Partially authorized.
    Limited,
    /// Authorized provisionally.
    Provisional,
}

impl PermissionStatus {
    /// `Granted`, `Limited` and `Provisional` allow recording.
    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            PermissionStatus::Granted | PermissionStatus::Limited | PermissionStatus::Provisional
        )
    }

    /// Whether prompting again can change the outcome.
    pub fn can_request(&self) -> bool {
        matches!(self, PermissionStatus::Denied)
    }

    /// Stable snake_case name, also used as the failure code.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::PermanentlyDenied => "permanently_denied",
            PermissionStatus::Restricted => "restricted",
            PermissionStatus::Limited => "limited",
            PermissionStatus::Provisional => "provisional",
        }
    }

    /// Phrase used in failure messages.
    pub fn describe(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::PermanentlyDenied => "permanently denied; enable it in system settings",
            PermissionStatus::Restricted => "restricted by system policy",
            PermissionStatus::Limited => "limited",
            PermissionStatus::Provisional => "provisionally granted",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single check or request. Never cached by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionState {
    /// Whether recording from the microphone is authorized.
    pub has_microphone_permission: bool,
    /// Whether an input device is present.
    pub has_microphone_hardware: bool,
    /// Raw microphone status, distinguishing permanent denial.
    pub microphone: PermissionStatus,
}

impl PermissionState {
    /// Whether a recording could start right now.
    pub fn can_record(&self) -> bool {
        self.has_microphone_permission && self.has_microphone_hardware
    }

    /// Whether the caller should send the user to system settings.
    pub fn needs_settings(&self) -> bool {
        matches!(
            self.microphone,
            PermissionStatus::PermanentlyDenied | PermissionStatus::Restricted
        )
    }
}

/// Source of platform authorization.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Current status. Side-effect free and safe to call at any time.
    async fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Ask the platform for authorization, possibly prompting the user.
    ///
    /// Call at most once per user gesture.
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}
