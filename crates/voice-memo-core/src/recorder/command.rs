use crate::{
    failure::Failure,
    permission::PermissionState,
    recorder::{LifecycleSnapshot, StartRequest},
};

use tokio::sync::oneshot;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, Failure>>;

/// Commands sent from a [`ControllerHandle`](crate::ControllerHandle) to the
/// controller task.
pub(crate) enum Command {
    Start {
        request: StartRequest,
        reply: Reply<LifecycleSnapshot>,
    },
    Pause {
        reply: Reply<LifecycleSnapshot>,
    },
    Resume {
        reply: Reply<LifecycleSnapshot>,
    },
    Stop {
        final_name: Option<String>,
        reply: Reply<LifecycleSnapshot>,
    },
    Cancel {
        reply: Reply<LifecycleSnapshot>,
    },
    CheckPermissions {
        reply: Reply<PermissionState>,
    },
    RequestPermissions {
        reply: Reply<PermissionState>,
    },
    Snapshot {
        reply: oneshot::Sender<LifecycleSnapshot>,
    },
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Pause { .. } => "pause",
            Command::Resume { .. } => "resume",
            Command::Stop { .. } => "stop",
            Command::Cancel { .. } => "cancel",
            Command::CheckPermissions { .. } => "check_permissions",
            Command::RequestPermissions { .. } => "request_permissions",
            Command::Snapshot { .. } => "snapshot",
        }
    }
}
