use crate::{
    ControllerError, ControllerResult,
    failure::Failure,
    permission::PermissionState,
    recorder::{Command, LifecycleSnapshot, StartRequest},
};

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

/// Cloneable front end to a running [`RecordingController`](crate::RecordingController).
///
/// Commands are queued and processed one at a time. Each resolves to the
/// snapshot or failure that was also emitted to the event sink. The
/// controller is disposed when [`dispose`](Self::dispose) is called or the
/// last handle is dropped.
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: mpsc::Sender<Command>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ControllerHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, shutdown_tx: watch::Sender<bool>) -> Self {
        Self {
            command_tx,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Begin a new recording.
    pub async fn start(&self, request: StartRequest) -> ControllerResult<LifecycleSnapshot> {
        self.call(|reply| Command::Start { request, reply }).await
    }

    /// Pause the running recording.
    pub async fn pause(&self) -> ControllerResult<LifecycleSnapshot> {
        self.call(|reply| Command::Pause { reply }).await
    }

    /// Resume the paused recording.
    pub async fn resume(&self) -> ControllerResult<LifecycleSnapshot> {
        self.call(|reply| Command::Resume { reply }).await
    }

    /// Finalize the recording, naming it `final_name` when non-blank.
    pub async fn stop(&self, final_name: Option<String>) -> ControllerResult<LifecycleSnapshot> {
        self.call(|reply| Command::Stop { final_name, reply }).await
    }

    /// Discard the recording and delete its artifact.
    pub async fn cancel(&self) -> ControllerResult<LifecycleSnapshot> {
        self.call(|reply| Command::Cancel { reply }).await
    }

    /// Query authorization without prompting.
    pub async fn check_permissions(&self) -> ControllerResult<PermissionState> {
        self.call(|reply| Command::CheckPermissions { reply }).await
    }

    /// Prompt for authorization. Call once per user gesture.
    pub async fn request_permissions(&self) -> ControllerResult<PermissionState> {
        self.call(|reply| Command::RequestPermissions { reply }).await
    }

    /// The most recently emitted snapshot.
    pub async fn snapshot(&self) -> ControllerResult<LifecycleSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| ControllerError::closed())
    }

    /// Stop the controller, releasing feed subscriptions and timers.
    ///
    /// Idempotent, never blocks, and interrupts an in-flight capture call.
    /// The capture session itself is left to the capture service's owner.
    pub fn dispose(&self) {
        if !self.shutdown_tx.send_replace(true) {
            debug!("Recording controller dispose requested");
        }
    }

    /// Whether the controller task has exited.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, Failure>>) -> Command,
    ) -> ControllerResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply)).await?;
        let outcome = rx.await.map_err(|_| ControllerError::closed())?;
        outcome.map_err(ControllerError::from)
    }

    async fn send(&self, command: Command) -> ControllerResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ControllerError::closed())
    }
}
