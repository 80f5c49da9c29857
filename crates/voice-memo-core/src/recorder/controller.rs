//! Recording lifecycle controller.
//!
//! A single task owns the session. Commands from [`ControllerHandle`]s and
//! ticks from the live feeds are both drained by that task, so the session is
//! mutated from one place only. Every capture-service call is bounded by the
//! configured timeout and interrupted by dispose.

use crate::{
    CaptureResult,
    capture::CaptureService,
    failure::{CaptureOperation, Failure, FailureOrigin, FailureRecord},
    permission::{PermissionKind, PermissionOracle, PermissionState, PermissionStatus},
    recorder::{
        Command, ControllerConfig, ControllerEvent, ControllerHandle, DurationSource, EventSink,
        FeedPair, FeedSubscription, FeedTick, LifecycleSnapshot, PollClock, RecorderState,
        Recording, RecordingSession, StartRequest,
        command::Reply,
        config::{COMMAND_QUEUE_CAPACITY, TICK_QUEUE_CAPACITY},
        naming,
    },
};

use std::{future::Future, ops::ControlFlow, sync::Arc, time::Duration};

use chrono::Local;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, trace, warn};

/// Why a command did not produce a snapshot.
pub(crate) enum Halt {
    /// Classified failure, already emitted.
    Failed(Failure),
    /// Dispose was requested mid-command.
    Disposed,
}

pub(crate) type Step<T> = Result<T, Halt>;

/// Outcome of a capture call before emission.
enum CallError {
    Failed(FailureRecord),
    Disposed,
}

/// The single owner of the recording lifecycle.
pub struct RecordingController {
    capture: Arc<dyn CaptureService>,
    oracle: Arc<dyn PermissionOracle>,
    sink: Arc<dyn EventSink>,
    config: ControllerConfig,
    current: LifecycleSnapshot,
    generation: u64,
    feeds: Option<FeedPair>,
    tick_tx: mpsc::Sender<FeedTick>,
    tick_rx: mpsc::Receiver<FeedTick>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RecordingController {
    /// Spawn the controller task on the current tokio runtime.
    pub fn spawn(
        capture: Arc<dyn CaptureService>,
        oracle: Arc<dyn PermissionOracle>,
        sink: Arc<dyn EventSink>,
        config: ControllerConfig,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(capture, oracle, sink, config);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    pub(crate) fn new(
        capture: Arc<dyn CaptureService>,
        oracle: Arc<dyn PermissionOracle>,
        sink: Arc<dyn EventSink>,
        config: ControllerConfig,
    ) -> (Self, ControllerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::channel(TICK_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let controller = Self {
            capture,
            oracle,
            sink,
            config,
            current: LifecycleSnapshot::new(0, RecorderState::Idle),
            generation: 0,
            feeds: None,
            tick_tx,
            tick_rx,
            command_rx,
            shutdown_rx,
        };

        (controller, ControllerHandle::new(command_tx, shutdown_tx))
    }

    /// Process commands and ticks until disposed.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) {
        info!(duration_source = ?self.config.duration_source, "Recording controller started");

        while !*self.shutdown_rx.borrow() {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        debug!("All controller handles dropped");
                    }
                    break;
                }

                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await.is_break() {
                            break;
                        }
                    }
                    None => break,
                },

                Some(tick) = self.tick_rx.recv() => self.handle_tick(tick),
            }
        }

        self.dispose();
    }

    /// Release feeds and timers. Safe to call repeatedly and in any state.
    pub(crate) fn dispose(&mut self) {
        self.unsubscribe();
        self.command_rx.close();
        info!(state = self.state().name(), "Recording controller disposed");
    }

    fn state(&self) -> &RecorderState {
        self.current.state()
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> &LifecycleSnapshot {
        &self.current
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Breaks only when dispose interrupted the command.
    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        trace!(command = command.name(), state = self.state().name(), "Command received");

        match command {
            Command::Start { request, reply } => {
                let outcome = self.start(request).await;
                Self::reply(reply, outcome)
            }
            Command::Pause { reply } => {
                let outcome = self.pause().await;
                Self::reply(reply, outcome)
            }
            Command::Resume { reply } => {
                let outcome = self.resume().await;
                Self::reply(reply, outcome)
            }
            Command::Stop { final_name, reply } => {
                let outcome = self.stop(final_name).await;
                Self::reply(reply, outcome)
            }
            Command::Cancel { reply } => {
                let outcome = self.cancel().await;
                Self::reply(reply, outcome)
            }
            Command::CheckPermissions { reply } => {
                let outcome = self.check_permissions().await;
                Self::reply(reply, outcome)
            }
            Command::RequestPermissions { reply } => {
                let outcome = self.request_permissions().await;
                Self::reply(reply, outcome)
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.current.clone());
                ControlFlow::Continue(())
            }
        }
    }

    fn reply<T>(reply: Reply<T>, outcome: Step<T>) -> ControlFlow<()> {
        let outcome = match outcome {
            Ok(value) => Ok(value),
            Err(Halt::Failed(failure)) => Err(failure),
            Err(Halt::Disposed) => return ControlFlow::Break(()),
        };
        // The caller may have stopped waiting; the outcome was already emitted.
        let _ = reply.send(outcome);
        ControlFlow::Continue(())
    }

    #[instrument(skip(self, request), fields(folder_id = %request.folder_id, format = %request.format))]
    pub(crate) async fn start(&mut self, request: StartRequest) -> Step<LifecycleSnapshot> {
        if !self.state().accepts_start() {
            return Err(self.reject("start"));
        }
        if let Err(record) = naming::validate_folder_id(&request.folder_id) {
            return Err(self.fail(record));
        }

        // Permission is re-queried on every start; it can be revoked externally.
        self.transition(RecorderState::PermissionChecking);
        let status = {
            let oracle = Arc::clone(&self.oracle);
            self.interruptible(async move { oracle.status(PermissionKind::Microphone).await })
                .await?
        };
        if !status.is_granted() {
            let halt = self.fail(FailureRecord::permission_denied(PermissionKind::Microphone, status));
            self.transition(RecorderState::Idle);
            return Err(halt);
        }

        let (capture_allowed, has_hardware) = {
            let capture = Arc::clone(&self.capture);
            self.interruptible(async move {
                (capture.has_microphone_permission().await, capture.has_microphone().await)
            })
            .await?
        };
        if !capture_allowed {
            let halt = self.fail(FailureRecord::permission_denied(
                PermissionKind::Microphone,
                PermissionStatus::Denied,
            ));
            self.transition(RecorderState::Idle);
            return Err(halt);
        }
        if !has_hardware {
            let halt = self.fail(FailureRecord::no_microphone());
            self.transition(RecorderState::Idle);
            return Err(halt);
        }

        let started_at = Local::now();
        let file_path = naming::recording_path(
            &self.config.recordings_root,
            &request.folder_id,
            request.format,
            started_at,
        );
        let session = RecordingSession::begin(request, file_path, started_at);
        self.transition(RecorderState::Starting {
            folder_id: session.folder_id().to_string(),
            file_path: session.file_path().to_path_buf(),
        });

        let params = session.capture_params();
        let outcome = self
            .call_capture(CaptureOperation::Start, move |capture| async move {
                capture.start_recording(&params).await
            })
            .await;
        if let Err(halt) = self.confirm(CaptureOperation::Start, outcome) {
            self.transition(RecorderState::Idle);
            return Err(halt);
        }

        self.subscribe(Duration::ZERO);
        info!(
            session_id = %session.id(),
            file_path = ?session.file_path(),
            sample_rate = session.sample_rate(),
            bit_rate = session.bit_rate(),
            "Recording started"
        );
        Ok(self.transition(RecorderState::Running { session }))
    }

    #[instrument(skip(self))]
    pub(crate) async fn pause(&mut self) -> Step<LifecycleSnapshot> {
        let RecorderState::Running { session } = self.state() else {
            return Err(self.reject("pause"));
        };
        let mut session = session.clone();

        let polled = self.unsubscribe();
        let outcome = self
            .call_capture(CaptureOperation::Pause, |capture| async move {
                capture.pause_recording().await
            })
            .await;
        if let Err(halt) = self.confirm(CaptureOperation::Pause, outcome) {
            if matches!(halt, Halt::Failed(_)) {
                // Still running; restore the feeds that were released.
                if let Some(elapsed) = polled {
                    session.advance_duration(elapsed);
                }
                self.subscribe(session.duration());
            }
            return Err(halt);
        }

        if let Some(elapsed) = polled {
            session.advance_duration(elapsed);
        }
        session.reset_amplitude();

        info!(
            session_id = %session.id(),
            duration_ms = session.duration().as_millis(),
            "Recording paused"
        );
        Ok(self.transition(RecorderState::Paused {
            session,
            paused_at: Local::now(),
        }))
    }

    #[instrument(skip(self))]
    pub(crate) async fn resume(&mut self) -> Step<LifecycleSnapshot> {
        let RecorderState::Paused { session, .. } = self.state() else {
            return Err(self.reject("resume"));
        };
        let session = session.clone();

        let outcome = self
            .call_capture(CaptureOperation::Resume, |capture| async move {
                capture.resume_recording().await
            })
            .await;
        self.confirm(CaptureOperation::Resume, outcome)?;

        self.subscribe(session.duration());
        info!(
            session_id = %session.id(),
            duration_ms = session.duration().as_millis(),
            "Recording resumed"
        );
        Ok(self.transition(RecorderState::Running { session }))
    }

    #[instrument(skip(self))]
    pub(crate) async fn stop(&mut self, final_name: Option<String>) -> Step<LifecycleSnapshot> {
        let mut session = match self.state() {
            RecorderState::Running { session } | RecorderState::Paused { session, .. } => {
                session.clone()
            }
            _ => return Err(self.reject("stop")),
        };

        if let Some(elapsed) = self.unsubscribe() {
            session.advance_duration(elapsed);
        }
        session.reset_amplitude();
        self.transition(RecorderState::Stopping {
            session: session.clone(),
        });

        let outcome = self
            .call_capture(CaptureOperation::Stop, |capture| async move {
                capture.stop_recording().await
            })
            .await
            .and_then(|artifact| artifact.ok_or_else(|| CallError::Failed(FailureRecord::missing_artifact())));

        let artifact = match outcome {
            Ok(artifact) => artifact,
            Err(error) => return Err(self.fail_terminal(error)),
        };

        let name = naming::resolve_name(final_name.as_deref(), session.name(), session.start_time());
        let recording = Recording::finalize(session, artifact, name);
        info!(
            session_id = %recording.id,
            name = %recording.name,
            file_path = ?recording.file_path,
            duration_ms = recording.duration.as_millis(),
            "Recording completed"
        );
        Ok(self.transition(RecorderState::Completed { recording }))
    }

    #[instrument(skip(self))]
    pub(crate) async fn cancel(&mut self) -> Step<LifecycleSnapshot> {
        let session_id = match self.state() {
            RecorderState::Running { session } | RecorderState::Paused { session, .. } => {
                session.id()
            }
            _ => return Err(self.reject("cancel")),
        };

        self.unsubscribe();
        let outcome = self
            .call_capture(CaptureOperation::Cancel, |capture| async move {
                capture.cancel_recording().await
            })
            .await
            .and_then(|deleted| {
                if deleted {
                    Ok(())
                } else {
                    Err(CallError::Failed(FailureRecord::capture_refused(CaptureOperation::Cancel)))
                }
            });

        if let Err(error) = outcome {
            return Err(self.fail_terminal(error));
        }

        info!(session_id = %session_id, "Recording cancelled");
        Ok(self.transition(RecorderState::Cancelled))
    }

    #[instrument(skip(self))]
    pub(crate) async fn check_permissions(&mut self) -> Step<PermissionState> {
        // Terminal states behave as idle and are left for Idle afterwards.
        let idle = self.state().accepts_start();
        if idle {
            self.transition(RecorderState::PermissionChecking);
        }

        let microphone = {
            let oracle = Arc::clone(&self.oracle);
            self.interruptible(async move { oracle.status(PermissionKind::Microphone).await })
                .await?
        };
        let permission = self.permission_state(microphone).await?;

        if idle {
            self.transition(RecorderState::Idle);
        }
        Ok(permission)
    }

    #[instrument(skip(self))]
    pub(crate) async fn request_permissions(&mut self) -> Step<PermissionState> {
        let idle = self.state().accepts_start();
        if idle {
            self.transition(RecorderState::PermissionRequesting);
        }

        let microphone = self.request_once(PermissionKind::Microphone).await?;
        let storage = self.request_once(PermissionKind::Storage).await?;
        let permission = self.permission_state(microphone).await?;

        if idle {
            self.transition(RecorderState::Idle);
        }

        let denied: Vec<FailureRecord> = [
            (PermissionKind::Microphone, microphone),
            (PermissionKind::Storage, storage),
        ]
        .into_iter()
        .filter(|(_, status)| !status.is_granted())
        .map(|(kind, status)| FailureRecord::permission_denied(kind, status))
        .collect();

        match Failure::from_records(denied) {
            Some(failure) => Err(self.fail(failure)),
            None => Ok(permission),
        }
    }

    /// Prompt for `kind` only when the platform would actually prompt.
    async fn request_once(&mut self, kind: PermissionKind) -> Step<PermissionStatus> {
        let oracle = Arc::clone(&self.oracle);
        let current = self
            .interruptible(async move { oracle.status(kind).await })
            .await?;

        if current.is_granted() || !current.can_request() {
            if !current.is_granted() {
                debug!(permission = %kind, status = %current, "Not prompting; platform will not ask again");
            }
            return Ok(current);
        }

        let oracle = Arc::clone(&self.oracle);
        let requested = self
            .interruptible(async move { oracle.request(kind).await })
            .await?;
        info!(permission = %kind, status = %requested, "Permission requested");
        Ok(requested)
    }

    async fn permission_state(&mut self, microphone: PermissionStatus) -> Step<PermissionState> {
        let capture = Arc::clone(&self.capture);
        let has_microphone_hardware = self
            .interruptible(async move { capture.has_microphone().await })
            .await?;

        let permission = PermissionState {
            has_microphone_permission: microphone.is_granted(),
            has_microphone_hardware,
            microphone,
        };
        debug!(?permission, "Permission state");
        self.sink.emit(ControllerEvent::Permission(permission));
        Ok(permission)
    }

    pub(crate) fn handle_tick(&mut self, tick: FeedTick) {
        if tick.generation() != self.generation || self.feeds.is_none() {
            trace!(?tick, generation = self.generation, "Dropping stale feed tick");
            return;
        }
        let RecorderState::Running { session } = self.state() else {
            trace!(?tick, state = self.state().name(), "Dropping feed tick outside running state");
            return;
        };
        let mut session = session.clone();

        let accepted = match tick {
            FeedTick::Amplitude { level, .. } => session.set_amplitude(level),
            FeedTick::Duration { elapsed, .. } => {
                self.config.duration_source == DurationSource::Feed
                    && session.advance_duration(elapsed)
            }
            FeedTick::Poll { .. } => self
                .feeds
                .as_ref()
                .and_then(FeedPair::clock)
                .is_some_and(|clock| session.advance_duration(clock.elapsed())),
        };

        if accepted {
            self.transition(RecorderState::Running { session });
        } else {
            trace!(?tick, "Feed tick rejected");
        }
    }

    /// Start one amplitude and one duration producer under a new generation.
    fn subscribe(&mut self, base: Duration) {
        self.unsubscribe();
        self.generation += 1;

        let amplitude = FeedSubscription::forward(
            "amplitude",
            self.capture.amplitude_feed(),
            self.tick_tx.clone(),
            self.generation,
            |generation, level| FeedTick::Amplitude { generation, level },
        );

        let (duration, clock) = match self.config.duration_source {
            DurationSource::Feed => (
                FeedSubscription::forward(
                    "duration",
                    self.capture.duration_feed(),
                    self.tick_tx.clone(),
                    self.generation,
                    |generation, elapsed| FeedTick::Duration { generation, elapsed },
                ),
                None,
            ),
            DurationSource::Poll => (
                FeedSubscription::poll(self.config.poll_interval, self.tick_tx.clone(), self.generation),
                Some(PollClock::start(base)),
            ),
        };

        self.feeds = Some(FeedPair::new(amplitude, duration, clock));
        debug!(generation = self.generation, "Feeds subscribed");
    }

    /// Release the feed pair, if any. Queued ticks become stale.
    fn unsubscribe(&mut self) -> Option<Duration> {
        let feeds = self.feeds.take()?;
        self.generation += 1;
        feeds.release()
    }

    /// Run `call` against the capture service, bounded and interruptible.
    async fn call_capture<T, F, Fut>(&mut self, op: CaptureOperation, call: F) -> Result<T, CallError>
    where
        F: FnOnce(Arc<dyn CaptureService>) -> Fut,
        Fut: Future<Output = CaptureResult<T>>,
    {
        let limit = self.config.capture_timeout;
        let call = call(Arc::clone(&self.capture));
        let bounded = async move {
            let result = match limit {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => return Err(FailureRecord::capture_timeout(op, limit)),
                },
                None => call.await,
            };
            result.map_err(|error| FailureOrigin::CaptureService(op).classify(&error))
        };

        match self.interruptible(bounded).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(record)) => Err(CallError::Failed(record)),
            Err(_) => Err(CallError::Disposed),
        }
    }

    /// Turn a boolean capture result into a step, emitting on failure.
    fn confirm(&mut self, op: CaptureOperation, outcome: Result<bool, CallError>) -> Step<()> {
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(self.fail(FailureRecord::capture_refused(op))),
            Err(CallError::Failed(record)) => Err(self.fail(record)),
            Err(CallError::Disposed) => Err(Halt::Disposed),
        }
    }

    /// Emit a stop/cancel failure and move to the `Error` state.
    fn fail_terminal(&mut self, error: CallError) -> Halt {
        match error {
            CallError::Disposed => Halt::Disposed,
            CallError::Failed(record) => {
                let failure = Failure::from(record);
                let halt = self.fail(failure.clone());
                warn!(%failure, "Recording artifact may not be saved");
                self.transition(RecorderState::Error { failure });
                halt
            }
        }
    }

    async fn interruptible<T>(&mut self, work: impl Future<Output = T>) -> Step<T> {
        let shutdown = &mut self.shutdown_rx;
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                warn!("Dispose interrupted an in-flight call");
                Err(Halt::Disposed)
            }
            value = work => Ok(value),
        }
    }

    fn reject(&mut self, command: &str) -> Halt {
        let record = FailureRecord::invalid_state(command, self.state().name());
        self.fail(record)
    }

    fn fail(&mut self, failure: impl Into<Failure>) -> Halt {
        let failure = failure.into();
        failure.log();
        self.sink.emit(ControllerEvent::Error(failure.clone()));
        Halt::Failed(failure)
    }

    fn transition(&mut self, state: RecorderState) -> LifecycleSnapshot {
        let previous = self.current.state_name();
        let snapshot = LifecycleSnapshot::new(self.current.sequence() + 1, state);

        if previous != snapshot.state_name() {
            debug!(from = previous, to = snapshot.state_name(), "State transition");
        }

        self.current = snapshot.clone();
        self.sink.emit(ControllerEvent::Lifecycle(snapshot.clone()));
        snapshot
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
