use crate::{
    AppCommand, AppError, AppResult, DesktopPermissionOracle, WavCaptureService, config::Config,
    console,
};

use std::{sync::Arc, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use voice_memo_core::{
    BroadcastSink, ControllerError, ControllerEvent, ControllerHandle, ControllerResult,
    RecorderState, RecordingController,
};

const EVENT_BUFFER: usize = 256;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Owns the controller handle and renders controller events on stdout.
/// Commands arrive as lines on stdin.
pub struct App {
    config: Config,
    handle: ControllerHandle,
    events: broadcast::Receiver<ControllerEvent>,
    controller_task: JoinHandle<()>,
    /// Last state name printed, so running ticks do not repeat it.
    last_state: &'static str,
}

impl App {
    /// Wire the controller to the microphone and the desktop oracle.
    ///
    /// Must be called inside a tokio runtime.
    pub(crate) fn new(config: Config) -> Self {
        let capture = Arc::new(WavCaptureService::new());
        let oracle = Arc::new(DesktopPermissionOracle::new(
            config.storage.recordings_root.clone(),
        ));
        let sink = BroadcastSink::new(EVENT_BUFFER);
        let events = sink.subscribe();

        let (handle, controller_task) = RecordingController::spawn(
            capture,
            oracle,
            Arc::new(sink),
            config.controller_config(),
        );

        Self {
            config,
            handle,
            events,
            controller_task,
            last_state: RecorderState::Idle.name(),
        }
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!(
            recordings_root = ?self.config.storage.recordings_root,
            format = %self.config.recorder.format,
            "Voice Memo starting"
        );
        println!("{}", console::HELP);

        // tokio's stdin reads on a blocking thread; forward lines over a channel.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
        let stdin_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let outcome = loop {
            tokio::select! {
                signal = &mut ctrl_c => {
                    if let Err(e) = signal {
                        error!(error = ?e, "Failed to listen for Ctrl-C");
                    }
                    info!("Interrupt received");
                    break self.save_active().await;
                }

                line = line_rx.recv() => {
                    let Some(line) = line else {
                        info!("Stdin closed, shutting down");
                        break self.save_active().await;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<AppCommand>() {
                        Ok(AppCommand::Quit) => {
                            info!("Quit requested");
                            break self.save_active().await;
                        }
                        Ok(command) => {
                            if let Err(e) = self.execute(command).await {
                                break Err(e);
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "Rejected input");
                            println!("Unknown command: {} (type `help`)", line.trim());
                        }
                    }
                }

                event = self.events.recv() => match event {
                    Ok(event) => self.render(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event display lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Controller event stream closed");
                        break Ok(());
                    }
                },
            }
        };

        self.handle.dispose();
        stdin_handle.abort();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.controller_task).await {
            Ok(Ok(())) => info!("Recording controller stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Recording controller task panicked"),
            Err(_) => warn!("Recording controller did not stop within timeout"),
        }

        info!("Voice Memo shut down");
        outcome
    }

    /// Run one command. Only a closed controller is an error here; command
    /// failures arrive as events and are rendered there.
    #[instrument(skip(self))]
    async fn execute(&mut self, command: AppCommand) -> AppResult<()> {
        match command {
            AppCommand::Start { name } => {
                let request = self.config.start_request(name);
                Self::settle(self.handle.start(request).await)
            }
            AppCommand::Pause => Self::settle(self.handle.pause().await),
            AppCommand::Resume => Self::settle(self.handle.resume().await),
            AppCommand::Stop { name } => Self::settle(self.handle.stop(name).await),
            AppCommand::Cancel => Self::settle(self.handle.cancel().await),
            AppCommand::Check => Self::settle(self.handle.check_permissions().await),
            AppCommand::Request => Self::settle(self.handle.request_permissions().await),
            AppCommand::Status => {
                let snapshot = self.handle.snapshot().await?;
                println!("{}", console::describe_snapshot(&snapshot));
                Ok(())
            }
            AppCommand::Help => {
                println!("{}", console::HELP);
                Ok(())
            }
            AppCommand::Quit => Ok(()),
        }
    }

    /// Command failures were already emitted as events.
    fn settle<T>(result: ControllerResult<T>) -> AppResult<()> {
        match result {
            Ok(_) => Ok(()),
            Err(ControllerError::Failed { failure }) => {
                debug!(%failure, "Command failed");
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
        }
    }

    /// Stop and save a recording that is still in progress.
    async fn save_active(&mut self) -> AppResult<()> {
        let snapshot = self.handle.snapshot().await?;
        if !matches!(
            snapshot.state(),
            RecorderState::Running { .. } | RecorderState::Paused { .. }
        ) {
            return Ok(());
        }

        info!("Saving active recording before exit");
        match self.handle.stop(None).await {
            Ok(completed) => println!("{}", console::describe_snapshot(&completed)),
            Err(ControllerError::Failed { failure }) => {
                println!("{}", console::describe_failure(&failure));
            }
            Err(e) => return Err(AppError::from(e)),
        }
        Ok(())
    }

    fn render(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Lifecycle(snapshot) => {
                let state = snapshot.state_name();
                if state != self.last_state {
                    self.last_state = state;
                    println!("{}", console::describe_snapshot(snapshot));
                }
            }
            ControllerEvent::Error(failure) => {
                println!("Error: {}", console::describe_failure(failure));
            }
            ControllerEvent::Permission(permission) => {
                println!("{}", console::describe_permission(permission));
            }
        }
    }
}
