mod command;
mod config;
mod controller;
mod feed;
mod handle;
pub mod naming;
mod session;
mod sink;
mod snapshot;
mod state;

pub(crate) use {
    command::Command,
    feed::{FeedPair, FeedSubscription, FeedTick, PollClock},
};

pub use {
    config::{ControllerConfig, DEFAULT_CAPTURE_TIMEOUT, DEFAULT_POLL_INTERVAL, DurationSource},
    controller::RecordingController,
    handle::ControllerHandle,
    session::{Recording, RecordingSession, StartRequest},
    sink::{BroadcastSink, EventSink},
    snapshot::{ControllerEvent, LifecycleSnapshot},
    state::RecorderState,
};
