//! Failure taxonomy shared by every component.
//!
//! Raw errors from collaborators are classified by their [`FailureOrigin`]
//! into a [`FailureRecord`] with a fixed kind, severity and retryability.

mod combined;
mod kind;
mod origin;
mod record;

pub use {
    combined::{CombinedFailure, Failure},
    kind::{FailureKind, Severity},
    origin::{CaptureOperation, FailureOrigin},
    record::FailureRecord,
};
