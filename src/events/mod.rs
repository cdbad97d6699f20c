//! Event model: raw records, canonical events, normalization, severity.

mod canonical;
mod normalize;
mod raw;
mod severity;

pub use canonical::{Action, CanonicalEvent, EventKind, HealthResult, UNKNOWN};
pub use normalize::{normalize, Diagnostic, Normalized};
pub use raw::RawEvent;
pub use severity::{classify, Severity};
