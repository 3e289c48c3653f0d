//! Diagnostic events.
//!
//! The engine reports what it found and what failed as
//! [`DiagnosticEvent`]s handed to a [`DiagnosticSink`]. Emission is
//! fire-and-forget. The default sink, [`TracingSink`], renders events
//! through `tracing`; [`RecordingSink`] keeps them for inspection.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::result::ResolveError;
use crate::types::{CandidateMember, TypeRef};

/// Where a failed resolution was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    /// The type resolution started from.
    pub ty: TypeRef,
    /// Rendering of the rule set.
    pub rules: String,
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.rules, self.ty)
    }
}

/// Something worth reporting during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// A member was resolved.
    MemberFound {
        tag: String,
        member: CandidateMember,
        elapsed: Duration,
    },
    /// A resolution without a remedy plan failed.
    ResolutionFailed {
        tag: String,
        cause: ResolveError,
        context: FailureContext,
    },
    /// One remedy entry failed. `attempt` is zero-based.
    RemedyAttemptFailed {
        tag: String,
        attempt: usize,
        cause: ResolveError,
    },
    /// A remedy entry succeeded. `attempt` is zero-based.
    RemedySucceeded {
        tag: String,
        attempt: usize,
        member: CandidateMember,
    },
    /// Every remedy entry failed.
    RemedyExhausted {
        tag: String,
        total_attempts: usize,
        last_cause: Option<ResolveError>,
    },
    /// A remedy plan was attached without entries.
    RemedyEmpty { tag: String },
}

/// Receiver of diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Renders events as `tracing` events under the `reflex` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::MemberFound { tag, member, elapsed } => {
                debug!(
                    target: "reflex",
                    tag = %tag,
                    "Find member [{}] takes {}ms",
                    member,
                    elapsed.as_millis()
                );
            }
            DiagnosticEvent::ResolutionFailed { tag, cause, context } => {
                error!(
                    target: "reflex",
                    tag = %tag,
                    "Can't resolve member for {}: {}",
                    context,
                    cause
                );
            }
            DiagnosticEvent::RemedyAttemptFailed { tag, attempt, cause } => {
                warn!(
                    target: "reflex",
                    tag = %tag,
                    "Trying {} time(s) by remedy plan --> {}",
                    attempt + 1,
                    cause
                );
            }
            DiagnosticEvent::RemedySucceeded { tag, attempt, member } => {
                info!(
                    target: "reflex",
                    tag = %tag,
                    "Member [{}] found after {} remedy attempt(s)",
                    member,
                    attempt + 1
                );
            }
            DiagnosticEvent::RemedyExhausted {
                tag,
                total_attempts,
                last_cause,
            } => match last_cause {
                Some(cause) => error!(
                    target: "reflex",
                    tag = %tag,
                    "Trying {} time(s) and all failed by remedy plan, last error: {}",
                    total_attempts,
                    cause
                ),
                None => error!(
                    target: "reflex",
                    tag = %tag,
                    "Trying {} time(s) and all failed by remedy plan",
                    total_attempts
                ),
            },
            DiagnosticEvent::RemedyEmpty { tag } => {
                warn!(target: "reflex", tag = %tag, "Remedy plan is empty, forgot it?");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Keeps every event in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Remove and return the recorded events.
    pub fn take(&self) -> Vec<DiagnosticEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}
