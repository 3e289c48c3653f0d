//! Remedy plans: ordered fallback rule sets.
//!
//! A [`RemedyPlan`] is tried only after a primary resolution failed. Its
//! entries run strictly in registration order.
//!
//! # State Machine
//!
//! ```text
//! Idle ─run─▶ Attempting(0) ─fail─▶ Attempting(1) ─fail─▶ ... ─▶ Exhausted
//!                  │                    │
//!                  └────── match ───────┴──────────────────▶ Succeeded
//! ```
//!
//! 1. Each entry is resolved through the finder, so the cache applies
//! 2. A failed entry (not found or misconfigured) records its cause as the
//!    last error and reports an attempt failure
//! 3. The first entry that matches fires its callback and ends the run;
//!    later entries are never evaluated
//! 4. If every entry fails the plan reports exhaustion
//!
//! Entries are dropped once the plan reaches a terminal state, so a plan
//! never runs twice. A plan without entries reports itself as empty.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::diagnostics::DiagnosticEvent;
use crate::finder::Finder;
use crate::provider::MetadataProvider;
use crate::result::{ResolutionResult, ResolveError};
use crate::rules::{RuleSet, RuleSetBuilder};
use crate::types::TypeRef;

type FoundCallback<'cb> = Box<dyn FnOnce(&ResolutionResult) + 'cb>;

/// Where a plan is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemedyState {
    /// Entries registered, nothing run yet.
    Idle,
    /// Entry `i` is being resolved.
    Attempting(usize),
    /// Entry `attempt` matched.
    Succeeded { attempt: usize },
    /// Every entry failed, or there was none.
    Exhausted,
}

impl RemedyState {
    /// Whether the plan has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemedyState::Succeeded { .. } | RemedyState::Exhausted)
    }
}

struct RemedyEntry<'cb> {
    rules: RuleSet,
    on_found: Option<FoundCallback<'cb>>,
}

/// Handle to a registered entry.
pub struct EntryHandle<'p, 'cb> {
    entry: &'p mut RemedyEntry<'cb>,
}

impl<'cb> EntryHandle<'_, 'cb> {
    /// Called with the matched set if this entry is the one that succeeds.
    pub fn on_found(self, callback: impl FnOnce(&ResolutionResult) + 'cb) {
        self.entry.on_found = Some(Box::new(callback));
    }

    /// The entry's rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.entry.rules
    }
}

/// Outcome of running a plan.
#[derive(Debug, Clone)]
pub struct RemedyReport {
    /// Terminal state of the plan.
    pub state: RemedyState,
    /// Number of entries evaluated.
    pub attempted_count: usize,
    /// Cause of the most recent failed entry.
    pub last_error: Option<ResolveError>,
    /// The matched result, if an entry succeeded.
    pub result: Option<Arc<ResolutionResult>>,
}

impl RemedyReport {
    /// Whether an entry matched.
    pub fn succeeded(&self) -> bool {
        matches!(self.state, RemedyState::Succeeded { .. })
    }
}

/// Ordered list of fallback rule sets.
pub struct RemedyPlan<'cb> {
    entries: Vec<RemedyEntry<'cb>>,
    state: RemedyState,
    attempted_count: usize,
    last_error: Option<ResolveError>,
}

impl Default for RemedyPlan<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'cb> RemedyPlan<'cb> {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: RemedyState::Idle,
            attempted_count: 0,
            last_error: None,
        }
    }

    /// Register a fallback rule set.
    pub fn add(&mut self, rules: RuleSet) -> EntryHandle<'_, 'cb> {
        self.entries.push(RemedyEntry { rules, on_found: None });
        let index = self.entries.len() - 1;
        EntryHandle {
            entry: &mut self.entries[index],
        }
    }

    /// Build and register a fallback rule set.
    pub fn member(&mut self, initiate: impl FnOnce(&mut RuleSetBuilder)) -> EntryHandle<'_, 'cb> {
        self.add(RuleSet::new(initiate))
    }

    /// Number of entries not yet consumed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self) -> RemedyState {
        self.state
    }

    pub fn attempted_count(&self) -> usize {
        self.attempted_count
    }

    pub fn last_error(&self) -> Option<&ResolveError> {
        self.last_error.as_ref()
    }

    /// Try the entries against `ty` until one matches.
    ///
    /// Running a plan that already reached a terminal state is a no-op that
    /// reports the recorded outcome.
    pub fn run<P: MetadataProvider>(&mut self, finder: &Finder<P>, ty: &TypeRef) -> RemedyReport {
        if self.state.is_terminal() {
            return self.report(None);
        }

        let tag = finder.config().tag.clone();
        if self.entries.is_empty() {
            finder.emit(DiagnosticEvent::RemedyEmpty { tag });
            self.state = RemedyState::Exhausted;
            return self.report(None);
        }

        // Consuming the entries clears the plan whichever way it ends
        let entries = std::mem::take(&mut self.entries);
        for (attempt, entry) in entries.into_iter().enumerate() {
            self.state = RemedyState::Attempting(attempt);
            self.attempted_count = attempt + 1;
            debug!("remedy attempt {} with {}", attempt + 1, entry.rules);

            let result = finder.resolve_reported(ty, &entry.rules);
            if let Some(cause) = result.failure() {
                self.last_error = Some(cause.clone());
                finder.emit(DiagnosticEvent::RemedyAttemptFailed {
                    tag: tag.clone(),
                    attempt,
                    cause: cause.clone(),
                });
                continue;
            }

            if let Some(callback) = entry.on_found {
                callback(&result);
            }
            for member in result.all() {
                finder.emit(DiagnosticEvent::RemedySucceeded {
                    tag: tag.clone(),
                    attempt,
                    member: member.clone(),
                });
            }
            self.state = RemedyState::Succeeded { attempt };
            return self.report(Some(result));
        }

        self.state = RemedyState::Exhausted;
        finder.emit(DiagnosticEvent::RemedyExhausted {
            tag,
            total_attempts: self.attempted_count,
            last_cause: self.last_error.clone(),
        });
        self.report(None)
    }

    fn report(&self, result: Option<Arc<ResolutionResult>>) -> RemedyReport {
        RemedyReport {
            state: self.state,
            attempted_count: self.attempted_count,
            last_error: self.last_error.clone(),
            result,
        }
    }
}

impl fmt::Debug for RemedyPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemedyPlan")
            .field("entries", &self.entries.len())
            .field("state", &self.state)
            .field("attempted_count", &self.attempted_count)
            .field("last_error", &self.last_error)
            .finish()
    }
}
