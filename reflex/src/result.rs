//! Resolution outcomes and errors.

use indexmap::IndexSet;
use thiserror::Error;

use crate::types::{CandidateMember, TypeRef};

/// A rule set that cannot be resolved as written.
///
/// Raised before any enumeration happens and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no identifying criterion and no positional selector were set")]
    NoCriteria,

    #[error("parameter types are empty, use `empty_param()` for parameterless members")]
    EmptyParamTypes,

    #[error("parameter count range {start}..={end} is empty and no exact count is set")]
    EmptyParamCountRange { start: usize, end: usize },

    #[error("name conditions block declares no condition")]
    EmptyNameConditions,

    #[error("modifiers block declares no condition")]
    EmptyModifierRules,

    #[error("invalid name pattern `{pattern}`: {message}")]
    InvalidNamePattern { pattern: String, message: String },
}

/// Enumeration completed but nothing satisfied the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("can't find member {rules} in `{ty}` (searched {} type(s))", .searched.len())]
pub struct NotFound {
    /// The type resolution started from.
    pub ty: TypeRef,
    /// Every type that was enumerated, in search order.
    pub searched: Vec<TypeRef>,
    /// Rendering of the rule set that failed.
    pub rules: String,
}

/// Why a resolution produced no member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    NotFound(#[from] NotFound),
}

impl ResolveError {
    /// Whether this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ResolveError::Configuration(_))
    }

    /// Whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// Outcome of one resolution.
///
/// Members keep enumeration order; the first one is the primary result.
/// Cached copies are shared immutable snapshots. Equality compares the
/// members in order.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    members: IndexSet<CandidateMember>,
    matched_in: Option<TypeRef>,
    failure: Option<ResolveError>,
}

impl ResolutionResult {
    /// A successful result. `members` must not be empty.
    pub(crate) fn matched(members: IndexSet<CandidateMember>, matched_in: TypeRef) -> Self {
        debug_assert!(!members.is_empty());
        Self {
            members,
            matched_in: Some(matched_in),
            failure: None,
        }
    }

    /// A failed result.
    pub(crate) fn failed(error: impl Into<ResolveError>) -> Self {
        Self {
            members: IndexSet::new(),
            matched_in: None,
            failure: Some(error.into()),
        }
    }

    /// Whether at least one member was found.
    pub fn found(&self) -> bool {
        !self.members.is_empty()
    }

    /// The primary result: first member of the final sequence.
    pub fn primary(&self) -> Option<&CandidateMember> {
        self.members.first()
    }

    /// Every matched member, in enumeration order.
    pub fn all(&self) -> &IndexSet<CandidateMember> {
        &self.members
    }

    /// The type whose members produced the match.
    pub fn matched_in(&self) -> Option<&TypeRef> {
        self.matched_in.as_ref()
    }

    /// The failure cause, if nothing was found.
    pub fn failure(&self) -> Option<&ResolveError> {
        self.failure.as_ref()
    }

    /// Number of matched members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing was matched.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Convert into a plain `Result`.
    pub fn to_result(&self) -> Result<&IndexSet<CandidateMember>, &ResolveError> {
        match &self.failure {
            Some(error) => Err(error),
            None => Ok(&self.members),
        }
    }
}

impl PartialEq for ResolutionResult {
    fn eq(&self, other: &Self) -> bool {
        self.members.iter().eq(other.members.iter())
            && self.matched_in == other.matched_in
            && self.failure == other.failure
    }
}

impl Eq for ResolutionResult {}
