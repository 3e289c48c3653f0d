//! Rule sets: the match criteria for one resolution attempt.
//!
//! A [`RuleSet`] is built through a [`RuleSetBuilder`] and frozen by
//! [`RuleSetBuilder::build`]. Once frozen it is immutable and cheap to
//! clone; clones share the same [`RuleSetId`], which is what the
//! resolution cache keys on.
//!
//! # Example
//!
//! ```
//! use reflex::RuleSet;
//!
//! let rules = RuleSet::new(|r| {
//!     r.name("onCreate");
//!     r.param_count(1).index(0);
//! });
//! assert!(rules.validate().is_ok());
//! ```
//!
//! Every criterion setter returns an [`IndexCondition`], which can pin a
//! positional selector to the filtered matches. [`RuleSetBuilder::order`]
//! returns one that selects by raw enumeration order instead. Only one
//! selector is ever active: the last one set wins.

pub mod modifiers;
pub mod name;

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::result::ConfigurationError;
use crate::types::TypeDescriptor;

pub use modifiers::ModifierRules;
pub use name::NameConditions;

/// Identity of a frozen rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleSetId(u64);

impl RuleSetId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

static NEXT_RULE_SET_ID: AtomicU64 = AtomicU64::new(1);

fn next_rule_set_id() -> RuleSetId {
    RuleSetId(NEXT_RULE_SET_ID.fetch_add(1, Ordering::Relaxed))
}

/// A position in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordinal {
    /// Zero-based index.
    At(usize),
    /// The last element.
    Last,
}

impl Ordinal {
    /// Resolve this ordinal against a sequence of `len` elements.
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            Ordinal::At(index) if index < len => Some(index),
            Ordinal::At(_) => None,
            Ordinal::Last => len.checked_sub(1),
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordinal::At(index) => write!(f, "{}", index),
            Ordinal::Last => write!(f, "last"),
        }
    }
}

/// Positional selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexSelector {
    /// Keep every filtered match.
    #[default]
    MatchAll,
    /// Keep only the filtered match at this position.
    MatchAt(Ordinal),
    /// Take the member at this position of the unfiltered enumeration,
    /// ignoring every other criterion.
    OrderAt(Ordinal),
}

/// Which kind of selector an [`IndexCondition`] will install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Criteria-based: `MatchAll` / `MatchAt`.
    Match,
    /// Pure positional: `OrderAt`.
    Order,
}

/// Marker returned by every builder operation.
///
/// Dropping it leaves the selector untouched; calling one of its methods
/// replaces the active selector.
pub struct IndexCondition<'a> {
    builder: &'a mut RuleSetBuilder,
    kind: IndexKind,
}

impl IndexCondition<'_> {
    /// The kind of selector this condition installs.
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Select the element at zero-based `index`.
    pub fn index(self, index: usize) {
        self.select(Ordinal::At(index));
    }

    /// Select the first element.
    pub fn first(self) {
        self.select(Ordinal::At(0));
    }

    /// Select the last element.
    pub fn last(self) {
        self.select(Ordinal::Last);
    }

    fn select(self, ordinal: Ordinal) {
        self.builder.rules.index = Some(match self.kind {
            IndexKind::Match => IndexSelector::MatchAt(ordinal),
            IndexKind::Order => IndexSelector::OrderAt(ordinal),
        });
    }
}

/// Frozen match criteria.
#[derive(Clone, Default)]
struct Rules {
    name: Option<String>,
    name_conditions: Option<NameConditions>,
    param_count: Option<i32>,
    param_count_range: Option<RangeInclusive<usize>>,
    param_types: Option<Vec<TypeDescriptor>>,
    return_type: Option<TypeDescriptor>,
    modifiers: Option<ModifierRules>,
    search_ancestors: bool,
    ancestors_only: bool,
    index: Option<IndexSelector>,
}

/// Mutable rule set under construction.
#[derive(Default)]
pub struct RuleSetBuilder {
    rules: Rules,
}

impl RuleSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&mut self) -> IndexCondition<'_> {
        IndexCondition { builder: self, kind: IndexKind::Match }
    }

    /// Exact member name. A blank name counts as unset.
    pub fn name(&mut self, value: impl Into<String>) -> IndexCondition<'_> {
        self.rules.name = Some(value.into());
        self.matching()
    }

    /// Name pattern block. Takes precedence over [`name`](Self::name).
    pub fn name_conditions(
        &mut self,
        initiate: impl FnOnce(&mut NameConditions),
    ) -> IndexCondition<'_> {
        let mut conditions = NameConditions::new();
        initiate(&mut conditions);
        self.rules.name_conditions = Some(conditions);
        self.matching()
    }

    /// Exact parameter count. A negative count counts as unset.
    pub fn param_count(&mut self, count: i32) -> IndexCondition<'_> {
        self.rules.param_count = Some(count);
        self.matching()
    }

    /// Inclusive parameter count range, consulted only when no
    /// non-negative exact count is set.
    pub fn param_count_range(&mut self, range: RangeInclusive<usize>) -> IndexCondition<'_> {
        self.rules.param_count_range = Some(range);
        self.matching()
    }

    /// Shorthand for `param_count(0)`.
    pub fn empty_param(&mut self) -> IndexCondition<'_> {
        self.param_count(0)
    }

    /// Element-wise parameter types.
    ///
    /// An empty list is a configuration error; use
    /// [`empty_param`](Self::empty_param) for parameterless members.
    pub fn param<I, D>(&mut self, types: I) -> IndexCondition<'_>
    where
        I: IntoIterator<Item = D>,
        D: Into<TypeDescriptor>,
    {
        self.rules.param_types = Some(types.into_iter().map(Into::into).collect());
        self.matching()
    }

    /// Return type.
    pub fn return_type(&mut self, ty: impl Into<TypeDescriptor>) -> IndexCondition<'_> {
        self.rules.return_type = Some(ty.into());
        self.matching()
    }

    /// Modifier predicate block.
    pub fn modifiers(&mut self, initiate: impl FnOnce(&mut ModifierRules)) -> IndexCondition<'_> {
        let mut rules = ModifierRules::new();
        initiate(&mut rules);
        self.rules.modifiers = Some(rules);
        self.matching()
    }

    /// Select by position in the unfiltered enumeration.
    pub fn order(&mut self) -> IndexCondition<'_> {
        IndexCondition { builder: self, kind: IndexKind::Order }
    }

    /// Keep every filtered match, replacing any positional selector.
    pub fn match_all(&mut self) -> &mut Self {
        self.rules.index = Some(IndexSelector::MatchAll);
        self
    }

    /// Fall back to ancestor types when the target type has no match.
    pub fn search_ancestors(&mut self) -> &mut Self {
        self.rules.search_ancestors = true;
        self
    }

    /// Search ancestor types only, starting at the nearest one.
    pub fn ancestors_only(&mut self) -> &mut Self {
        self.rules.search_ancestors = true;
        self.rules.ancestors_only = true;
        self
    }

    /// Freeze into an immutable rule set with a fresh identity.
    pub fn build(self) -> RuleSet {
        RuleSet {
            id: next_rule_set_id(),
            rules: Arc::new(self.rules),
        }
    }
}

/// Immutable match criteria for one resolution attempt.
#[derive(Clone)]
pub struct RuleSet {
    id: RuleSetId,
    rules: Arc<Rules>,
}

impl RuleSet {
    /// Build and freeze a rule set in one step.
    pub fn new(initiate: impl FnOnce(&mut RuleSetBuilder)) -> Self {
        let mut builder = RuleSetBuilder::new();
        initiate(&mut builder);
        builder.build()
    }

    /// Start a builder.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Identity shared by all clones of this rule set.
    pub fn id(&self) -> RuleSetId {
        self.id
    }

    /// The exact name, if set and not blank.
    pub fn name(&self) -> Option<&str> {
        self.rules.name.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn name_conditions(&self) -> Option<&NameConditions> {
        self.rules.name_conditions.as_ref()
    }

    /// The exact parameter count, if set and non-negative.
    pub fn param_count(&self) -> Option<usize> {
        self.rules.param_count.and_then(|count| usize::try_from(count).ok())
    }

    /// The parameter count range, if it applies (no exact count set).
    pub fn param_count_range(&self) -> Option<&RangeInclusive<usize>> {
        match self.param_count() {
            Some(_) => None,
            None => self.rules.param_count_range.as_ref(),
        }
    }

    pub fn param_types(&self) -> Option<&[TypeDescriptor]> {
        self.rules.param_types.as_deref()
    }

    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.rules.return_type.as_ref()
    }

    pub fn modifiers(&self) -> Option<&ModifierRules> {
        self.rules.modifiers.as_ref()
    }

    pub fn searches_ancestors(&self) -> bool {
        self.rules.search_ancestors
    }

    pub fn ancestors_only(&self) -> bool {
        self.rules.ancestors_only
    }

    /// The active selector; `MatchAll` when none was set.
    pub fn index_selector(&self) -> IndexSelector {
        self.rules.index.unwrap_or_default()
    }

    /// A handle that reports whether any clone of this rule set is alive.
    pub(crate) fn liveness(&self) -> RuleSetLiveness {
        RuleSetLiveness(Arc::downgrade(&self.rules))
    }

    /// Whether at least one identifying criterion is set.
    pub fn has_criterion(&self) -> bool {
        self.name().is_some()
            || self.rules.name_conditions.is_some()
            || self.param_count().is_some()
            || self.rules.param_count_range.is_some()
            || self.rules.param_types.is_some()
            || self.rules.return_type.is_some()
            || self.rules.modifiers.is_some()
    }

    /// Check the rule set invariants.
    ///
    /// A pure `OrderAt` selection needs no criterion and skips every
    /// other check, since no other field is consulted.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let IndexSelector::OrderAt(_) = self.index_selector() {
            return Ok(());
        }

        if let Some(types) = &self.rules.param_types {
            if types.is_empty() {
                return Err(ConfigurationError::EmptyParamTypes);
            }
        }

        if let Some(conditions) = &self.rules.name_conditions {
            if conditions.is_empty() {
                return Err(ConfigurationError::EmptyNameConditions);
            }
            if let Some((pattern, message)) = conditions.invalid_regex() {
                return Err(ConfigurationError::InvalidNamePattern {
                    pattern: pattern.to_string(),
                    message: message.to_string(),
                });
            }
        }

        if self.rules.modifiers.as_ref().is_some_and(ModifierRules::is_empty) {
            return Err(ConfigurationError::EmptyModifierRules);
        }

        if let Some(range) = self.param_count_range() {
            if range.is_empty() {
                return Err(ConfigurationError::EmptyParamCountRange {
                    start: *range.start(),
                    end: *range.end(),
                });
            }
        }

        if !self.has_criterion() {
            return Err(ConfigurationError::NoCriteria);
        }

        Ok(())
    }
}

/// Weak reference to a frozen rule set, held by cache entries.
#[derive(Clone)]
pub(crate) struct RuleSetLiveness(Weak<Rules>);

impl RuleSetLiveness {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for RuleSetLiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSetLiveness({})", self.is_alive())
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("id", &self.id)
            .field("rules", &format_args!("{}", self))
            .finish()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(name) = self.name() {
            parts.push(format!("name:{}", name));
        }
        if let Some(conditions) = &self.rules.name_conditions {
            parts.push(format!("nameConditions:{}", conditions));
        }
        if let Some(count) = self.param_count() {
            parts.push(format!("paramCount:{}", count));
        } else if let Some(range) = &self.rules.param_count_range {
            parts.push(format!("paramCount:{}..={}", range.start(), range.end()));
        }
        if let Some(types) = &self.rules.param_types {
            let rendered: Vec<_> = types.iter().map(ToString::to_string).collect();
            parts.push(format!("param:({})", rendered.join(", ")));
        }
        if let Some(ret) = &self.rules.return_type {
            parts.push(format!("returnType:{}", ret));
        }
        if let Some(modifiers) = &self.rules.modifiers {
            parts.push(format!("modifiers:[{}]", modifiers));
        }
        match self.rules.index {
            Some(IndexSelector::MatchAt(ordinal)) => parts.push(format!("index:{}", ordinal)),
            Some(IndexSelector::OrderAt(ordinal)) => parts.push(format!("order:{}", ordinal)),
            Some(IndexSelector::MatchAll) | None => {}
        }
        if self.rules.ancestors_only {
            parts.push("ancestorsOnly".to_string());
        } else if self.rules.search_ancestors {
            parts.push("searchAncestors".to_string());
        }
        write!(f, "[{}]", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clones_share_identity() {
        let rules = RuleSet::new(|r| {
            r.name("foo");
        });
        let copy = rules.clone();
        assert_eq!(rules.id(), copy.id());

        let other = RuleSet::new(|r| {
            r.name("foo");
        });
        assert_ne!(rules.id(), other.id());
    }

    #[test]
    fn test_liveness_follows_last_clone() {
        let rules = RuleSet::new(|r| {
            r.name("foo");
        });
        let liveness = rules.liveness();
        let copy = rules.clone();

        drop(rules);
        assert!(liveness.is_alive());
        drop(copy);
        assert!(!liveness.is_alive());
    }

    #[test]
    fn test_empty_modifier_block_is_configuration_error() {
        let rules = RuleSet::new(|r| {
            r.modifiers(|_| {});
        });
        assert_eq!(rules.validate(), Err(ConfigurationError::EmptyModifierRules));

        let rules = RuleSet::new(|r| {
            r.modifiers(|m| {
                m.not_static();
            });
        });
        assert_eq!(rules.validate(), Ok(()));
    }

    #[test]
    fn test_index_condition_kinds() {
        let mut builder = RuleSet::builder();
        assert_eq!(builder.name("foo").kind(), IndexKind::Match);
        assert_eq!(builder.order().kind(), IndexKind::Order);
    }

    #[test]
    fn test_selector_last_write_wins() {
        let rules = RuleSet::new(|r| {
            r.name("foo").index(2);
            r.order().index(1);
        });
        assert_eq!(rules.index_selector(), IndexSelector::OrderAt(Ordinal::At(1)));

        let rules = RuleSet::new(|r| {
            r.order().first();
            r.param_count(1).last();
        });
        assert_eq!(rules.index_selector(), IndexSelector::MatchAt(Ordinal::Last));

        let rules = RuleSet::new(|r| {
            r.name("foo").index(3);
            r.match_all();
        });
        assert_eq!(rules.index_selector(), IndexSelector::MatchAll);
    }

    #[test]
    fn test_no_criteria_is_configuration_error() {
        let rules = RuleSet::new(|_| {});
        assert_eq!(rules.validate(), Err(ConfigurationError::NoCriteria));

        let rules = RuleSet::new(|r| {
            r.search_ancestors();
        });
        assert_eq!(rules.validate(), Err(ConfigurationError::NoCriteria));
    }

    #[test]
    fn test_order_alone_is_valid() {
        let rules = RuleSet::new(|r| {
            r.order().index(0);
        });
        assert_eq!(rules.validate(), Ok(()));
    }

    #[test]
    fn test_match_at_alone_is_not_valid() {
        let rules = RuleSet::new(|r| {
            r.name("").index(0);
        });
        assert_eq!(rules.validate(), Err(ConfigurationError::NoCriteria));
    }

    #[test]
    fn test_negative_count_is_unset() {
        let rules = RuleSet::new(|r| {
            r.param_count(-1);
        });
        assert_eq!(rules.param_count(), None);
        assert_eq!(rules.validate(), Err(ConfigurationError::NoCriteria));

        let rules = RuleSet::new(|r| {
            r.param_count(-1);
            r.param_count_range(1..=2);
        });
        assert_eq!(rules.param_count_range(), Some(&(1..=2)));
        assert_eq!(rules.validate(), Ok(()));
    }

    #[test]
    fn test_count_takes_precedence_over_range() {
        let rules = RuleSet::new(|r| {
            r.param_count_range(3..=5);
            r.param_count(0);
        });
        assert_eq!(rules.param_count(), Some(0));
        assert_eq!(rules.param_count_range(), None);
    }

    #[test]
    fn test_empty_range_with_negative_count() {
        #[allow(clippy::reversed_empty_ranges)]
        let rules = RuleSet::new(|r| {
            r.param_count(-4);
            r.param_count_range(3..=1);
        });
        assert_eq!(
            rules.validate(),
            Err(ConfigurationError::EmptyParamCountRange { start: 3, end: 1 })
        );
    }

    #[test]
    fn test_empty_param_types() {
        let rules = RuleSet::new(|r| {
            r.name("foo");
            r.param(Vec::<TypeDescriptor>::new());
        });
        assert_eq!(rules.validate(), Err(ConfigurationError::EmptyParamTypes));
    }

    #[test]
    fn test_invalid_name_pattern() {
        let rules = RuleSet::new(|r| {
            r.name_conditions(|c| {
                c.matches("(");
            });
        });
        assert!(matches!(
            rules.validate(),
            Err(ConfigurationError::InvalidNamePattern { .. })
        ));
    }

    #[test]
    fn test_display() {
        let rules = RuleSet::new(|r| {
            r.name("foo");
            r.param(["int", "long"]).index(1);
            r.search_ancestors();
        });
        assert_eq!(
            rules.to_string(),
            "[name:foo param:(\"int\", \"long\") index:1 searchAncestors]"
        );
    }

    #[test]
    fn test_ordinal_resolve() {
        assert_eq!(Ordinal::At(1).resolve(2), Some(1));
        assert_eq!(Ordinal::At(2).resolve(2), None);
        assert_eq!(Ordinal::Last.resolve(3), Some(2));
        assert_eq!(Ordinal::Last.resolve(0), None);
    }
}
