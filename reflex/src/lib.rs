//! Reflex: Reflective Member Resolution
//!
//! Locates members of a type by declarative rules instead of by exact
//! signature. A [`RuleSet`] describes what to look for; a [`Finder`]
//! enumerates the type's members through a [`MetadataProvider`], filters
//! them, and returns an ordered result.
//!
//! # Features
//!
//! - Name, parameter, return type and modifier criteria
//! - Positional selection among filtered matches or raw declaration order
//! - Optional walk up the ancestor chain
//! - A result cache keyed by (type, rule set), computed once per key
//! - Remedy plans: ordered fallback rule sets tried after a failure
//! - Invocation handles with zero-value typed accessors
//! - Bind mode, writing results into a caller-owned target
//!
//! # Example
//!
//! ```
//! use reflex::{CandidateMember, Finder, RuleSet, TypeRef, TypeTable, Value};
//!
//! let answer = CandidateMember::new("app.Oracle", "answer").returning("int");
//! let mut table = TypeTable::new();
//! table
//!     .add_member(answer.clone())
//!     .on_invoke(&answer, |_, _| Ok(Value::Int(42)));
//!
//! let finder = Finder::new(table);
//! let rules = RuleSet::new(|r| {
//!     r.name("answer");
//!     r.empty_param();
//! });
//!
//! let result = finder.find(&TypeRef::new("app.Oracle"), &rules);
//! assert!(result.found());
//! assert_eq!(result.get(None).int(&[]), 42);
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod finder;
pub mod instance;
pub mod matcher;
pub mod provider;
pub mod remedy;
pub mod result;
pub mod rules;
pub mod types;

pub use cache::{CacheKey, ResolutionCache};
pub use config::{ConfigError, FinderConfig};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, NullSink, RecordingSink, TracingSink};
pub use finder::{bind_all, bind_primary, BindTarget, FindResult, Finder, Process};
pub use instance::{FromValue, InstanceHandle};
pub use matcher::Matcher;
pub use provider::{InvocationError, MetadataProvider, TypeTable};
pub use remedy::{RemedyPlan, RemedyReport, RemedyState};
pub use result::{ConfigurationError, NotFound, ResolutionResult, ResolveError};
pub use rules::{IndexSelector, ModifierRules, NameConditions, Ordinal, RuleSet, RuleSetBuilder};
pub use types::{CandidateMember, Modifiers, ObjectRef, TypeDescriptor, TypeRef, Value};
