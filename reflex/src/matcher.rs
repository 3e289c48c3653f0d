//! Member resolution against a rule set.
//!
//! This module implements the algorithm that turns a [`RuleSet`] and a
//! type's member list into an ordered result set.
//!
//! # Algorithm Overview
//!
//! 1. **Validate**: reject rule sets that break their invariants, before
//!    anything is enumerated
//! 2. **Enumerate**: list the type's members in provider order, never
//!    re-sorted, so positions stay reproducible
//! 3. **Select**: either take a raw position (`OrderAt`), or filter by
//!    every set criterion and then apply `MatchAt` / `MatchAll`
//! 4. **Walk ancestors**: when enabled and nothing matched, repeat on each
//!    ancestor, nearest first, stopping at the first one that matches
//!
//! The first member of the final sequence is the primary result.

use indexmap::IndexSet;
use tracing::trace;

use crate::provider::MetadataProvider;
use crate::result::{NotFound, ResolutionResult};
use crate::rules::{IndexSelector, RuleSet};
use crate::types::{CandidateMember, TypeDescriptor, TypeRef};

/// Resolves rule sets against a metadata provider.
pub struct Matcher<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: MetadataProvider + ?Sized> Matcher<'a, P> {
    /// Create a matcher over a provider.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Resolve `rules` against `ty`.
    ///
    /// For a fixed provider snapshot this always yields the same members in
    /// the same order.
    pub fn resolve(&self, ty: &TypeRef, rules: &RuleSet) -> ResolutionResult {
        // Step 1: Validate before enumerating anything
        if let Err(err) = rules.validate() {
            return ResolutionResult::failed(err);
        }

        // Step 2: Work out which types to search, in order
        let chain = self.search_chain(ty, rules);

        let mut searched = Vec::with_capacity(chain.len());
        for candidate_ty in chain {
            // Step 3: Enumerate and select within one type
            let members = self.provider.list_members(&candidate_ty);
            trace!("enumerated {} member(s) of {}", members.len(), candidate_ty);

            let selected = self.select(members, rules);
            if !selected.is_empty() {
                return ResolutionResult::matched(selected, candidate_ty);
            }

            // Step 4: Fall through to the next ancestor
            searched.push(candidate_ty);
        }

        ResolutionResult::failed(NotFound {
            ty: ty.clone(),
            searched,
            rules: rules.to_string(),
        })
    }

    /// Types to search: the type itself, then (optionally) its ancestors.
    fn search_chain(&self, ty: &TypeRef, rules: &RuleSet) -> Vec<TypeRef> {
        if !rules.searches_ancestors() {
            return vec![ty.clone()];
        }

        let ancestors = self.provider.list_ancestors(ty);
        trace!("{} has {} ancestor(s) to search", ty, ancestors.len());

        if rules.ancestors_only() && !ancestors.is_empty() {
            return ancestors;
        }

        let mut chain = Vec::with_capacity(ancestors.len() + 1);
        chain.push(ty.clone());
        chain.extend(ancestors);
        chain
    }

    /// Apply the selector to one type's enumeration.
    fn select(&self, members: Vec<CandidateMember>, rules: &RuleSet) -> IndexSet<CandidateMember> {
        match rules.index_selector() {
            // Positional selection ignores every other criterion
            IndexSelector::OrderAt(ordinal) => {
                match ordinal.resolve(members.len()) {
                    Some(index) => members.into_iter().skip(index).take(1).collect(),
                    None => IndexSet::new(),
                }
            }
            IndexSelector::MatchAt(ordinal) => {
                let filtered: Vec<_> = members
                    .into_iter()
                    .filter(|m| self.is_match(m, rules))
                    .collect();
                match ordinal.resolve(filtered.len()) {
                    Some(index) => filtered.into_iter().skip(index).take(1).collect(),
                    None => IndexSet::new(),
                }
            }
            IndexSelector::MatchAll => members
                .into_iter()
                .filter(|m| self.is_match(m, rules))
                .collect(),
        }
    }

    /// Check a single member against every criterion set on `rules`.
    ///
    /// Selectors and the ancestor flag are not consulted here.
    pub fn is_match(&self, member: &CandidateMember, rules: &RuleSet) -> bool {
        // Name: a pattern block governs over the exact name
        if let Some(conditions) = rules.name_conditions() {
            if !conditions.is_match(&member.name) {
                return false;
            }
        } else if let Some(name) = rules.name() {
            if member.name != name {
                return false;
            }
        }

        // Parameter count: exact count wins over the range
        if let Some(count) = rules.param_count() {
            if member.arity() != count {
                return false;
            }
        } else if let Some(range) = rules.param_count_range() {
            if !range.contains(&member.arity()) {
                return false;
            }
        }

        // Parameter types: element-wise, arity mismatch is a plain non-match
        if let Some(expected) = rules.param_types() {
            if expected.len() != member.arity() {
                return false;
            }
            let all_match = expected
                .iter()
                .zip(&member.param_types)
                .all(|(descriptor, actual)| self.descriptor_matches(descriptor, actual));
            if !all_match {
                return false;
            }
        }

        if let Some(ret) = rules.return_type() {
            if !self.descriptor_matches(ret, &member.return_type) {
                return false;
            }
        }

        if let Some(modifiers) = rules.modifiers() {
            if !modifiers.is_match(member.modifiers) {
                return false;
            }
        }

        true
    }

    /// Check a descriptor against a concrete type by exact equality.
    pub fn descriptor_matches(&self, descriptor: &TypeDescriptor, actual: &TypeRef) -> bool {
        match descriptor {
            TypeDescriptor::Concrete(ty) => ty == actual,
            // Unknown names never match
            TypeDescriptor::Named(name) => self
                .provider
                .resolve_type(name)
                .is_some_and(|ty| &ty == actual),
            TypeDescriptor::AnyOf(options) => options
                .iter()
                .any(|option| self.descriptor_matches(option, actual)),
        }
    }
}
