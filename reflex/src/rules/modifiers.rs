//! Modifier conditions.

use std::fmt;
use std::sync::Arc;

use crate::types::Modifiers;

/// Custom predicate over a modifier bit-set.
pub type ModifierPredicate = Arc<dyn Fn(Modifiers) -> bool + Send + Sync>;

/// Predicate over a member's modifier bit-set.
///
/// Every required flag must be present, every forbidden flag absent, and
/// every custom predicate must accept the bit-set.
#[derive(Clone, Default)]
pub struct ModifierRules {
    required: Modifiers,
    forbidden: Modifiers,
    custom: Vec<ModifierPredicate>,
}

impl ModifierRules {
    /// Create an empty rule block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require all of `flags`.
    pub fn require(&mut self, flags: Modifiers) -> &mut Self {
        self.required |= flags;
        self.forbidden -= flags;
        self
    }

    /// Forbid all of `flags`.
    pub fn forbid(&mut self, flags: Modifiers) -> &mut Self {
        self.forbidden |= flags;
        self.required -= flags;
        self
    }

    pub fn is_public(&mut self) -> &mut Self {
        self.require(Modifiers::PUBLIC)
    }

    pub fn is_private(&mut self) -> &mut Self {
        self.require(Modifiers::PRIVATE)
    }

    pub fn is_protected(&mut self) -> &mut Self {
        self.require(Modifiers::PROTECTED)
    }

    pub fn is_static(&mut self) -> &mut Self {
        self.require(Modifiers::STATIC)
    }

    pub fn is_final(&mut self) -> &mut Self {
        self.require(Modifiers::FINAL)
    }

    pub fn is_synchronized(&mut self) -> &mut Self {
        self.require(Modifiers::SYNCHRONIZED)
    }

    pub fn is_volatile(&mut self) -> &mut Self {
        self.require(Modifiers::VOLATILE)
    }

    pub fn is_transient(&mut self) -> &mut Self {
        self.require(Modifiers::TRANSIENT)
    }

    pub fn is_native(&mut self) -> &mut Self {
        self.require(Modifiers::NATIVE)
    }

    pub fn is_interface(&mut self) -> &mut Self {
        self.require(Modifiers::INTERFACE)
    }

    pub fn is_abstract(&mut self) -> &mut Self {
        self.require(Modifiers::ABSTRACT)
    }

    pub fn is_strict(&mut self) -> &mut Self {
        self.require(Modifiers::STRICT)
    }

    pub fn not_static(&mut self) -> &mut Self {
        self.forbid(Modifiers::STATIC)
    }

    pub fn not_private(&mut self) -> &mut Self {
        self.forbid(Modifiers::PRIVATE)
    }

    pub fn not_abstract(&mut self) -> &mut Self {
        self.forbid(Modifiers::ABSTRACT)
    }

    /// Arbitrary predicate over the bit-set.
    pub fn custom<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(Modifiers) -> bool + Send + Sync + 'static,
    {
        self.custom.push(Arc::new(predicate));
        self
    }

    /// Flags that must be present.
    pub fn required(&self) -> Modifiers {
        self.required
    }

    /// Flags that must be absent.
    pub fn forbidden(&self) -> Modifiers {
        self.forbidden
    }

    /// Whether no condition has been declared.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty() && self.custom.is_empty()
    }

    /// Check a modifier bit-set against this block.
    pub fn is_match(&self, modifiers: Modifiers) -> bool {
        modifiers.contains(self.required)
            && !modifiers.intersects(self.forbidden)
            && self.custom.iter().all(|predicate| predicate(modifiers))
    }
}

impl fmt::Debug for ModifierRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierRules")
            .field("required", &self.required)
            .field("forbidden", &self.forbidden)
            .field("custom", &self.custom.len())
            .finish()
    }
}

impl fmt::Display for ModifierRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (name, _) in self.required.iter_names() {
            parts.push(name.to_lowercase());
        }
        for (name, _) in self.forbidden.iter_names() {
            parts.push(format!("!{}", name.to_lowercase()));
        }
        if !self.custom.is_empty() {
            parts.push(format!("custom x{}", self.custom.len()));
        }
        write!(f, "{}", parts.join(" "))
    }
}
