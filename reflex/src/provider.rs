//! Reflective metadata provider.
//!
//! The engine never inspects a runtime itself. It consumes the
//! [`MetadataProvider`] primitives: list a type's members, list its
//! ancestors, resolve a type name, and invoke a member.
//!
//! [`TypeTable`] is an in-memory provider holding a metadata snapshot. It
//! backs the test suite and suits hosts that export their metadata up
//! front.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::types::{CandidateMember, TypeRef, Value};

/// Errors raised while invoking a member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("no member to invoke")]
    NoMember,

    #[error("invoking `{member}` failed: {message}")]
    Reflective { member: String, message: String },

    #[error("argument mismatch: expected {expected} argument(s), got {actual}")]
    ArgumentMismatch { expected: usize, actual: usize },
}

/// Source of reflective metadata and invocation.
pub trait MetadataProvider: Send + Sync {
    /// Members declared on `ty`, in a stable order.
    fn list_members(&self, ty: &TypeRef) -> Vec<CandidateMember>;

    /// Ancestors of `ty`, nearest first, excluding the hierarchy root.
    fn list_ancestors(&self, ty: &TypeRef) -> Vec<TypeRef>;

    /// Resolve a qualified type name. `None` means the type is unknown and
    /// no descriptor naming it can match.
    fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        Some(TypeRef::new(name))
    }

    /// Invoke `member` on `instance` (`None` for static members).
    fn invoke_member(
        &self,
        member: &CandidateMember,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, InvocationError>;

    /// Invoke the original body of `member`, bypassing any installed
    /// override. `None` means the capability is unavailable and callers
    /// fall back to [`invoke_member`](Self::invoke_member).
    fn invoke_original_member(
        &self,
        _member: &CandidateMember,
        _instance: Option<&Value>,
        _args: &[Value],
    ) -> Option<Result<Value, InvocationError>> {
        None
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    fn list_members(&self, ty: &TypeRef) -> Vec<CandidateMember> {
        (**self).list_members(ty)
    }

    fn list_ancestors(&self, ty: &TypeRef) -> Vec<TypeRef> {
        (**self).list_ancestors(ty)
    }

    fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        (**self).resolve_type(name)
    }

    fn invoke_member(
        &self,
        member: &CandidateMember,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        (**self).invoke_member(member, instance, args)
    }

    fn invoke_original_member(
        &self,
        member: &CandidateMember,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Option<Result<Value, InvocationError>> {
        (**self).invoke_original_member(member, instance, args)
    }
}

/// Body of a member registered in a [`TypeTable`].
pub type InvokeFn =
    Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, InvocationError> + Send + Sync>;

#[derive(Debug, Default)]
struct TypeEntry {
    parent: Option<TypeRef>,
    members: Vec<CandidateMember>,
}

/// In-memory metadata snapshot.
#[derive(Default)]
pub struct TypeTable {
    types: FxHashMap<TypeRef, TypeEntry>,
    known: FxHashSet<TypeRef>,
    root: Option<TypeRef>,
    bodies: FxHashMap<CandidateMember, InvokeFn>,
    originals: FxHashMap<CandidateMember, InvokeFn>,
    enumerations: AtomicUsize,
}

impl TypeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hierarchy root. It is never reported as an ancestor.
    pub fn with_root(mut self, root: impl Into<TypeRef>) -> Self {
        let root = root.into();
        self.known.insert(root.clone());
        self.root = Some(root);
        self
    }

    /// Declare a type and its direct parent.
    pub fn add_type(&mut self, ty: impl Into<TypeRef>, parent: Option<TypeRef>) -> &mut Self {
        let ty = ty.into();
        self.known.insert(ty.clone());
        if let Some(parent) = &parent {
            self.known.insert(parent.clone());
        }
        self.types.entry(ty).or_default().parent = parent;
        self
    }

    /// Append a member to its declaring type, declaring the type if needed.
    pub fn add_member(&mut self, member: CandidateMember) -> &mut Self {
        self.known.insert(member.declaring_type.clone());
        self.known.insert(member.return_type.clone());
        self.known.extend(member.param_types.iter().cloned());
        self.types
            .entry(member.declaring_type.clone())
            .or_default()
            .members
            .push(member);
        self
    }

    /// Register the body invoked for `member`.
    pub fn on_invoke<F>(&mut self, member: &CandidateMember, body: F) -> &mut Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.bodies.insert(member.clone(), Arc::new(body));
        self
    }

    /// Register the original body of an overridden `member`.
    pub fn on_invoke_original<F>(&mut self, member: &CandidateMember, body: F) -> &mut Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.originals.insert(member.clone(), Arc::new(body));
        self
    }

    /// How many times `list_members` has been called.
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    fn check_arity(member: &CandidateMember, args: &[Value]) -> Result<(), InvocationError> {
        if member.arity() != args.len() {
            return Err(InvocationError::ArgumentMismatch {
                expected: member.arity(),
                actual: args.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("types", &self.types)
            .field("root", &self.root)
            .field("bodies", &self.bodies.len())
            .field("originals", &self.originals.len())
            .finish()
    }
}

impl MetadataProvider for TypeTable {
    fn list_members(&self, ty: &TypeRef) -> Vec<CandidateMember> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.types
            .get(ty)
            .map(|entry| entry.members.clone())
            .unwrap_or_default()
    }

    fn list_ancestors(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut ancestors = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(ty.clone());

        let mut current = self.types.get(ty).and_then(|entry| entry.parent.clone());
        while let Some(parent) = current {
            if self.root.as_ref() == Some(&parent) || !seen.insert(parent.clone()) {
                break;
            }
            current = self.types.get(&parent).and_then(|entry| entry.parent.clone());
            ancestors.push(parent);
        }
        ancestors
    }

    fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        let ty = TypeRef::new(name);
        self.known.contains(&ty).then_some(ty)
    }

    fn invoke_member(
        &self,
        member: &CandidateMember,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        Self::check_arity(member, args)?;
        let body = self.bodies.get(member).ok_or_else(|| InvocationError::Reflective {
            member: member.to_string(),
            message: "member has no registered body".to_string(),
        })?;
        body(instance, args)
    }

    fn invoke_original_member(
        &self,
        member: &CandidateMember,
        instance: Option<&Value>,
        args: &[Value],
    ) -> Option<Result<Value, InvocationError>> {
        let body = self.originals.get(member)?;
        Some(Self::check_arity(member, args).and_then(|()| body(instance, args)))
    }
}
