//! Core data model for member resolution.
//!
//! These are read-only projections of the host's reflective metadata:
//! type identities, the members declared on them, and the dynamic values
//! that flow through member invocation. Everything here is produced by a
//! [`MetadataProvider`](crate::provider::MetadataProvider) and never
//! mutated by the engine.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Identity of a type known to the metadata provider.
///
/// Two `TypeRef`s are the same type exactly when their qualified names
/// are equal. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    /// Create a type reference from its qualified name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The qualified name of this type.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// The unqualified (last dotted segment) name of this type.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A type as written in a rule set.
///
/// Descriptors are only resolved against concrete types at match time,
/// so a rule set can mention types the provider has not loaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// An already resolved type.
    Concrete(TypeRef),
    /// A qualified name, resolved through the provider when matching.
    Named(String),
    /// Satisfied when any of the inner descriptors is satisfied.
    AnyOf(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Build a descriptor matching any of the given descriptors.
    pub fn any_of<I, D>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<TypeDescriptor>,
    {
        TypeDescriptor::AnyOf(descriptors.into_iter().map(Into::into).collect())
    }

    /// Build a descriptor from a qualified name.
    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(name.into())
    }
}

impl From<TypeRef> for TypeDescriptor {
    fn from(ty: TypeRef) -> Self {
        TypeDescriptor::Concrete(ty)
    }
}

impl From<&TypeRef> for TypeDescriptor {
    fn from(ty: &TypeRef) -> Self {
        TypeDescriptor::Concrete(ty.clone())
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        TypeDescriptor::Named(name.to_string())
    }
}

impl From<String> for TypeDescriptor {
    fn from(name: String) -> Self {
        TypeDescriptor::Named(name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Concrete(ty) => write!(f, "{}", ty),
            TypeDescriptor::Named(name) => write!(f, "\"{}\"", name),
            TypeDescriptor::AnyOf(options) => {
                write!(f, "anyOf(")?;
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", option)?;
                }
                write!(f, ")")
            }
        }
    }
}

bitflags! {
    /// Modifier bit-set of a member.
    ///
    /// Bit values follow the JVM access flag layout so that hosts can pass
    /// their raw modifier integers straight through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
    }
}

/// A reflectively discoverable method declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateMember {
    /// The type that declares this member.
    pub declaring_type: TypeRef,
    /// The member's name.
    pub name: String,
    /// Parameter types in declaration order.
    pub param_types: Vec<TypeRef>,
    /// Return type.
    pub return_type: TypeRef,
    /// Modifier bit-set.
    pub modifiers: Modifiers,
}

impl CandidateMember {
    /// Create a public, parameterless member returning `void`.
    pub fn new(declaring_type: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            param_types: Vec::new(),
            return_type: TypeRef::new("void"),
            modifiers: Modifiers::PUBLIC,
        }
    }

    /// Set the parameter types.
    pub fn with_params<I, T>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        self.param_types = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the return type.
    pub fn returning(mut self, ty: impl Into<TypeRef>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Set the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    /// Whether the member can be invoked without a receiver.
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }
}

impl fmt::Display for CandidateMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}(", self.return_type, self.declaring_type, self.name)?;
        for (i, ty) in self.param_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}

/// Opaque reference to a host object, understood only by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Runtime type of the object.
    pub ty: TypeRef,
    /// Host-assigned identity.
    pub id: u64,
}

impl ObjectRef {
    /// Create an object reference.
    pub fn new(ty: impl Into<TypeRef>, id: u64) -> Self {
        Self { ty: ty.into(), id }
    }
}

/// A dynamically typed value passed to or returned from an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    /// Short name of the value's variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// The runtime type of an object value.
    pub fn object_type(&self) -> Option<&TypeRef> {
        match self {
            Value::Object(obj) => Some(&obj.ty),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}
