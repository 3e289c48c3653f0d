//! Invocation handles for resolved members.
//!
//! An [`InstanceHandle`] pairs a resolved member with an optional receiver.
//! [`InstanceHandle::call`] surfaces invocation errors. The typed accessors
//! are best-effort reads: they return a fixed zero value when the call
//! fails or the returned value has a different type.
//!
//! | Accessor | Zero value |
//! |----------|------------|
//! | `int`, `long`, `short` | `0` |
//! | `double`, `float` | `0.0` |
//! | `boolean` | `false` |
//! | `string` | `""` |
//! | `char` | `' '` |
//! | `byte` | `None` |
//! | `array`, `list` | empty `Vec` |

use std::fmt;

use crate::provider::{InvocationError, MetadataProvider};
use crate::types::{CandidateMember, ObjectRef, Value};

/// Conversion out of a dynamic [`Value`].
///
/// Conversions are exact: a `Long` never converts to `i32`, `Null` never
/// converts to anything but `Value`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => Str,
    ObjectRef => Object,
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// A resolved member bound to an optional receiver.
pub struct InstanceHandle<'f, P: ?Sized> {
    provider: &'f P,
    member: Option<CandidateMember>,
    instance: Option<Value>,
    call_original: bool,
}

impl<'f, P: MetadataProvider + ?Sized> InstanceHandle<'f, P> {
    /// Bind `member` to `instance`. `None` as instance means a static call.
    pub fn new(provider: &'f P, member: Option<CandidateMember>, instance: Option<Value>) -> Self {
        Self {
            provider,
            member,
            instance,
            call_original: false,
        }
    }

    /// Bypass an installed override and call the original body.
    ///
    /// Falls back to a direct call when the provider cannot reach the
    /// original body.
    pub fn original(mut self) -> Self {
        self.call_original = true;
        self
    }

    /// The bound member.
    pub fn member(&self) -> Option<&CandidateMember> {
        self.member.as_ref()
    }

    /// The bound receiver.
    pub fn instance(&self) -> Option<&Value> {
        self.instance.as_ref()
    }

    /// Invoke the member.
    pub fn call(&self, args: &[Value]) -> Result<Value, InvocationError> {
        let member = self.member.as_ref().ok_or(InvocationError::NoMember)?;
        let instance = self.instance.as_ref();

        if self.call_original {
            if let Some(result) = self.provider.invoke_original_member(member, instance, args) {
                return result;
            }
        }
        self.provider.invoke_member(member, instance, args)
    }

    /// Invoke and convert the result, `None` on any failure.
    pub fn invoke<T: FromValue>(&self, args: &[Value]) -> Option<T> {
        self.call(args).ok().and_then(T::from_value)
    }

    pub fn byte(&self, args: &[Value]) -> Option<i8> {
        self.invoke(args)
    }

    pub fn int(&self, args: &[Value]) -> i32 {
        self.invoke(args).unwrap_or(0)
    }

    pub fn long(&self, args: &[Value]) -> i64 {
        self.invoke(args).unwrap_or(0)
    }

    pub fn short(&self, args: &[Value]) -> i16 {
        self.invoke(args).unwrap_or(0)
    }

    pub fn double(&self, args: &[Value]) -> f64 {
        self.invoke(args).unwrap_or(0.0)
    }

    pub fn float(&self, args: &[Value]) -> f32 {
        self.invoke(args).unwrap_or(0.0)
    }

    pub fn string(&self, args: &[Value]) -> String {
        self.invoke(args).unwrap_or_default()
    }

    pub fn char(&self, args: &[Value]) -> char {
        self.invoke(args).unwrap_or(' ')
    }

    pub fn boolean(&self, args: &[Value]) -> bool {
        self.invoke(args).unwrap_or(false)
    }

    pub fn array<T: FromValue>(&self, args: &[Value]) -> Vec<T> {
        self.invoke(args).unwrap_or_default()
    }

    pub fn list<T: FromValue>(&self, args: &[Value]) -> Vec<T> {
        self.array(args)
    }
}

impl<P: ?Sized> fmt::Display for InstanceHandle<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = self.member.as_ref().map_or("<empty>", |m| m.name.as_str());
        let receiver = self
            .instance
            .as_ref()
            .and_then(Value::object_type)
            .map_or("<empty>", |ty| ty.name());
        write!(f, "[{}] in [{}]", member, receiver)
    }
}

impl<P: ?Sized> fmt::Debug for InstanceHandle<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("member", &self.member)
            .field("instance", &self.instance)
            .field("call_original", &self.call_original)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TypeTable;
    use pretty_assertions::assert_eq;

    fn table() -> (TypeTable, CandidateMember, CandidateMember) {
        let count = CandidateMember::new("Counter", "count").returning("int");
        let label = CandidateMember::new("Counter", "label").returning("String");
        let mut table = TypeTable::new();
        table
            .add_member(count.clone())
            .add_member(label.clone())
            .on_invoke(&count, |_, _| Ok(Value::Int(7)))
            .on_invoke_original(&count, |_, _| Ok(Value::Int(1)))
            .on_invoke(&label, |_, _| Ok(Value::Long(3)));
        (table, count, label)
    }

    #[test]
    fn test_typed_accessor_reads_value() {
        let (table, count, _) = table();
        let handle = InstanceHandle::new(&table, Some(count), None);
        assert_eq!(handle.int(&[]), 7);
        assert_eq!(handle.invoke::<i32>(&[]), Some(7));
    }

    #[test]
    fn test_original_bypasses_override() {
        let (table, count, label) = table();
        assert_eq!(InstanceHandle::new(&table, Some(count), None).original().int(&[]), 1);
        // No original body registered: direct call
        assert_eq!(
            InstanceHandle::new(&table, Some(label), None).original().long(&[]),
            3
        );
    }

    #[test]
    fn test_zero_values_on_failure() {
        let (table, count, label) = table();
        let failing = InstanceHandle::new(&table, Some(count), None);
        let args = [Value::Int(1)];
        assert_eq!(failing.int(&args), 0);
        assert_eq!(failing.long(&args), 0);
        assert_eq!(failing.short(&args), 0);
        assert_eq!(failing.double(&args), 0.0);
        assert_eq!(failing.float(&args), 0.0);
        assert_eq!(failing.string(&args), "");
        assert_eq!(failing.char(&args), ' ');
        assert!(!failing.boolean(&args));
        assert_eq!(failing.byte(&args), None);
        assert!(failing.array::<i32>(&args).is_empty());
        assert!(failing.list::<String>(&args).is_empty());

        // Type mismatch: returns a long, read as int
        assert_eq!(InstanceHandle::new(&table, Some(label), None).int(&[]), 0);
    }

    #[test]
    fn test_empty_handle() {
        let (table, _, _) = table();
        let handle = InstanceHandle::new(&table, None, None);
        assert_eq!(handle.call(&[]), Err(InvocationError::NoMember));
        assert_eq!(handle.to_string(), "[<empty>] in [<empty>]");
    }

    #[test]
    fn test_display_names_receiver_type() {
        let (table, count, _) = table();
        let counter = Value::Object(ObjectRef::new("app.Counter", 1));
        let handle = InstanceHandle::new(&table, Some(count), Some(counter));
        assert_eq!(handle.to_string(), "[count] in [app.Counter]");
    }

    #[test]
    fn test_vec_conversion_is_all_or_nothing() {
        let mixed = Value::Array(vec![Value::Int(1), Value::Long(2)]);
        assert_eq!(Vec::<i32>::from_value(mixed), None);
        let ints = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(Vec::<i32>::from_value(ints), Some(vec![1, 2]));
    }
}
