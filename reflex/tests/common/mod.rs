//! Shared fixture: a two-level activity hierarchy.

#![allow(dead_code)]

use std::sync::Arc;

use reflex::{
    CandidateMember, Finder, InvocationError, Modifiers, RecordingSink, TypeRef, TypeTable, Value,
};

pub const BASE: &str = "app.BaseActivity";
pub const MAIN: &str = "app.MainActivity";

pub fn main_ty() -> TypeRef {
    TypeRef::new(MAIN)
}

pub fn base_ty() -> TypeRef {
    TypeRef::new(BASE)
}

/// `app.MainActivity` extends `app.BaseActivity` extends `java.lang.Object`.
///
/// Declaration order of `app.MainActivity`:
/// `render(int)`, `foo(int)`, `foo()`, `count()`, `fail()`.
pub fn table() -> TypeTable {
    let count = CandidateMember::new(MAIN, "count")
        .returning("int")
        .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC);
    let fail = CandidateMember::new(MAIN, "fail").returning("int");
    let title = CandidateMember::new(BASE, "getTitle").returning("java.lang.String");

    let mut table = TypeTable::new().with_root("java.lang.Object");
    table
        .add_type(BASE, Some(TypeRef::new("java.lang.Object")))
        .add_type(MAIN, Some(base_ty()))
        .add_member(
            CandidateMember::new(BASE, "onCreate")
                .with_params(["android.os.Bundle"])
                .with_modifiers(Modifiers::PROTECTED),
        )
        .add_member(title.clone())
        .add_member(CandidateMember::new(MAIN, "render").with_params(["int"]).returning("boolean"))
        .add_member(CandidateMember::new(MAIN, "foo").with_params(["int"]))
        .add_member(CandidateMember::new(MAIN, "foo"))
        .add_member(count.clone())
        .add_member(fail.clone())
        .on_invoke(&count, |_, _| Ok(Value::Int(5)))
        .on_invoke(&title, |_, _| Ok(Value::from("Main")))
        .on_invoke(&fail, |_, _| {
            Err(InvocationError::Reflective {
                member: "fail".to_string(),
                message: "target threw".to_string(),
            })
        });
    table
}

pub fn finder() -> (Finder<TypeTable>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let finder = Finder::new(table()).with_sink(sink.clone());
    (finder, sink)
}
