//! Rendering of rule sets, members and failures.

mod common;

use common::main_ty;
use insta::assert_snapshot;
use reflex::{Matcher, RuleSet, TypeDescriptor};

#[test]
fn test_rule_set_rendering() {
    let rules = RuleSet::new(|r| {
        r.name("foo");
        r.param(["int", "long"]).index(1);
        r.search_ancestors();
    });
    assert_snapshot!(
        rules.to_string(),
        @r#"[name:foo param:("int", "long") index:1 searchAncestors]"#
    );

    let rules = RuleSet::new(|r| {
        r.return_type(TypeDescriptor::any_of(["int", "boolean"]));
        r.modifiers(|m| {
            m.is_public();
            m.not_static();
        });
        r.order().last();
    });
    assert_snapshot!(
        rules.to_string(),
        @r#"[returnType:anyOf("int" | "boolean") modifiers:[public !static] order:last]"#
    );
}

#[test]
fn test_member_rendering() {
    let table = common::table();
    let rules = RuleSet::new(|r| {
        r.name("render");
    });
    let result = Matcher::new(&table).resolve(&main_ty(), &rules);
    let member = result.primary().map(ToString::to_string).unwrap_or_default();
    assert_snapshot!(member, @"boolean app.MainActivity.render(int)");
}

#[test]
fn test_not_found_rendering() {
    let table = common::table();
    let rules = RuleSet::new(|r| {
        r.name("missing");
        r.search_ancestors();
    });
    let result = Matcher::new(&table).resolve(&main_ty(), &rules);
    let message = result.failure().map(ToString::to_string).unwrap_or_default();
    assert_snapshot!(
        message,
        @"can't find member [name:missing searchAncestors] in `app.MainActivity` (searched 2 type(s))"
    );
}
