//! Remedy plans, bind mode and the diagnostics they produce.

mod common;

use std::cell::RefCell;

use common::main_ty;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use reflex::{CandidateMember, DiagnosticEvent, RecordingSink, RemedyState, RuleSet};

fn missing() -> RuleSet {
    RuleSet::new(|r| {
        r.name("missing");
    })
}

fn count_events(sink: &RecordingSink, pred: impl Fn(&DiagnosticEvent) -> bool) -> usize {
    sink.events().iter().filter(|e| pred(e)).count()
}

#[test]
fn test_third_entry_matches_and_fourth_is_never_tried() {
    let (finder, _sink) = common::finder();
    let fired = RefCell::new(Vec::new());

    let result = finder.find(&main_ty(), &missing()).remedies(|plan| {
        plan.member(|r| {
            r.name("nope");
        })
        .on_found(|_| fired.borrow_mut().push(1));
        plan.member(|r| {
            r.name("foo");
            r.param_count(5);
        })
        .on_found(|_| fired.borrow_mut().push(2));
        plan.member(|r| {
            r.name("count");
        })
        .on_found(|found| {
            assert_eq!(found.primary().map(|m| m.name.as_str()), Some("count"));
            fired.borrow_mut().push(3);
        });
        plan.member(|r| {
            r.name("render");
        })
        .on_found(|_| fired.borrow_mut().push(4));
    });

    let report = result.remedy_report().cloned().expect("remedy ran");
    assert_eq!(report.state, RemedyState::Succeeded { attempt: 2 });
    assert_eq!(report.attempted_count, 3);
    assert_eq!(*fired.borrow(), vec![3]);
    assert!(result.found());
    assert_eq!(result.give().map(|m| m.name.as_str()), Some("count"));
    // Primary resolution plus three entries
    assert_eq!(finder.provider().enumeration_count(), 4);
}

#[test]
fn test_configuration_error_moves_to_next_entry() {
    let (finder, sink) = common::finder();

    let result = finder.find(&main_ty(), &missing()).remedies(|plan| {
        plan.member(|r| {
            r.search_ancestors();
        });
        plan.member(|r| {
            r.name("render");
        });
    });

    let report = result.remedy_report().cloned().expect("remedy ran");
    assert!(report.succeeded());
    assert!(report.last_error.as_ref().is_some_and(|e| e.is_configuration()));
    drop(result);

    assert_eq!(
        count_events(&sink, |e| {
            matches!(e, DiagnosticEvent::RemedyAttemptFailed { attempt: 0, .. })
        }),
        1
    );
    assert_eq!(
        count_events(&sink, |e| matches!(e, DiagnosticEvent::RemedySucceeded { attempt: 1, .. })),
        1
    );
    assert_eq!(count_events(&sink, |e| matches!(e, DiagnosticEvent::ResolutionFailed { .. })), 0);
}

#[test]
fn test_failure_without_remedy_emits_one_event() {
    let (finder, sink) = common::finder();

    let result = finder.find(&main_ty(), &missing());
    assert!(!result.found());
    assert!(result.get(None).member().is_none());
    drop(result);

    let events = sink.take();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::ResolutionFailed { tag, cause, context } => {
            assert_eq!(tag, "Method");
            assert!(cause.is_not_found());
            assert_eq!(context.ty, main_ty());
        }
        other => panic!("Expected ResolutionFailed, got {:?}", other),
    }
}

#[test]
fn test_exhausted_remedy_emits_one_event_per_attempt_plus_aggregate() {
    let (finder, sink) = common::finder();

    let result = finder.find(&main_ty(), &missing()).remedies(|plan| {
        plan.member(|r| {
            r.name("a");
        });
        plan.member(|r| {
            r.name("b");
        });
        plan.member(|r| {
            r.name("c");
        });
    });
    assert!(!result.found());
    assert_eq!(result.remedy_report().map(|r| r.state), Some(RemedyState::Exhausted));
    drop(result);

    let events = sink.take();
    assert_eq!(events.len(), 4);
    assert!(events[..3]
        .iter()
        .all(|e| matches!(e, DiagnosticEvent::RemedyAttemptFailed { .. })));
    match &events[3] {
        DiagnosticEvent::RemedyExhausted {
            total_attempts,
            last_cause,
            ..
        } => {
            assert_eq!(*total_attempts, 3);
            assert!(last_cause.as_ref().is_some_and(|c| c.is_not_found()));
        }
        other => panic!("Expected RemedyExhausted, got {:?}", other),
    }
}

#[test]
fn test_empty_plan_is_reported() {
    let (finder, sink) = common::finder();

    let result = finder.find(&main_ty(), &missing()).remedies(|_| {});
    assert_eq!(result.remedy_report().map(|r| r.attempted_count), Some(0));
    drop(result);

    assert!(matches!(sink.events()[..], [DiagnosticEvent::RemedyEmpty { .. }]));
}

#[test]
fn test_bind_mode_primary_and_all() {
    let (finder, _sink) = common::finder();
    let target = Mutex::new(Vec::<CandidateMember>::new());
    let rules = RuleSet::new(|r| {
        r.name("foo");
    });

    let process = finder.process(&main_ty(), &rules, &target);
    assert_eq!(
        target.lock().iter().map(CandidateMember::arity).collect::<Vec<_>>(),
        vec![1]
    );

    process.all();
    assert_eq!(
        target.lock().iter().map(CandidateMember::arity).collect::<Vec<_>>(),
        vec![1, 0]
    );
}

#[test]
fn test_bind_mode_failure_clears_target_and_remedy_rebinds() {
    let (finder, sink) = common::finder();
    let target = Mutex::new(vec![CandidateMember::new("Stale", "old")]);

    let process = finder.process(&main_ty(), &missing(), &target);
    assert!(target.lock().is_empty());

    let process = process.all().remedies(|plan| {
        plan.member(|r| {
            r.name("foo");
        });
    });
    assert!(process.found());
    assert_eq!(target.lock().len(), 2);
    drop(process);

    assert_eq!(count_events(&sink, |e| matches!(e, DiagnosticEvent::ResolutionFailed { .. })), 0);
}
