//! Cache coherence under concurrent resolution.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::main_ty;
use reflex::{Finder, FinderConfig, RuleSet};

#[test]
fn test_concurrent_resolution_computes_once() {
    let finder = Finder::new(common::table());
    let rules = RuleSet::new(|r| {
        r.name("foo");
    });
    let threads = 8;
    let barrier = Barrier::new(threads);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    finder.resolve(&main_ty(), &rules)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(finder.provider().enumeration_count(), 1);
    assert_eq!(finder.cache().len(), 1);
}

#[test]
fn test_clones_of_a_rule_set_share_the_entry() {
    let finder = Finder::new(common::table());
    let rules = RuleSet::new(|r| {
        r.name("render");
    });
    let copy = rules.clone();

    let a = finder.resolve(&main_ty(), &rules);
    let b = finder.resolve(&main_ty(), &copy);
    assert!(Arc::ptr_eq(&a, &b));

    // An equal but separately built rule set is a separate entry
    let rebuilt = RuleSet::new(|r| {
        r.name("render");
    });
    let c = finder.resolve(&main_ty(), &rebuilt);
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a, c);
    assert_eq!(finder.provider().enumeration_count(), 2);
}

#[test]
fn test_failures_are_cached_too() {
    let config = FinderConfig::builder().report_failures(false).build();
    let finder = Finder::new(common::table()).with_config(config);
    let rules = RuleSet::new(|r| {
        r.name("missing");
    });

    let a = finder.resolve(&main_ty(), &rules);
    let b = finder.resolve(&main_ty(), &rules);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.failure().is_some());
    assert_eq!(finder.provider().enumeration_count(), 1);
}

#[test]
fn test_rule_set_per_call_keeps_cache_bounded() {
    let config = FinderConfig::builder().report_failures(false).build();
    let finder = Finder::new(common::table()).with_config(config);
    let kept = RuleSet::new(|r| {
        r.name("render");
    });
    let first = finder.resolve(&main_ty(), &kept);

    for _ in 0..10_000 {
        let result = finder.find(
            &main_ty(),
            &RuleSet::new(|r| {
                r.name("foo");
            }),
        );
        assert!(result.found());
    }

    let entries = finder.cache().len();
    assert!(entries <= 64, "cache grew to {} entries", entries);
    assert!(Arc::ptr_eq(&first, &finder.resolve(&main_ty(), &kept)));
}
