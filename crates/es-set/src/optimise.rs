//! # Optimiser
//!
//! Rewrites one freshly built node into an equivalent, cheaper one. The
//! rules only look one level down: children handed to a combinator are
//! themselves results of earlier combinator calls and so already
//! optimised.
//!
//! Rules, in priority order:
//! - Empty → itself
//! - Concrete with no events → Empty (same keyset)
//! - Union: drop Empty children; none left → Empty; one left → that child;
//!   all Concrete → one Concrete, deduplicated by id and projected onto the
//!   union's keyset (kept as a Union if that projection fails); otherwise the same
//!   node if nothing was dropped, else a new Union over the survivors
//! - Intersection with any Empty child → that child
//! - Filter/Sort over Empty → the Empty parent
//! - anything else → itself
//!
//! Filters and sorts are not pushed through unions or intersections.
//!
//! The optimiser never materialises and never mutates: it returns either
//! the node it was given or new nodes sharing the untouched subtrees.

use es_core::{Event, KeySet};

use crate::set::{
    dedup_by_id, ConcreteEventSet, EmptyEventSet, EventSet, UnionEventSet,
};

pub fn optimise(set: EventSet) -> EventSet {
    let rewritten = apply_rules(&set);
    if !rewritten.ptr_eq(&set) {
        tracing::trace!(from = %set.kind(), to = %rewritten.kind(), "rewrote event set");
    }
    rewritten
}

fn apply_rules(set: &EventSet) -> EventSet {
    match set {
        EventSet::Empty(_) => set.clone(),

        EventSet::Concrete(c) if c.is_empty() => {
            EventSet::Empty(EmptyEventSet::new(c.keys().clone()))
        }
        EventSet::Concrete(_) => set.clone(),

        EventSet::Union(u) => {
            let live: Vec<EventSet> = u
                .parents()
                .iter()
                .filter(|p| !p.is_empty_set())
                .cloned()
                .collect();
            match live.as_slice() {
                [] => EventSet::Empty(EmptyEventSet::new(u.keys().clone())),
                [only] => only.clone(),
                _ if live.iter().all(EventSet::is_concrete) => {
                    match merge_concrete(u.keys(), &live) {
                        Some(events) => {
                            EventSet::Concrete(ConcreteEventSet::new(u.keys().clone(), events))
                        }
                        None if live.len() == u.parents().len() => set.clone(),
                        None => EventSet::Union(UnionEventSet::new(live)),
                    }
                }
                _ if live.len() == u.parents().len() => set.clone(),
                _ => EventSet::Union(UnionEventSet::new(live)),
            }
        }

        EventSet::Intersection(i) => i
            .parents()
            .iter()
            .find(|p| p.is_empty_set())
            .cloned()
            .unwrap_or_else(|| set.clone()),

        EventSet::Filter(f) if f.parent().is_empty_set() => f.parent().clone(),
        EventSet::Sort(s) if s.parent().is_empty_set() => s.parent().clone(),

        EventSet::Filter(_) | EventSet::Sort(_) | EventSet::Source(_) => set.clone(),
    }
}

/// Events of all-concrete parents as one deduplicated list shaped to `keys`.
///
/// Parents declaring a different keyset are projected first, so the merged
/// set answers exactly like the union would. `None` when a projection needs
/// a default that cannot exist (an `Id` key); the union is then kept.
fn merge_concrete(keys: &KeySet, parents: &[EventSet]) -> Option<Vec<Event>> {
    let mut events = Vec::new();
    for parent in parents {
        let EventSet::Concrete(c) = parent else {
            return None;
        };
        if c.keys() == keys {
            events.extend(c.events().iter().cloned());
        } else {
            for event in c.events() {
                events.push(event.project(keys).ok()?);
            }
        }
    }
    Some(dedup_by_id(&events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmp::asc;
    use crate::expr::{c, eq, v};
    use crate::set::{FilterEventSet, IntersectionEventSet, SortEventSet};
    use es_core::{Value, ValueKind};

    fn keys() -> KeySet {
        KeySet::new().with("num", ValueKind::Num)
    }

    fn concrete(ids: &[&str]) -> EventSet {
        EventSet::Concrete(ConcreteEventSet::new(
            keys(),
            ids.iter().map(|id| Event::new(*id).with("num", 1.0)).collect(),
        ))
    }

    fn empty() -> EventSet {
        EventSet::empty(keys())
    }

    fn lazy(ids: &[&str]) -> EventSet {
        concrete(ids).filter([eq(v("num"), c(1.0))])
    }

    fn union(parents: Vec<EventSet>) -> EventSet {
        EventSet::Union(UnionEventSet::new(parents))
    }

    fn id_list(set: &EventSet) -> Vec<String> {
        match set {
            EventSet::Concrete(c) => c.events().iter().map(|e| e.id.clone()).collect(),
            other => panic!("expected concrete, got {}", other.kind()),
        }
    }

    #[test]
    fn test_empty_and_concrete() {
        let e = empty();
        assert!(optimise(e.clone()).ptr_eq(&e));

        let none = EventSet::Concrete(ConcreteEventSet::new(keys(), Vec::new()));
        let out = optimise(none);
        assert!(out.is_empty_set());
        assert_eq!(out.keys(), &keys());

        let some = concrete(&["a"]);
        assert!(optimise(some.clone()).ptr_eq(&some));
    }

    #[test]
    fn test_union_of_empties_is_empty() {
        let out = optimise(union(vec![empty(), empty()]));
        assert!(out.is_empty_set());
        assert!(optimise(union(Vec::new())).is_empty_set());
    }

    #[test]
    fn test_union_with_single_survivor_unwraps() {
        let only = lazy(&["a"]);
        let out = optimise(union(vec![empty(), only.clone(), empty()]));
        assert!(out.ptr_eq(&only));
    }

    #[test]
    fn test_union_of_concretes_merges() {
        let out = optimise(union(vec![
            concrete(&["a", "b"]),
            empty(),
            concrete(&["b", "c", "a"]),
        ]));
        assert_eq!(id_list(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_union_merge_projects_onto_merged_keys() {
        let nums = EventSet::Concrete(ConcreteEventSet::new(
            keys(),
            vec![Event::new("a").with("num", 1.0)],
        ));
        let tags = EventSet::Concrete(ConcreteEventSet::new(
            KeySet::new().with("tag", ValueKind::Str),
            vec![Event::new("b").with("tag", "x")],
        ));
        let out = optimise(union(vec![nums, tags]));
        match &out {
            EventSet::Concrete(c) => {
                let merged = KeySet::new()
                    .with("num", ValueKind::Num)
                    .with("tag", ValueKind::Str);
                assert_eq!(c.keys(), &merged);
                assert_eq!(c.events()[0].get("tag"), Some(Value::Str(String::new())));
                assert_eq!(c.events()[1].get("num"), Some(Value::Num(0.0)));
                assert_eq!(c.events()[1].get("tag"), Some(Value::Str("x".into())));
            }
            other => panic!("expected concrete, got {}", other.kind()),
        }
    }

    #[test]
    fn test_union_merge_keeps_union_when_an_id_key_is_missing() {
        let with_parent = || {
            EventSet::Concrete(ConcreteEventSet::new(
                KeySet::new().with("parent", ValueKind::Id),
                vec![Event::new("b").with("parent", "a")],
            ))
        };
        // `a` has no `parent` and an `Id` cannot be defaulted.
        let set = union(vec![concrete(&["a"]), with_parent()]);
        assert!(optimise(set.clone()).ptr_eq(&set));

        let out = optimise(union(vec![concrete(&["a"]), empty(), with_parent()]));
        match &out {
            EventSet::Union(u) => assert_eq!(u.parents().len(), 2),
            other => panic!("expected union, got {}", other.kind()),
        }
    }

    #[test]
    fn test_union_unchanged_keeps_identity() {
        let set = union(vec![lazy(&["a"]), concrete(&["b"])]);
        assert!(optimise(set.clone()).ptr_eq(&set));
    }

    #[test]
    fn test_union_drops_empties_and_rebuilds() {
        let a = lazy(&["a"]);
        let b = concrete(&["b"]);
        let set = union(vec![a.clone(), empty(), b.clone()]);
        let out = optimise(set.clone());
        assert!(out.is_union());
        assert!(!out.ptr_eq(&set));
        match &out {
            EventSet::Union(u) => {
                assert_eq!(u.parents().len(), 2);
                assert!(u.parents()[0].ptr_eq(&a));
                assert!(u.parents()[1].ptr_eq(&b));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_intersection_with_empty_returns_that_empty() {
        let first = empty();
        let second = empty();
        let set = EventSet::Intersection(IntersectionEventSet::new(vec![
            lazy(&["a"]),
            first.clone(),
            second,
        ]));
        assert!(optimise(set).ptr_eq(&first));

        let set = EventSet::Intersection(IntersectionEventSet::new(vec![
            concrete(&["a"]),
            concrete(&["a"]),
        ]));
        assert!(optimise(set.clone()).ptr_eq(&set));
    }

    #[test]
    fn test_filter_and_sort_over_empty() {
        let e = empty();
        let f = EventSet::Filter(FilterEventSet::new(e.clone(), vec![v("num")]));
        assert!(optimise(f).ptr_eq(&e));
        let s = EventSet::Sort(SortEventSet::new(e.clone(), vec![asc(v("num"))]));
        assert!(optimise(s).ptr_eq(&e));

        // Not pushed through a union.
        let f = EventSet::Filter(FilterEventSet::new(
            union(vec![lazy(&["a"]), lazy(&["b"])]),
            vec![v("num")],
        ));
        assert!(optimise(f.clone()).ptr_eq(&f));
    }

    #[test]
    fn test_idempotent() {
        let shapes = vec![
            empty(),
            concrete(&[]),
            concrete(&["a"]),
            union(vec![empty(), lazy(&["a"]), lazy(&["b"])]),
            union(vec![concrete(&["a"]), concrete(&["b"])]),
            union(vec![empty()]),
            EventSet::Intersection(IntersectionEventSet::new(vec![lazy(&["a"]), empty()])),
            EventSet::Sort(SortEventSet::new(lazy(&["a"]), vec![asc(v("num"))])),
        ];
        for shape in shapes {
            let once = optimise(shape);
            let twice = optimise(once.clone());
            assert!(twice.ptr_eq(&once), "not idempotent for {}", once.kind());
        }
    }
}
