use proptest::prelude::*;
use std::collections::HashSet;
use timeline_window::{Edge, SortOrder, TimelineItem, Window};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: u16,
    tag: u8,
}

impl TimelineItem for Row {
    type Key = u16;

    fn key(&self) -> u16 {
        self.id
    }
}

#[derive(Debug, Clone)]
enum Op {
    Merge(Vec<(u16, u8)>),
    Trim(bool, usize),
    Upsert(u16, u8),
    Remove(u16),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::collection::vec((0u16..200, any::<u8>()), 0..30).prop_map(Op::Merge),
        2 => (any::<bool>(), 0usize..20).prop_map(|(top, n)| Op::Trim(top, n)),
        2 => (0u16..200, any::<u8>()).prop_map(|(id, tag)| Op::Upsert(id, tag)),
        1 => (0u16..200).prop_map(Op::Remove),
    ]
}

fn order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)]
}

fn rows(pairs: &[(u16, u8)]) -> Vec<Row> {
    pairs.iter().map(|&(id, tag)| Row { id, tag }).collect()
}

fn assert_invariants(window: &Window<Row>) {
    let keys = window.keys_in_order();

    let unique: HashSet<u16> = keys.iter().copied().collect();
    assert_eq!(unique.len(), keys.len(), "duplicate keys in {:?}", keys);

    let sorted = keys.windows(2).all(|pair| match window.order() {
        SortOrder::Ascending => pair[0] < pair[1],
        SortOrder::Descending => pair[0] > pair[1],
    });
    assert!(sorted, "out of order: {:?}", keys);

    for key in &keys {
        assert!(window.contains(key));
    }
}

proptest! {
    /// Keys stay unique and sorted through any sequence of mutations.
    #[test]
    fn prop_window_invariants_hold(order in order(), ops in prop::collection::vec(op(), 1..40)) {
        let mut window = Window::new(order);

        for op in ops {
            match op {
                Op::Merge(page) => {
                    window.merge(rows(&page));
                }
                Op::Trim(top, count) => {
                    let edge = if top { Edge::Top } else { Edge::Bottom };
                    let before = window.len();
                    let removed = window.trim(edge, count);
                    prop_assert_eq!(removed.len(), count.min(before));
                }
                Op::Upsert(id, tag) => {
                    window.upsert(Row { id, tag });
                    prop_assert_eq!(window.get(&id).map(|row| row.tag), Some(tag));
                }
                Op::Remove(id) => {
                    window.remove(&id);
                    prop_assert!(!window.contains(&id));
                }
            }
            assert_invariants(&window);
        }
    }

    /// Merging the same page a second time changes nothing.
    #[test]
    fn prop_merge_is_idempotent(
        order in order(),
        seed in prop::collection::vec((0u16..100, any::<u8>()), 0..30),
        page in prop::collection::vec((0u16..100, any::<u8>()), 0..30),
    ) {
        let mut window = Window::new(order);
        window.merge(rows(&seed));
        window.merge(rows(&page));

        let keys = window.keys_in_order();
        let revision = window.revision();
        let again = window.merge(rows(&page));

        prop_assert_eq!(again.added, 0);
        prop_assert_eq!(again.duplicates, page.len());
        prop_assert_eq!(window.keys_in_order(), keys);
        prop_assert_eq!(window.revision(), revision);
    }

    /// Existing items are never overwritten by a merge: a loaded page may be
    /// older than what a live push already delivered.
    #[test]
    fn prop_merge_keeps_existing_items(ids in prop::collection::hash_set(0u16..100, 1..30)) {
        let mut window = Window::new(SortOrder::Ascending);
        let first: Vec<Row> = ids.iter().map(|&id| Row { id, tag: 1 }).collect();
        let second: Vec<Row> = ids.iter().map(|&id| Row { id, tag: 2 }).collect();

        window.merge(first);
        let outcome = window.merge(second);

        prop_assert_eq!(outcome.added, 0);
        prop_assert!(window.iter().all(|row| row.tag == 1));
    }

    /// Trimming never removes more than requested and always from the named
    /// edge.
    #[test]
    fn prop_trim_takes_from_edge(ids in prop::collection::hash_set(0u16..500, 0..60), count in 0usize..80) {
        let mut window = Window::new(SortOrder::Ascending);
        window.merge(ids.iter().map(|&id| Row { id, tag: 0 }));
        let keys = window.keys_in_order();

        let removed: Vec<u16> = window.trim(Edge::Top, count).iter().map(|row| row.id).collect();

        let taken = count.min(keys.len());
        prop_assert_eq!(&removed[..], &keys[..taken]);
        prop_assert_eq!(window.keys_in_order(), keys[taken..].to_vec());
    }
}
