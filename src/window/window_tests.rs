use super::*;

#[derive(Debug, Clone, PartialEq)]
struct Msg {
    id: u32,
    body: String,
}

impl TimelineItem for Msg {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }
}

fn msg(id: u32) -> Msg {
    Msg {
        id,
        body: format!("message {}", id),
    }
}

fn msgs(ids: impl IntoIterator<Item = u32>) -> Vec<Msg> {
    ids.into_iter().map(msg).collect()
}

fn window_with(ids: impl IntoIterator<Item = u32>) -> Window<Msg> {
    let mut window = Window::new(SortOrder::Ascending);
    window.merge(msgs(ids));
    window
}

#[test]
fn new_window_is_empty() {
    let window: Window<Msg> = Window::new(SortOrder::Ascending);
    assert!(window.is_empty());
    assert_eq!(window.len(), 0);
    assert_eq!(window.first_key(), None);
    assert_eq!(window.revision(), 0);
}

#[test]
fn merge_into_empty_window_sorts_items() {
    let mut window = Window::new(SortOrder::Ascending);
    let outcome = window.merge(msgs([3, 1, 2]));

    assert_eq!(outcome.added, 3);
    assert_eq!(outcome.duplicates, 0);
    assert_eq!(window.keys_in_order(), vec![1, 2, 3]);
}

#[test]
fn merge_inserts_at_sorted_position_not_appended() {
    let mut window = window_with([1, 2, 5, 6]);
    window.merge(msgs([3, 4]));

    assert_eq!(window.keys_in_order(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn merge_drops_existing_keys() {
    let mut window = window_with([1, 2, 3]);
    let outcome = window.merge(msgs([2, 3, 4]));

    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.duplicates, 2);
    assert_eq!(window.keys_in_order(), vec![1, 2, 3, 4]);
}

#[test]
fn merge_keeps_existing_value_for_duplicate_key() {
    let mut window = window_with([1]);
    window.merge(vec![Msg {
        id: 1,
        body: "edited".to_string(),
    }]);

    assert_eq!(window.get(&1).map(|m| m.body.as_str()), Some("message 1"));
}

#[test]
fn merge_dedups_within_one_batch() {
    let mut window = Window::new(SortOrder::Ascending);
    let outcome = window.merge(vec![
        Msg {
            id: 7,
            body: "first".to_string(),
        },
        Msg {
            id: 7,
            body: "second".to_string(),
        },
    ]);

    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(window.get(&7).map(|m| m.body.as_str()), Some("first"));
}

#[test]
fn merge_same_page_twice_is_a_noop() {
    let mut window = window_with([10, 11, 12]);
    let revision = window.revision();

    let outcome = window.merge(msgs([10, 11, 12]));

    assert_eq!(outcome.added, 0);
    assert_eq!(window.revision(), revision);
    assert_eq!(window.keys_in_order(), vec![10, 11, 12]);
}

#[test]
fn merge_reports_items_above_and_below() {
    let mut window = window_with([10, 20]);
    let outcome = window.merge(msgs([1, 2, 15, 30]));

    assert_eq!(outcome.above, 2);
    assert_eq!(outcome.below, 1);
    assert_eq!(outcome.added, 4);
}

#[test]
fn descending_order_is_honoured() {
    let mut window = Window::new(SortOrder::Descending);
    window.merge(msgs([1, 3, 2]));
    window.merge(msgs([5, 4]));

    assert_eq!(window.keys_in_order(), vec![5, 4, 3, 2, 1]);
    assert!(window.sorts_after_last(&0));
    assert!(!window.sorts_after_last(&6));
}

#[test]
fn trim_top_removes_first_items_and_their_keys() {
    let mut window = window_with(1..=10);
    let removed = window.trim(Edge::Top, 3);

    assert_eq!(removed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(window.first_key(), Some(4));
    assert!(!window.contains(&1));

    // Re-merging a trimmed key is allowed again.
    window.merge(msgs([2]));
    assert_eq!(window.first_key(), Some(2));
}

#[test]
fn trim_bottom_removes_last_items() {
    let mut window = window_with(1..=10);
    let removed = window.trim(Edge::Bottom, 4);

    assert_eq!(removed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![7, 8, 9, 10]);
    assert_eq!(window.last_key(), Some(6));
    assert_eq!(window.len(), 6);
}

#[test]
fn trim_more_than_len_empties_window() {
    let mut window = window_with(1..=3);
    let removed = window.trim(Edge::Top, 10);

    assert_eq!(removed.len(), 3);
    assert!(window.is_empty());
}

#[test]
fn trim_zero_does_not_bump_revision() {
    let mut window = window_with(1..=3);
    let revision = window.revision();

    assert!(window.trim(Edge::Bottom, 0).is_empty());
    assert_eq!(window.revision(), revision);
}

#[test]
fn update_replaces_in_place() {
    let mut window = window_with([1, 2, 3]);
    let updated = window.update(Msg {
        id: 2,
        body: "edited".to_string(),
    });

    assert!(updated);
    assert_eq!(window.position(&2), Some(1));
    assert_eq!(window.get(&2).map(|m| m.body.as_str()), Some("edited"));
}

#[test]
fn update_absent_key_is_noop() {
    let mut window = window_with([1, 2, 3]);
    let revision = window.revision();

    assert!(!window.update(msg(9)));
    assert_eq!(window.len(), 3);
    assert_eq!(window.revision(), revision);
}

#[test]
fn remove_by_key() {
    let mut window = window_with([1, 2, 3]);

    assert_eq!(window.remove(&2).map(|m| m.id), Some(2));
    assert_eq!(window.remove(&2), None);
    assert_eq!(window.keys_in_order(), vec![1, 3]);
}

#[test]
fn upsert_replaces_existing_entry_at_same_position() {
    let mut window = window_with([1, 2, 3]);
    let result = window.upsert(Msg {
        id: 2,
        body: "pushed".to_string(),
    });

    assert_eq!(result, Upsert::Replaced(1));
    assert_eq!(window.len(), 3);
    assert_eq!(window.get(&2).map(|m| m.body.as_str()), Some("pushed"));
}

#[test]
fn upsert_inserts_new_key_sorted() {
    let mut window = window_with([1, 3]);

    assert_eq!(window.upsert(msg(2)), Upsert::Inserted(1));
    assert_eq!(window.upsert(msg(4)), Upsert::Inserted(3));
    assert_eq!(window.keys_in_order(), vec![1, 2, 3, 4]);
}

#[test]
fn replace_all_normalises_transform_output() {
    let mut window = window_with([1, 2, 3]);
    window.replace_all(msgs([3, 1, 3, 5]));

    assert_eq!(window.keys_in_order(), vec![1, 3, 5]);
    assert!(!window.contains(&2));
}

#[test]
fn clear_resets_dedup_state() {
    let mut window = window_with([1, 2, 3]);
    window.clear();

    assert!(window.is_empty());
    let outcome = window.merge(msgs([1, 2, 3]));
    assert_eq!(outcome.added, 3);
}

#[test]
fn take_items_leaves_window_empty() {
    let mut window = window_with([4, 5]);
    let taken = window.take_items();

    assert_eq!(taken.len(), 2);
    assert!(window.is_empty());
    assert!(!window.contains(&4));
}

#[test]
fn edge_key_matches_first_and_last() {
    let window = window_with([4, 8, 6]);
    assert_eq!(window.edge_key(Edge::Top), Some(4));
    assert_eq!(window.edge_key(Edge::Bottom), Some(8));
}

#[test]
fn edge_and_direction_map_onto_each_other() {
    assert_eq!(Edge::Top.direction(), Direction::Backward);
    assert_eq!(Edge::Bottom.direction(), Direction::Forward);
    assert_eq!(Direction::Backward.edge(), Edge::Top);
    assert_eq!(Edge::Top.opposite(), Edge::Bottom);
}
