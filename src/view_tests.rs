use super::*;
use crate::buffer::Buffer;
use crate::point::Point;

fn test_buffer() -> BufferHandle {
    let mut buffer = Buffer::new("view-test");
    buffer.load_string("line one\nline two\nline three");
    buffer.into_handle()
}

fn tree_with_head() -> (Option<Box<View>>, BufferHandle) {
    let buffer = test_buffer();
    let head = View::new(1, Arc::clone(&buffer));
    (Some(Box::new(head)), buffer)
}

// ============================================================
// Splitting
// ============================================================

#[test]
fn split_appends_at_the_axis_tail() {
    let (mut head, buffer) = tree_with_head();
    let root = head.as_mut().unwrap();

    split_view(root, 1, Arc::clone(&buffer), true, 2);
    split_view(root, 1, Arc::clone(&buffer), true, 3);

    // both splits from view 1 chain off horizontally: 1 -> 2 -> 3
    assert_eq!(root.id, 1);
    let second = root.next_horizontal.as_ref().unwrap();
    assert_eq!(second.id, 2);
    assert_eq!(second.next_horizontal.as_ref().unwrap().id, 3);
}

#[test]
fn split_inherits_the_buffer_cursor() {
    let buffer = test_buffer();
    locked_cursor(&buffer, Point::new(2, 1));
    let mut head = View::new(1, Arc::clone(&buffer));
    split_view(&mut head, 1, Arc::clone(&buffer), false, 2);
    assert_eq!(head.next_vertical.as_ref().unwrap().cursor, Point::new(2, 1));
}

fn locked_cursor(buffer: &BufferHandle, cursor: Point) {
    if let Ok(mut guard) = buffer.lock() {
        guard.cursor = cursor;
    }
}

// ============================================================
// Geometry
// ============================================================

#[test]
fn single_view_fills_the_rectangle() {
    let (mut head, _buffer) = tree_with_head();
    let root = head.as_mut().unwrap();
    calc_views(root, Point::new(0, 0), Point::new(79, 23));
    assert_eq!(root.top_left, Point::new(0, 0));
    assert_eq!(root.bottom_right, Point::new(79, 23));
}

#[test]
fn horizontal_split_divides_width_evenly() {
    let (mut head, buffer) = tree_with_head();
    let root = head.as_mut().unwrap();
    split_view(root, 1, buffer, true, 2);
    calc_views(root, Point::new(0, 0), Point::new(79, 23));

    assert_eq!(root.top_left, Point::new(0, 0));
    assert_eq!(root.bottom_right, Point::new(39, 23));
    let second = root.next_horizontal.as_ref().unwrap();
    assert_eq!(second.top_left, Point::new(40, 0));
    assert_eq!(second.bottom_right, Point::new(79, 23));
}

#[test]
fn last_slot_receives_the_remainder() {
    let (mut head, buffer) = tree_with_head();
    let root = head.as_mut().unwrap();
    split_view(root, 1, Arc::clone(&buffer), true, 2);
    split_view(root, 1, buffer, true, 3);
    calc_views(root, Point::new(0, 0), Point::new(79, 23));

    // 80 / 3 = 26 with the remainder on the last view
    assert_eq!(root.bottom_right.x, 25);
    let second = root.next_horizontal.as_ref().unwrap();
    assert_eq!(second.top_left.x, 26);
    assert_eq!(second.bottom_right.x, 51);
    let third = second.next_horizontal.as_ref().unwrap();
    assert_eq!(third.top_left.x, 52);
    assert_eq!(third.bottom_right.x, 79);
}

#[test]
fn nested_vertical_split_recurses_into_the_slot() {
    let (mut head, buffer) = tree_with_head();
    let root = head.as_mut().unwrap();
    split_view(root, 1, Arc::clone(&buffer), true, 2);
    split_view(root, 2, buffer, false, 3);
    calc_views(root, Point::new(0, 0), Point::new(79, 23));

    let second = root.next_horizontal.as_ref().unwrap();
    let third = second.next_vertical.as_ref().unwrap();

    assert_eq!(second.top_left, Point::new(40, 0));
    assert_eq!(second.bottom_right, Point::new(79, 11));
    assert_eq!(third.top_left, Point::new(40, 12));
    assert_eq!(third.bottom_right, Point::new(79, 23));
}

// ============================================================
// Removal and reachability
// ============================================================

#[test]
fn remove_middle_view_rejoins_the_chain_in_halves() {
    let (mut head, buffer) = tree_with_head();
    {
        let root = head.as_mut().unwrap();
        split_view(root, 1, Arc::clone(&buffer), true, 2);
        split_view(root, 1, buffer, true, 3);
    }

    assert!(remove_view(&mut head, 2));

    let root = head.as_mut().unwrap();
    calc_views(root, Point::new(0, 0), Point::new(79, 23));

    assert_eq!(root.ids(), vec![1, 3]);
    assert_eq!(root.bottom_right, Point::new(39, 23));
    let second = root.next_horizontal.as_ref().unwrap();
    assert_eq!(second.top_left, Point::new(40, 0));
    assert_eq!(second.bottom_right, Point::new(79, 23));
}

#[test]
fn remove_head_promotes_the_vertical_child() {
    let (mut head, buffer) = tree_with_head();
    {
        let root = head.as_mut().unwrap();
        split_view(root, 1, Arc::clone(&buffer), true, 2);
        split_view(root, 1, buffer, false, 3);
    }

    assert!(remove_view(&mut head, 1));

    // the vertical child becomes the head and the horizontal chain hangs
    // off its deepest horizontal
    let root = head.as_ref().unwrap();
    assert_eq!(root.id, 3);
    assert_eq!(root.next_horizontal.as_ref().unwrap().id, 2);
}

#[test]
fn remove_preserves_reachability_of_every_other_leaf() {
    let (mut head, buffer) = tree_with_head();
    {
        let root = head.as_mut().unwrap();
        split_view(root, 1, Arc::clone(&buffer), true, 2);
        split_view(root, 2, Arc::clone(&buffer), false, 3);
        split_view(root, 3, Arc::clone(&buffer), true, 4);
        split_view(root, 1, buffer, false, 5);
    }

    let before = head.as_ref().unwrap().ids();
    assert_eq!(before.len(), 5);

    assert!(remove_view(&mut head, 3));

    let mut after = head.as_ref().unwrap().ids();
    after.sort_unstable();
    assert_eq!(after, vec![1, 2, 4, 5]);
}

#[test]
fn remove_last_view_empties_the_tree() {
    let (mut head, _buffer) = tree_with_head();
    assert!(remove_view(&mut head, 1));
    assert!(head.is_none());
}

#[test]
fn remove_unknown_view_fails() {
    let (mut head, _buffer) = tree_with_head();
    assert!(!remove_view(&mut head, 42));
    assert!(head.is_some());
}

// ============================================================
// Lookup
// ============================================================

#[test]
fn find_at_point_picks_the_containing_rectangle() {
    let (mut head, buffer) = tree_with_head();
    let root = head.as_mut().unwrap();
    split_view(root, 1, buffer, true, 2);
    calc_views(root, Point::new(0, 0), Point::new(79, 23));

    assert_eq!(root.find_at_point(Point::new(5, 5)).unwrap().id, 1);
    assert_eq!(root.find_at_point(Point::new(50, 5)).unwrap().id, 2);
    assert!(root.find_at_point(Point::new(200, 5)).is_none());
}

#[test]
fn find_buffer_locates_a_view_showing_it() {
    let (mut head, buffer) = tree_with_head();
    let other = test_buffer();
    let root = head.as_mut().unwrap();
    split_view(root, 1, Arc::clone(&other), true, 2);

    assert_eq!(root.find_buffer(&other).unwrap().id, 2);
    assert_eq!(root.find_buffer(&buffer).unwrap().id, 1);
}
