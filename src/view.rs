//! Split view trees
//!
//! A view is a rectangular cursor-and-scroll window onto a buffer. Views
//! chain along two axes: `next_horizontal` runs left-to-right and
//! `next_vertical` top-to-bottom, each owned exclusively by its
//! predecessor. A node is both a pane and the anchor of any sub-split
//! hanging off it, so the tree is a chain of chains rooted at the tab.
//!
//! Geometry is recomputed from scratch by [`calc_views`]: each axis
//! divides its extent evenly among the chain, the last slot taking the
//! remainder, and slots with a cross-axis chain recurse.

use std::sync::Arc;

use crate::buffer::BufferHandle;
use crate::jump::JumpList;
use crate::point::Point;

pub type ViewId = u64;

/// A rectangular window onto a buffer
pub struct View {
    pub id: ViewId,
    pub cursor: Point,
    pub top_left: Point,
    pub bottom_right: Point,
    /// First buffer row / column shown in the rectangle
    pub top_row: i64,
    pub left_column: i64,
    pub buffer: BufferHandle,
    pub jumps: JumpList,
    pub next_horizontal: Option<Box<View>>,
    pub next_vertical: Option<Box<View>>,
}

impl View {
    pub fn new(id: ViewId, buffer: BufferHandle) -> Self {
        let cursor = buffer.lock().map(|b| b.cursor).unwrap_or_default();
        View {
            id,
            cursor,
            top_left: Point::default(),
            bottom_right: Point::default(),
            top_row: 0,
            left_column: 0,
            buffer,
            jumps: JumpList::new(),
            next_horizontal: None,
            next_vertical: None,
        }
    }

    pub fn width(&self) -> i64 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> i64 {
        self.bottom_right.y - self.top_left.y
    }

    /// Find a view by id anywhere in this subtree
    pub fn find(&self, id: ViewId) -> Option<&View> {
        if self.id == id {
            return Some(self);
        }
        if let Some(found) = self.next_horizontal.as_ref().and_then(|v| v.find(id)) {
            return Some(found);
        }
        self.next_vertical.as_ref().and_then(|v| v.find(id))
    }

    pub fn find_mut(&mut self, id: ViewId) -> Option<&mut View> {
        if self.id == id {
            return Some(self);
        }
        if let Some(h) = self.next_horizontal.as_mut() {
            if let Some(found) = h.find_mut(id) {
                return Some(found);
            }
        }
        self.next_vertical.as_mut().and_then(|v| v.find_mut(id))
    }

    /// The view whose rectangle contains `point`, preferring the
    /// horizontal subtree on overlap
    pub fn find_at_point(&self, point: Point) -> Option<&View> {
        if point.x >= self.top_left.x
            && point.x <= self.bottom_right.x
            && point.y >= self.top_left.y
            && point.y <= self.bottom_right.y
        {
            return Some(self);
        }

        if let Some(found) = self
            .next_horizontal
            .as_ref()
            .and_then(|v| v.find_at_point(point))
        {
            return Some(found);
        }
        self.next_vertical
            .as_ref()
            .and_then(|v| v.find_at_point(point))
    }

    /// First view in the subtree showing `buffer`
    pub fn find_buffer(&self, buffer: &BufferHandle) -> Option<&View> {
        if Arc::ptr_eq(&self.buffer, buffer) {
            return Some(self);
        }
        if let Some(found) = self.next_horizontal.as_ref().and_then(|v| v.find_buffer(buffer)) {
            return Some(found);
        }
        self.next_vertical.as_ref().and_then(|v| v.find_buffer(buffer))
    }

    pub fn find_buffer_mut(&mut self, buffer: &BufferHandle) -> Option<&mut View> {
        if Arc::ptr_eq(&self.buffer, buffer) {
            return Some(self);
        }
        if let Some(h) = self.next_horizontal.as_mut() {
            if let Some(found) = h.find_buffer_mut(buffer) {
                return Some(found);
            }
        }
        self.next_vertical
            .as_mut()
            .and_then(|v| v.find_buffer_mut(buffer))
    }

    /// Point every view showing `matchee` at `replacement` instead,
    /// resetting cursor and scroll
    pub fn change_buffer(&mut self, matchee: &BufferHandle, replacement: &BufferHandle) {
        if let Some(h) = self.next_horizontal.as_mut() {
            h.change_buffer(matchee, replacement);
        }
        if let Some(v) = self.next_vertical.as_mut() {
            v.change_buffer(matchee, replacement);
        }

        if Arc::ptr_eq(&self.buffer, matchee) {
            self.buffer = Arc::clone(replacement);
            self.cursor = Point::new(0, 0);
            self.top_row = 0;
            self.left_column = 0;
        }
    }

    /// Visit every view in the subtree
    pub fn for_each(&self, f: &mut impl FnMut(&View)) {
        f(self);
        if let Some(h) = self.next_horizontal.as_ref() {
            h.for_each(f);
        }
        if let Some(v) = self.next_vertical.as_ref() {
            v.for_each(f);
        }
    }

    /// Collect every view id in the subtree
    pub fn ids(&self) -> Vec<ViewId> {
        let mut ids = Vec::new();
        self.for_each(&mut |v| ids.push(v.id));
        ids
    }
}

/// Split below `target` along the chosen axis: the new view attaches at
/// the tail of the axis chain and inherits `buffer`. Returns the new id.
pub fn split_view(
    root: &mut View,
    target: ViewId,
    buffer: BufferHandle,
    horizontal: bool,
    new_id: ViewId,
) -> Option<ViewId> {
    let target = root.find_mut(target)?;

    let new_view = Box::new(View::new(new_id, buffer));

    let mut itr = target;
    if horizontal {
        while itr.next_horizontal.is_some() {
            itr = itr.next_horizontal.as_mut().unwrap();
        }
        itr.next_horizontal = Some(new_view);
    } else {
        while itr.next_vertical.is_some() {
            itr = itr.next_vertical.as_mut().unwrap();
        }
        itr.next_vertical = Some(new_view);
    }

    Some(new_id)
}

/// Detach `target` and rewire its successors so every other view remains
/// reachable. Removing the root promotes its vertical child (appending
/// the horizontal chain to the promoted subtree's deepest horizontal).
pub fn remove_view(head: &mut Option<Box<View>>, target: ViewId) -> bool {
    let Some(head_view) = head.as_mut() else {
        return false;
    };

    if head_view.id == target {
        let mut old = head.take().expect("head checked above");
        let horizontal = old.next_horizontal.take();
        let vertical = old.next_vertical.take();

        *head = match (horizontal, vertical) {
            (Some(h), None) => Some(h),
            (None, Some(v)) => Some(v),
            (Some(h), Some(mut v)) => {
                // vertical becomes the new head; tack the old horizontal
                // chain onto the end of its last horizontal
                let mut itr = &mut *v;
                while itr.next_horizontal.is_some() {
                    itr = itr.next_horizontal.as_mut().unwrap();
                }
                itr.next_horizontal = Some(h);
                Some(v)
            }
            (None, None) => None,
        };
        return true;
    }

    remove_connected_view(head_view, target)
}

fn remove_connected_view(node: &mut View, target: ViewId) -> bool {
    if node.next_vertical.as_ref().map(|v| v.id) == Some(target) {
        let mut view = node.next_vertical.take().expect("checked above");
        let horizontal = view.next_horizontal.take();
        let vertical = view.next_vertical.take();

        node.next_vertical = match (horizontal, vertical) {
            (Some(mut h), Some(v)) => {
                // keep the detached vertical chain reachable by hanging
                // it off the last vertical of the promoted subtree
                let mut itr = &mut *h;
                while itr.next_vertical.is_some() {
                    itr = itr.next_vertical.as_mut().unwrap();
                }
                itr.next_vertical = Some(v);
                Some(h)
            }
            (Some(h), None) => Some(h),
            (None, Some(v)) => Some(v),
            (None, None) => None,
        };
        return true;
    }

    if node.next_horizontal.as_ref().map(|v| v.id) == Some(target) {
        let mut view = node.next_horizontal.take().expect("checked above");
        let horizontal = view.next_horizontal.take();
        let vertical = view.next_vertical.take();

        node.next_horizontal = match (vertical, horizontal) {
            (Some(mut v), Some(h)) => {
                let mut itr = &mut *v;
                while itr.next_horizontal.is_some() {
                    itr = itr.next_horizontal.as_mut().unwrap();
                }
                itr.next_horizontal = Some(h);
                Some(v)
            }
            (Some(v), None) => Some(v),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        };
        return true;
    }

    if let Some(h) = node.next_horizontal.as_mut() {
        if remove_connected_view(h, target) {
            return true;
        }
    }
    if let Some(v) = node.next_vertical.as_mut() {
        if remove_connected_view(v, target) {
            return true;
        }
    }
    false
}

/// Recompute every view rectangle within `[top_left, bottom_right]`
pub fn calc_views(view: &mut View, top_left: Point, bottom_right: Point) {
    calc_horizontal_views(view, top_left, bottom_right, false);
}

fn calc_horizontal_views(
    view: &mut View,
    top_left: Point,
    bottom_right: Point,
    already_calculated: bool,
) {
    let mut view_count = 0i64;
    {
        let mut itr = Some(&*view);
        while let Some(v) = itr {
            view_count += 1;
            itr = v.next_horizontal.as_deref();
        }
    }

    let shift = ((bottom_right.x - top_left.x) + 1) / view_count;
    let mut new_top_left = top_left;
    let mut new_bottom_right = bottom_right;
    new_bottom_right.x = new_top_left.x + (shift - 1);

    let mut itr = Some(view);
    let mut is_first = true;
    while let Some(v) = itr {
        // the first view keeps dimensions computed by the caller when the
        // recursion entered from the opposing axis
        let recurse = ((!already_calculated && is_first) || !is_first) && v.next_vertical.is_some();
        if recurse {
            if v.next_horizontal.is_none() {
                new_bottom_right.x = bottom_right.x;
            }
            calc_vertical_views(v, new_top_left, new_bottom_right, true);
        } else {
            v.top_left = new_top_left;
            v.bottom_right = new_bottom_right;
        }

        new_top_left.x += shift;

        if v.next_horizontal.is_some() {
            new_bottom_right.x = new_top_left.x + (shift - 1);
        } else {
            // the last slot receives the remainder
            v.bottom_right.x = bottom_right.x;
        }

        is_first = false;
        itr = v.next_horizontal.as_deref_mut();
    }
}

fn calc_vertical_views(
    view: &mut View,
    top_left: Point,
    bottom_right: Point,
    already_calculated: bool,
) {
    let mut view_count = 0i64;
    {
        let mut itr = Some(&*view);
        while let Some(v) = itr {
            view_count += 1;
            itr = v.next_vertical.as_deref();
        }
    }

    let shift = ((bottom_right.y - top_left.y) + 1) / view_count;
    let mut new_top_left = top_left;
    let mut new_bottom_right = bottom_right;
    new_bottom_right.y = new_top_left.y + (shift - 1);

    let mut itr = Some(view);
    let mut is_first = true;
    while let Some(v) = itr {
        let recurse =
            ((!already_calculated && is_first) || !is_first) && v.next_horizontal.is_some();
        if recurse {
            if v.next_vertical.is_none() {
                new_bottom_right.y = bottom_right.y;
            }
            calc_horizontal_views(v, new_top_left, new_bottom_right, true);
        } else {
            v.top_left = new_top_left;
            v.bottom_right = new_bottom_right;
        }

        new_top_left.y += shift;

        if v.next_vertical.is_some() {
            new_bottom_right.y = new_top_left.y + (shift - 1);
        } else {
            v.bottom_right.y = bottom_right.y;
        }

        is_first = false;
        itr = v.next_vertical.as_deref_mut();
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
