//! Tabbed workspaces
//!
//! A tab owns one view tree plus the focus bookkeeping around it: which
//! view is current, which was previous, where focus returns after the
//! prompt view closes, and which view (if any) is "overrideable" --
//! a designated split that transient buffers (buffer list, terminal)
//! may displace and later restore.

use std::sync::Arc;

use crate::buffer::BufferHandle;
use crate::point::Point;
use crate::view::{View, ViewId};

/// Saved state of a displaced overrideable view
struct OverrideSave {
    buffer: BufferHandle,
    cursor: Point,
    top_row: i64,
    left_column: i64,
}

/// One workspace: a view tree and its focus state
pub struct Tab {
    pub view_head: Option<Box<View>>,
    pub view_current: ViewId,
    pub view_previous: Option<ViewId>,
    /// Focus to restore when the prompt view closes
    pub view_input_save: Option<ViewId>,
    pub view_overrideable: Option<ViewId>,
    overridden: Option<OverrideSave>,
}

impl Tab {
    /// A fresh tab owning a single leaf view on `buffer`
    pub fn new(view_id: ViewId, buffer: BufferHandle) -> Self {
        let view = View::new(view_id, buffer);
        Tab {
            view_head: Some(Box::new(view)),
            view_current: view_id,
            view_previous: None,
            view_input_save: None,
            view_overrideable: None,
            overridden: None,
        }
    }

    pub fn current_view(&self) -> Option<&View> {
        self.view_head.as_ref()?.find(self.view_current)
    }

    pub fn current_view_mut(&mut self) -> Option<&mut View> {
        self.view_head.as_mut()?.find_mut(self.view_current)
    }

    /// Move focus, remembering the old current view
    pub fn focus(&mut self, id: ViewId) {
        if id != self.view_current {
            self.view_previous = Some(self.view_current);
            self.view_current = id;
        }
    }

    /// Displace the overrideable view's buffer with `transient`,
    /// remembering what was there
    pub fn save_overrideable(&mut self, transient: BufferHandle) -> bool {
        let Some(id) = self.view_overrideable else {
            return false;
        };
        let Some(view) = self.view_head.as_mut().and_then(|h| h.find_mut(id)) else {
            return false;
        };

        self.overridden = Some(OverrideSave {
            buffer: Arc::clone(&view.buffer),
            cursor: view.cursor,
            top_row: view.top_row,
            left_column: view.left_column,
        });

        view.buffer = transient;
        view.cursor = Point::new(0, 0);
        view.top_row = 0;
        view.left_column = 0;
        true
    }

    /// Swap the displaced buffer back, cursor and scroll intact
    pub fn restore_overrideable(&mut self) -> bool {
        let Some(save) = self.overridden.take() else {
            return false;
        };
        let Some(id) = self.view_overrideable else {
            return false;
        };
        let Some(view) = self.view_head.as_mut().and_then(|h| h.find_mut(id)) else {
            return false;
        };

        view.buffer = save.buffer;
        view.cursor = save.cursor;
        view.top_row = save.top_row;
        view.left_column = save.left_column;
        true
    }

    pub fn has_override(&self) -> bool {
        self.overridden.is_some()
    }
}
