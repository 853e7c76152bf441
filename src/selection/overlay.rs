//! Drag-to-select overlay state.
//!
//! Tracks a single drag rectangle over the rendered page and the animated
//! dash offset used to draw it.

use super::coords::{DisplayPoint, DisplayRect};

/// Dash length of the selection outline (display px).
pub const DASH_LENGTH: f32 = 6.0;
/// Gap length of the selection outline (display px).
pub const GAP_LENGTH: f32 = 4.0;

/// Result of releasing the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionOutcome {
    /// No drag was in progress (stray or duplicate release).
    Ignored,
    /// Drag smaller than the minimum size in at least one axis.
    TooSmall(DisplayRect),
    /// A usable region.
    Selected(DisplayRect),
}

/// Pointer-driven selection rectangle.
#[derive(Clone, Debug)]
pub struct SelectionOverlay {
    armed: bool,
    min_size: f32,
    start: Option<DisplayPoint>,
    current: Option<DisplayPoint>,
    dragging: bool,
    dash_offset: f32,
}

impl SelectionOverlay {
    pub fn new(min_size: f32) -> Self {
        Self {
            armed: false,
            min_size,
            start: None,
            current: None,
            dragging: false,
            dash_offset: 0.0,
        }
    }

    /// Enables or disables pointer capture. Disarming drops any drag.
    pub fn set_armed(&mut self, armed: bool) {
        if !armed {
            self.clear();
        }
        self.armed = armed;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Starts a drag. Returns false if the overlay is not armed.
    pub fn pointer_down(&mut self, point: DisplayPoint) -> bool {
        if !self.armed {
            return false;
        }
        self.start = Some(point);
        self.current = Some(point);
        self.dragging = true;
        true
    }

    /// Updates the moving corner while a drag is in progress.
    pub fn pointer_move(&mut self, point: DisplayPoint) {
        if self.dragging {
            self.current = Some(point);
        }
    }

    /// Finalizes the drag.
    pub fn pointer_up(&mut self, point: DisplayPoint) -> SelectionOutcome {
        if !self.dragging {
            return SelectionOutcome::Ignored;
        }
        self.dragging = false;
        self.current = Some(point);

        let Some(rect) = self.rect() else {
            return SelectionOutcome::Ignored;
        };

        if rect.width < self.min_size || rect.height < self.min_size {
            self.clear();
            return SelectionOutcome::TooSmall(rect);
        }
        SelectionOutcome::Selected(rect)
    }

    /// The rectangle currently drawn, if any.
    pub fn rect(&self) -> Option<DisplayRect> {
        match (self.start, self.current) {
            (Some(a), Some(b)) => Some(DisplayRect::from_corners(a, b)),
            _ => None,
        }
    }

    /// Advances the marching-ants animation by one frame.
    pub fn tick(&mut self) {
        self.dash_offset = (self.dash_offset + 1.0) % (DASH_LENGTH + GAP_LENGTH);
    }

    pub fn dash_offset(&self) -> f32 {
        self.dash_offset
    }

    /// Forgets the rectangle and any drag in progress.
    pub fn clear(&mut self) {
        self.start = None;
        self.current = None;
        self.dragging = false;
    }
}
