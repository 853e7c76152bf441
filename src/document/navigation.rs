//! Page navigation helpers.

/// Direction of a page change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStep {
    Next,
    Previous,
}

impl PageStep {
    pub fn reverse(self) -> PageStep {
        match self {
            PageStep::Next => PageStep::Previous,
            PageStep::Previous => PageStep::Next,
        }
    }
}

/// Debounces wheel gestures into page turns.
///
/// Deltas in the same direction accumulate; once the magnitude exceeds the
/// threshold a page step is emitted and the counter resets. Reversing
/// direction starts over from zero instead of cancelling out.
#[derive(Clone, Debug)]
pub struct WheelAccumulator {
    threshold: f32,
    accumulated: f32,
}

impl WheelAccumulator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            accumulated: 0.0,
        }
    }

    /// Feeds one wheel delta (positive = towards the end of the document).
    pub fn push(&mut self, delta: f32) -> Option<PageStep> {
        if delta == 0.0 || !delta.is_finite() {
            return None;
        }

        if self.accumulated != 0.0 && self.accumulated.signum() != delta.signum() {
            self.accumulated = 0.0;
        }
        self.accumulated += delta;

        if self.accumulated.abs() > self.threshold {
            let step = if self.accumulated > 0.0 {
                PageStep::Next
            } else {
                PageStep::Previous
            };
            self.accumulated = 0.0;
            return Some(step);
        }
        None
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }
}
