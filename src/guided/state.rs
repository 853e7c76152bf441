//! Guided fill state tracking.

/// States of the guided field sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuidedState {
    /// No document loaded.
    Idle,
    /// Waiting for the user to select the region for field `index`.
    AwaitingSelection(usize),
    /// OCR text staged for field `index`, waiting for confirmation.
    ResultPending { index: usize, text: String },
    /// Every field has been confirmed.
    Complete,
}

impl GuidedState {
    /// True while the sequence wants region selections.
    pub fn accepts_selection(&self) -> bool {
        matches!(
            self,
            GuidedState::AwaitingSelection(_) | GuidedState::ResultPending { .. }
        )
    }

    /// Index of the field under the cursor, if the sequence is running.
    pub fn field_index(&self) -> Option<usize> {
        match self {
            GuidedState::AwaitingSelection(index) => Some(*index),
            GuidedState::ResultPending { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl std::fmt::Display for GuidedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidedState::Idle => write!(f, "Idle"),
            GuidedState::AwaitingSelection(i) => write!(f, "Awaiting selection ({})", i + 1),
            GuidedState::ResultPending { index, .. } => write!(f, "Result pending ({})", index + 1),
            GuidedState::Complete => write!(f, "Complete"),
        }
    }
}
