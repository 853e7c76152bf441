//! One-field-at-a-time fill sequence.
//!
//! The sequencer owns the ordered target list and the cursor into it. It
//! does not touch the form; the controller applies confirmed text.

use super::state::GuidedState;
use crate::form::FieldDescriptor;

/// Where the cursor went after a confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Complete,
}

/// A confirmed value ready to be written to the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub field: FieldDescriptor,
    pub text: String,
    pub advance: Advance,
}

#[derive(Clone, Debug)]
pub struct FieldSequencer {
    fields: Vec<FieldDescriptor>,
    state: GuidedState,
}

impl Default for FieldSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSequencer {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            state: GuidedState::Idle,
        }
    }

    /// Begins a fresh sequence over `fields`.
    pub fn start(&mut self, fields: Vec<FieldDescriptor>) {
        self.state = if fields.is_empty() {
            GuidedState::Complete
        } else {
            GuidedState::AwaitingSelection(0)
        };
        self.fields = fields;
    }

    pub fn state(&self) -> &GuidedState {
        &self.state
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of confirmed fields.
    pub fn cursor(&self) -> usize {
        match &self.state {
            GuidedState::Idle => 0,
            GuidedState::AwaitingSelection(index) => *index,
            GuidedState::ResultPending { index, .. } => *index,
            GuidedState::Complete => self.fields.len(),
        }
    }

    /// Descriptor under the cursor while the sequence is running.
    pub fn current(&self) -> Option<&FieldDescriptor> {
        self.state.field_index().and_then(|i| self.fields.get(i))
    }

    pub fn is_active(&self) -> bool {
        self.state.accepts_selection()
    }

    /// Stages OCR text for the current field, replacing any staged text.
    /// Returns false when the sequence is not accepting results.
    pub fn stage(&mut self, text: String) -> bool {
        match self.state.field_index() {
            Some(index) => {
                self.state = GuidedState::ResultPending { index, text };
                true
            }
            None => false,
        }
    }

    pub fn staged_text(&self) -> Option<&str> {
        match &self.state {
            GuidedState::ResultPending { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Replaces the staged text with a user edit.
    pub fn edit_staged(&mut self, new_text: String) -> bool {
        match &mut self.state {
            GuidedState::ResultPending { text, .. } => {
                *text = new_text;
                true
            }
            _ => false,
        }
    }

    /// Accepts the staged text and advances the cursor.
    pub fn confirm(&mut self) -> Option<Confirmation> {
        let GuidedState::ResultPending { index, text } = &self.state else {
            return None;
        };
        let index = *index;
        let text = text.clone();
        let field = self.fields.get(index)?.clone();

        let next = index + 1;
        let advance = if next < self.fields.len() {
            self.state = GuidedState::AwaitingSelection(next);
            Advance::Next(next)
        } else {
            self.state = GuidedState::Complete;
            Advance::Complete
        };

        Some(Confirmation { field, text, advance })
    }

    /// Drops the target list and returns to `Idle`.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.state = GuidedState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldType, WriteTarget};

    fn descriptor(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            label: name.to_uppercase(),
            form_field_name: name.to_string(),
            field_type: FieldType::Text,
            target: WriteTarget::Input { field: name.to_string() },
        }
    }

    fn three_fields() -> Vec<FieldDescriptor> {
        vec![descriptor("address"), descriptor("name"), descriptor("email")]
    }

    #[test]
    fn test_start_enters_first_field() {
        let mut seq = FieldSequencer::new();
        assert_eq!(seq.state(), &GuidedState::Idle);
        seq.start(three_fields());
        assert_eq!(seq.state(), &GuidedState::AwaitingSelection(0));
        assert_eq!(seq.current().unwrap().name, "address");
    }

    #[test]
    fn test_start_empty_is_complete() {
        let mut seq = FieldSequencer::new();
        seq.start(Vec::new());
        assert_eq!(seq.state(), &GuidedState::Complete);
        assert_eq!(seq.state().to_string(), "Complete");
        assert!(!seq.is_active());
    }

    #[test]
    fn test_full_sequence() {
        let mut seq = FieldSequencer::new();
        seq.start(three_fields());

        assert!(seq.stage("1 Elm St".into()));
        let c = seq.confirm().unwrap();
        assert_eq!(c.field.name, "address");
        assert_eq!(c.advance, Advance::Next(1));
        assert_eq!(seq.cursor(), 1);
        assert_eq!(seq.state(), &GuidedState::AwaitingSelection(1));

        seq.stage("Pat".into());
        seq.confirm().unwrap();
        assert_eq!(seq.cursor(), 2);

        seq.stage("pat@x.io".into());
        let c = seq.confirm().unwrap();
        assert_eq!(c.advance, Advance::Complete);
        assert_eq!(seq.state(), &GuidedState::Complete);
        assert_eq!(seq.cursor(), 3);
        assert!(!seq.is_active());
    }

    #[test]
    fn test_restage_replaces_without_advancing() {
        let mut seq = FieldSequencer::new();
        seq.start(three_fields());
        seq.stage("first".into());
        seq.stage("second".into());
        assert_eq!(seq.staged_text(), Some("second"));
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn test_confirm_requires_staged_text() {
        let mut seq = FieldSequencer::new();
        seq.start(three_fields());
        assert!(seq.confirm().is_none());
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn test_edit_staged() {
        let mut seq = FieldSequencer::new();
        seq.start(three_fields());
        assert!(!seq.edit_staged("x".into()));
        seq.stage("ocr".into());
        assert!(seq.edit_staged("fixed".into()));
        assert_eq!(seq.confirm().unwrap().text, "fixed");
    }

    #[test]
    fn test_stage_rejected_when_complete_or_idle() {
        let mut seq = FieldSequencer::new();
        assert!(!seq.stage("x".into()));
        seq.start(vec![descriptor("a")]);
        seq.stage("x".into());
        seq.confirm();
        assert!(!seq.stage("y".into()));
    }

    #[test]
    fn test_reset() {
        let mut seq = FieldSequencer::new();
        seq.start(three_fields());
        seq.stage("x".into());
        seq.confirm();
        seq.reset();
        assert_eq!(seq.cursor(), 0);
        assert_eq!(seq.state(), &GuidedState::Idle);
        assert!(seq.fields().is_empty());
    }
}
