//! Guided field filling.
//!
//! Walks the fillable fields of the destination form one at a time: the user
//! selects a region, reviews the recognized text and confirms it.

pub mod sequencer;
pub mod state;

pub use sequencer::{Advance, FieldSequencer};
pub use state::GuidedState;
