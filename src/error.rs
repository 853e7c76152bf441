//! Failure taxonomy for the fill workflow.
//!
//! Every variant is caught at the controller boundary and turned into a
//! notification; none of them abort the application.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillError {
    /// Malformed or unsupported PDF.
    #[error("Could not load document: {0}")]
    DocumentLoad(String),

    /// Drag rectangle below the minimum size; treated as a click.
    #[error("Selection too small ({width:.0}x{height:.0})")]
    SelectionTooSmall { width: f32, height: f32 },

    /// Cropping or encoding the selected region failed.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Network failure or an error reported by the OCR service.
    #[error("OCR Error: {0}")]
    Ocr(String),

    /// A destination field named by a descriptor does not exist in the form.
    #[error("Form field '{0}' not found")]
    FieldMissing(String),

    /// Another OCR request is still outstanding.
    #[error("OCR already in progress")]
    Busy,

    /// The command needs a loaded document.
    #[error("No document loaded")]
    NoDocument,
}
