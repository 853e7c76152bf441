//! Region selection over the rendered page.
//!
//! Provides the drag overlay and display-to-raster coordinate mapping.

pub mod coords;
pub mod overlay;

pub use coords::{display_to_canvas, DisplayPoint, DisplayRect, PixelRect};
pub use overlay::{SelectionOutcome, SelectionOverlay, DASH_LENGTH, GAP_LENGTH};
