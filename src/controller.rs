//! Fill workflow controller.
//!
//! Owns every piece of workflow state (document, selection, guided cursor,
//! staged OCR text, in-flight request) and turns UI events into state
//! transitions. The GUI is a thin layer over this type.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::document::{compute_render_scale, Document, PageStep, Rasterizer, RenderedPage, WheelAccumulator};
use crate::error::FillError;
use crate::form::{
    describe_field, scan_targets, FieldDescriptor, FieldListener, FormState, NoopListener,
    NoopNotifier, Notifier, Severity,
};
use crate::guided::{Advance, FieldSequencer, GuidedState};
use crate::ocr::{normalize, spawn_ocr_worker, CompressionLimits, OcrJob, OcrOutcome, OcrService, OcrWorker};
use crate::selection::{display_to_canvas, DisplayPoint, DisplayRect, SelectionOutcome, SelectionOverlay};

/// How long the form stays in view after a guided confirmation.
pub const REVEAL_DURATION: Duration = Duration::from_millis(900);

/// Field an outstanding OCR request will fill.
#[derive(Clone, Debug)]
enum OcrTarget {
    /// Guided mode: stage for the field at this index.
    Guided { index: usize },
    /// Ad-hoc mode: write straight into this field.
    Field { descriptor: FieldDescriptor },
}

#[derive(Clone, Debug)]
struct InFlight {
    ticket: u64,
    session: u64,
    target: OcrTarget,
}

/// What happened when an OCR result arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OcrEvent {
    /// Guided text staged for confirmation.
    Staged { index: usize },
    /// Ad-hoc field written.
    Filled { field: String },
    /// Recognition or formatting failed; nothing was written.
    Failed(String),
    /// Result no longer has a target (document closed or cursor moved).
    Dropped,
}

/// Which part of the window should be in front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Pdf,
    /// Briefly show a freshly written form field.
    Form { field: String },
}

struct Reveal {
    field: String,
    started: Instant,
}

pub struct Controller<R: Rasterizer> {
    config: AppConfig,
    rasterizer: R,
    form: FormState,
    document: Option<Document>,
    load_error: Option<String>,
    overlay: SelectionOverlay,
    display_size: (f32, f32),
    pixel_ratio: f32,
    wheel: WheelAccumulator,
    sequencer: FieldSequencer,
    focused: Option<FieldDescriptor>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    session: u64,
    reveal: Option<Reveal>,
    reveal_duration: Duration,
    notifier: Box<dyn Notifier>,
    listener: Box<dyn FieldListener>,
    worker: OcrWorker,
}

/// Crops the selection out of the page raster and encodes it for upload.
fn extract_region<R: Rasterizer>(
    rasterizer: &R,
    page: &RenderedPage,
    rect: &DisplayRect,
    display_size: (f32, f32),
    limits: &CompressionLimits,
) -> Result<Vec<u8>> {
    let pixels = display_to_canvas(rect, display_size, page.image.dimensions())?;
    crate::log(&format!(
        "Selection {:.0}x{:.0} display px -> {}x{}+{}+{} raster px",
        rect.width, rect.height, pixels.width, pixels.height, pixels.x, pixels.y
    ));
    let region = rasterizer.crop_region(&page.image, &pixels)?;
    rasterizer.compress(&region, limits)
}

impl<R: Rasterizer> Controller<R> {
    pub fn new(config: AppConfig, rasterizer: R, form: FormState, service: Box<dyn OcrService>) -> Self {
        let overlay = SelectionOverlay::new(config.min_selection_size);
        let wheel = WheelAccumulator::new(config.wheel_threshold);
        Self {
            config,
            rasterizer,
            form,
            document: None,
            load_error: None,
            overlay,
            display_size: (0.0, 0.0),
            pixel_ratio: 1.0,
            wheel,
            sequencer: FieldSequencer::new(),
            focused: None,
            in_flight: None,
            next_ticket: 1,
            session: 0,
            reveal: None,
            reveal_duration: REVEAL_DURATION,
            notifier: Box::new(NoopNotifier),
            listener: Box::new(NoopListener),
            worker: spawn_ocr_worker(service),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn FieldListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_reveal_duration(mut self, duration: Duration) -> Self {
        self.reveal_duration = duration;
        self
    }

    // ---- accessors ----

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn overlay(&self) -> &SelectionOverlay {
        &self.overlay
    }

    pub fn sequencer(&self) -> &FieldSequencer {
        &self.sequencer
    }

    pub fn guided_state(&self) -> &GuidedState {
        self.sequencer.state()
    }

    pub fn staged_text(&self) -> Option<&str> {
        self.sequencer.staged_text()
    }

    pub fn focused_field(&self) -> Option<&FieldDescriptor> {
        self.focused.as_ref()
    }

    pub fn is_ocr_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn is_revealing(&self) -> bool {
        self.reveal
            .as_ref()
            .is_some_and(|r| r.started.elapsed() < self.reveal_duration)
    }

    /// Which view should be in front right now.
    pub fn view(&self) -> View {
        match &self.reveal {
            Some(reveal) if self.is_revealing() => View::Form {
                field: reveal.field.clone(),
            },
            _ => View::Pdf,
        }
    }

    /// True if a drag on the page would start a selection.
    pub fn selection_enabled(&self) -> bool {
        self.document.is_some()
            && self.in_flight.is_none()
            && !self.is_revealing()
            && (self.focused.is_some() || self.sequencer.is_active())
    }

    fn sync_overlay(&mut self) {
        let armed = self.document.is_some()
            && !self.is_revealing()
            && (self.focused.is_some() || self.sequencer.is_active());
        if armed != self.overlay.is_armed() {
            self.overlay.set_armed(armed);
        }
    }

    fn notify(&mut self, severity: Severity, title: &str, message: &str) {
        crate::log(&format!("[{}] {}: {}", severity, title, message));
        self.notifier.notify(severity, title, message);
    }

    /// Records the window's physical pixels per logical pixel. Takes effect
    /// the next time a document is loaded.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if ratio.is_finite() && ratio > 0.0 && ratio != self.pixel_ratio {
            crate::log(&format!("Device pixel ratio: {} -> {}", self.pixel_ratio, ratio));
            self.pixel_ratio = ratio;
        }
    }

    // ---- document lifecycle ----

    /// Loads a PDF and starts a fresh guided sequence.
    pub fn load_document(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), FillError> {
        self.close();

        let page_count = match self.rasterizer.load(bytes) {
            Ok(count) => count,
            Err(e) => return Err(self.fail_load(name, e)),
        };

        let scale = compute_render_scale(
            self.config.device_pixel_ratio.unwrap_or(self.pixel_ratio),
            self.config.render_oversample,
            self.config.max_render_scale,
        );
        let mut document = Document::new(name, page_count, scale);
        if let Err(e) = document.render_current(&mut self.rasterizer) {
            self.rasterizer.unload();
            return Err(self.fail_load(name, e));
        }

        crate::log(&format!("Loaded '{}' ({} pages)", name, page_count));
        self.document = Some(document);

        let targets = scan_targets(self.form.definition());
        crate::log(&format!(
            "Guided fill targets: {}",
            targets
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.sequencer.start(targets);
        crate::log(&format!("Guided state: {}", self.sequencer.state()));
        self.sync_overlay();

        let message = match self.sequencer.current() {
            Some(field) => format!("Select the region containing {}", field.label),
            None => "No fillable fields in this form".to_string(),
        };
        self.notify(Severity::Info, "Document loaded", &message);
        Ok(())
    }

    fn fail_load(&mut self, name: &str, error: anyhow::Error) -> FillError {
        let message = format!("{}: {}", name, error);
        self.load_error = Some(message.clone());
        self.notify(Severity::Error, "PDF Error", &message);
        FillError::DocumentLoad(message)
    }

    /// Tears down the document and all selection/guided state.
    ///
    /// An outstanding OCR request is not cancelled; its result is dropped
    /// when it arrives.
    pub fn close(&mut self) {
        if self.document.is_some() {
            crate::log("Closing document");
        }
        self.rasterizer.unload();
        self.document = None;
        self.load_error = None;
        self.overlay.clear();
        self.wheel.reset();
        self.sequencer.reset();
        self.focused = None;
        self.reveal = None;
        self.session += 1;
        self.sync_overlay();
    }

    // ---- navigation ----

    pub fn next_page(&mut self) -> Result<bool, FillError> {
        self.turn_page(PageStep::Next)
    }

    pub fn previous_page(&mut self) -> Result<bool, FillError> {
        self.turn_page(PageStep::Previous)
    }

    /// Feeds a wheel delta; turns the page once enough has accumulated.
    pub fn wheel(&mut self, delta: f32) -> Result<bool, FillError> {
        if self.document.is_none() {
            return Ok(false);
        }
        match self.wheel.push(delta) {
            Some(step) => self.turn_page(step),
            None => Ok(false),
        }
    }

    fn turn_page(&mut self, step: PageStep) -> Result<bool, FillError> {
        let Some(document) = self.document.as_mut() else {
            return Err(FillError::NoDocument);
        };
        if !document.step(step) {
            return Ok(false);
        }
        if let Err(e) = document.render_current(&mut self.rasterizer) {
            // Stay on the page that is still on screen
            document.step(step.reverse());
            self.wheel.reset();
            let message = e.to_string();
            self.notify(Severity::Error, "PDF Error", &message);
            return Err(FillError::DocumentLoad(message));
        }

        self.wheel.reset();
        self.overlay.clear();
        Ok(true)
    }

    // ---- selection ----

    /// Records the overlay's on-screen size for coordinate mapping.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.display_size = (width, height);
    }

    /// Advances the selection outline animation.
    pub fn tick(&mut self) {
        self.overlay.tick();
    }

    /// Makes `name` the ad-hoc destination (or clears it with `None`).
    pub fn focus_field(&mut self, name: Option<&str>) {
        self.focused = name.and_then(|n| {
            let field = self
                .form
                .definition()
                .fields
                .iter()
                .find(|f| f.name == n || f.hidden_input.as_deref() == Some(n));
            if field.is_none() {
                crate::log(&format!("Focus requested for unknown field '{}'", n));
            }
            field.map(describe_field)
        });
        self.sync_overlay();
    }

    pub fn pointer_down(&mut self, point: DisplayPoint) -> bool {
        self.sync_overlay();
        if self.in_flight.is_some() {
            return false;
        }
        self.overlay.pointer_down(point)
    }

    pub fn pointer_move(&mut self, point: DisplayPoint) {
        self.overlay.pointer_move(point);
    }

    /// Pointer released over the overlay. Returns true if an OCR request was issued.
    pub fn pointer_up(&mut self, point: DisplayPoint) -> Result<bool, FillError> {
        self.finish_selection(point)
    }

    /// Pointer released anywhere in the window; catches drags that end
    /// outside the overlay.
    pub fn document_pointer_up(&mut self, point: DisplayPoint) -> Result<bool, FillError> {
        self.finish_selection(point)
    }

    fn finish_selection(&mut self, point: DisplayPoint) -> Result<bool, FillError> {
        if self.in_flight.is_some() {
            return Ok(false);
        }

        match self.overlay.pointer_up(point) {
            SelectionOutcome::Ignored => Ok(false),
            SelectionOutcome::TooSmall(rect) => {
                crate::log(&format!(
                    "Ignoring {}",
                    FillError::SelectionTooSmall {
                        width: rect.width,
                        height: rect.height
                    }
                ));
                Ok(false)
            }
            SelectionOutcome::Selected(rect) => self.start_extraction(rect),
        }
    }

    fn current_target(&self) -> Option<OcrTarget> {
        if let Some(descriptor) = &self.focused {
            return Some(OcrTarget::Field {
                descriptor: descriptor.clone(),
            });
        }
        self.sequencer
            .state()
            .field_index()
            .map(|index| OcrTarget::Guided { index })
    }

    fn start_extraction(&mut self, rect: DisplayRect) -> Result<bool, FillError> {
        let Some(target) = self.current_target() else {
            self.overlay.clear();
            return Ok(false);
        };
        let Some(page) = self.document.as_ref().and_then(|d| d.rendered()) else {
            self.overlay.clear();
            return Err(FillError::NoDocument);
        };

        let limits = CompressionLimits::from_config(&self.config);
        let image = match extract_region(&self.rasterizer, page, &rect, self.display_size, &limits) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.overlay.clear();
                let message = e.to_string();
                self.notify(Severity::Error, "Extraction Error", &message);
                return Err(FillError::Extraction(message));
            }
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        if self.worker.jobs.send(OcrJob { ticket, image }).is_err() {
            self.overlay.clear();
            let message = "OCR worker is not running".to_string();
            self.notify(Severity::Error, "OCR Error", &message);
            return Err(FillError::Ocr(message));
        }

        self.in_flight = Some(InFlight {
            ticket,
            session: self.session,
            target,
        });
        self.notify(Severity::Info, "Processing", "Reading the selected region...");
        Ok(true)
    }

    // ---- OCR results ----

    /// Applies a finished OCR result, if one is ready. Call once per frame.
    pub fn poll_ocr(&mut self) -> Option<OcrEvent> {
        let outcome = self.worker.outcomes.try_recv().ok()?;
        Some(self.handle_outcome(outcome))
    }

    /// Blocks until the outstanding OCR result arrives or `timeout` passes.
    pub fn wait_for_ocr(&mut self, timeout: Duration) -> Option<OcrEvent> {
        let outcome = self.worker.outcomes.recv_timeout(timeout).ok()?;
        Some(self.handle_outcome(outcome))
    }

    fn handle_outcome(&mut self, outcome: OcrOutcome) -> OcrEvent {
        let Some(in_flight) = self.in_flight.take() else {
            crate::log(&format!("Stray OCR result for ticket {}", outcome.ticket));
            return OcrEvent::Dropped;
        };
        if in_flight.ticket != outcome.ticket {
            crate::log(&format!(
                "OCR ticket mismatch: expected {}, got {}",
                in_flight.ticket, outcome.ticket
            ));
            return OcrEvent::Dropped;
        }

        self.overlay.clear();

        if in_flight.session != self.session {
            crate::log(&format!(
                "Dropping OCR result for ticket {}: document was closed",
                outcome.ticket
            ));
            return OcrEvent::Dropped;
        }

        let event = self.apply_outcome(in_flight.target, outcome);
        self.sync_overlay();
        event
    }

    fn apply_outcome(&mut self, target: OcrTarget, outcome: OcrOutcome) -> OcrEvent {
        let ocr = match outcome.result {
            Ok(ocr) => ocr,
            Err(e) => {
                let message = e.to_string();
                self.notify(Severity::Error, "OCR Error", &message);
                return OcrEvent::Failed(FillError::Ocr(message).to_string());
            }
        };

        let (field_type, label) = match &target {
            OcrTarget::Field { descriptor } => (descriptor.field_type, descriptor.label.clone()),
            OcrTarget::Guided { index } => match self.sequencer.fields().get(*index) {
                Some(field) => (field.field_type, field.label.clone()),
                None => return OcrEvent::Dropped,
            },
        };

        let text = match normalize(&ocr, field_type) {
            Ok(text) => text,
            Err(e) => {
                let message = e.to_string();
                self.notify(Severity::Error, "OCR Error", &message);
                return OcrEvent::Failed(message);
            }
        };

        if text.trim().is_empty() {
            let message = format!("No text found for {}", label);
            self.notify(Severity::Warning, "No text", &message);
            return OcrEvent::Failed(message);
        }

        match target {
            OcrTarget::Guided { index } => {
                if self.sequencer.state().field_index() != Some(index) {
                    crate::log("Guided cursor moved while OCR was running; dropping result");
                    return OcrEvent::Dropped;
                }
                self.sequencer.stage(text);
                crate::log(&format!("Guided state: {}", self.sequencer.state()));
                self.notify(
                    Severity::Success,
                    "Text extracted",
                    &format!("Review the text and click Set {}", label),
                );
                OcrEvent::Staged { index }
            }
            OcrTarget::Field { descriptor } => {
                match self.form.write(&descriptor.target, &text, self.listener.as_mut()) {
                    Ok(()) => {
                        self.focused = None;
                        self.notify(Severity::Success, "Field filled", &format!("Set {}", label));
                        OcrEvent::Filled {
                            field: descriptor.form_field_name,
                        }
                    }
                    Err(e) => {
                        let message = e.to_string();
                        self.notify(Severity::Warning, "Field not found", &message);
                        OcrEvent::Failed(message)
                    }
                }
            }
        }
    }

    // ---- guided confirmation ----

    /// Replaces the staged text with a user edit.
    pub fn edit_staged(&mut self, text: String) -> bool {
        self.sequencer.edit_staged(text)
    }

    /// Writes the staged text into the form and advances the cursor.
    ///
    /// Returns `Ok(None)` when nothing is staged. Rejected while a
    /// re-selection is still being read.
    pub fn confirm(&mut self) -> Result<Option<Advance>, FillError> {
        if self.in_flight.is_some() {
            return Err(FillError::Busy);
        }
        let Some(confirmation) = self.sequencer.confirm() else {
            return Ok(None);
        };
        let field = &confirmation.field;

        match self
            .form
            .write(&field.target, &confirmation.text, self.listener.as_mut())
        {
            Ok(()) => crate::log(&format!(
                "Set {} = {:?}",
                field.form_field_name, confirmation.text
            )),
            Err(e) => {
                let message = e.to_string();
                self.notify(Severity::Warning, "Field not found", &message);
            }
        }

        self.overlay.clear();
        crate::log(&format!("Guided state: {}", self.sequencer.state()));
        match confirmation.advance {
            Advance::Next(_) => {
                self.reveal = Some(Reveal {
                    field: field.form_field_name.clone(),
                    started: Instant::now(),
                });
                let next_label = self
                    .sequencer
                    .current()
                    .map(|f| f.label.clone())
                    .unwrap_or_default();
                self.notify(
                    Severity::Success,
                    &format!("Set {}", field.label),
                    &format!("Next: select the region containing {}", next_label),
                );
            }
            Advance::Complete => {
                self.reveal = None;
                self.notify(
                    Severity::Success,
                    "All fields filled",
                    "Review the form and submit when ready",
                );
            }
        }
        self.sync_overlay();
        Ok(Some(confirmation.advance))
    }
}
