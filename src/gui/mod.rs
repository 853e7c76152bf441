//! GUI module for the application.
//!
//! Shows the PDF page with the selection overlay next to the destination
//! form, using egui/eframe.

pub mod render;
pub mod state;

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Vec2};

use crate::config::get_config;
use crate::controller::{Controller, View};
use crate::document::PdfiumRasterizer;
use crate::form::{FormDefinition, FormState, Severity};
use crate::ocr::OcrSpaceClient;
use crate::selection::DisplayPoint;

use render::{FormAction, GuidedAction, ToolbarAction};
use state::{GuiState, NoticeBoard, NOTICE_LIFETIME};

/// Frame interval while something animates.
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Main GUI application struct.
pub struct FillerApp {
    controller: Controller<PdfiumRasterizer>,
    notices: NoticeBoard,
    state: GuiState,
}

impl FillerApp {
    pub fn new(
        controller: Controller<PdfiumRasterizer>,
        notices: NoticeBoard,
        initial_pdf: Option<PathBuf>,
        pixel_ratio: f32,
    ) -> Self {
        let mut app = Self {
            controller,
            notices,
            state: GuiState::default(),
        };
        app.controller.set_device_pixel_ratio(pixel_ratio);
        if let Some(path) = initial_pdf {
            app.state.path_input = path.display().to_string();
            app.open_path(&path);
        }
        app
    }

    fn open_path(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read(path) {
            Ok(bytes) => self.open_bytes(&name, bytes),
            Err(e) => {
                let message = format!("Failed to read {}: {}", path.display(), e);
                crate::log(&format!("GUI: {}", message));
                self.notices.push(Severity::Error, "PDF Error", &message);
            }
        }
    }

    fn open_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        self.state.page_texture = None;
        if let Err(e) = self.controller.load_document(name, bytes) {
            crate::log(&format!("GUI: {}", e));
        }
    }

    /// Opens the first PDF dropped on the window.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(bytes) = file.bytes {
            let name = if file.name.is_empty() { "dropped.pdf".to_string() } else { file.name };
            self.open_bytes(&name, bytes.to_vec());
        } else if let Some(path) = file.path {
            self.state.path_input = path.display().to_string();
            self.open_path(&path);
        }
    }

    /// Rebuilds the page texture when a new page has been rendered.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let Some(page) = self.controller.document().and_then(|d| d.rendered()) else {
            self.state.page_texture = None;
            return;
        };
        if matches!(&self.state.page_texture, Some((revision, _)) if *revision == page.revision) {
            return;
        }

        let size = [page.image.width() as usize, page.image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, page.image.as_raw());
        let texture = ctx.load_texture("pdf_page", color_image, egui::TextureOptions::LINEAR);
        self.state.page_texture = Some((page.revision, texture));
    }

    fn apply_toolbar(&mut self, action: ToolbarAction) {
        let result = match action {
            ToolbarAction::Open => {
                let path = PathBuf::from(self.state.path_input.trim());
                self.open_path(&path);
                Ok(true)
            }
            ToolbarAction::Close => {
                self.controller.close();
                self.state.page_texture = None;
                Ok(true)
            }
            ToolbarAction::PreviousPage => self.controller.previous_page(),
            ToolbarAction::NextPage => self.controller.next_page(),
        };
        if let Err(e) = result {
            crate::log(&format!("GUI: {}", e));
        }
    }

    fn apply_guided(&mut self, action: GuidedAction) {
        match action {
            GuidedAction::Confirm => match self.controller.confirm() {
                Ok(Some(advance)) => crate::log(&format!("GUI: confirmed, {:?}", advance)),
                Ok(None) => {}
                Err(e) => {
                    crate::log(&format!("GUI: {}", e));
                    self.notices.push(Severity::Warning, "Please wait", &e.to_string());
                }
            },
            GuidedAction::EditStaged(text) => {
                self.controller.edit_staged(text);
            }
            GuidedAction::ClearFocus => self.controller.focus_field(None),
        }
    }

    fn apply_form(&mut self, actions: Vec<FormAction>) {
        for action in actions {
            match action {
                FormAction::Focus(name) => self.controller.focus_field(Some(&name)),
                FormAction::Edit { name, value } => self.controller.form_mut().set_value(&name, value),
            }
        }
    }

    /// Draws the page and feeds pointer and wheel input to the controller.
    fn render_document(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let texture = self.state.page_texture.as_ref().map(|(_, t)| t.clone());
        let (Some(texture), Some(page)) = (texture, self.controller.document().and_then(|d| d.rendered()))
        else {
            ui.centered_and_justified(|ui| match self.controller.load_error() {
                Some(error) => ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(200, 0, 0))),
                None => ui.label("Drop a PDF here or enter its path above"),
            });
            return;
        };

        // Fit to width, then shrink if the page would overflow vertically
        let available = ui.available_size();
        let (mut width, mut height) = page.display_size(available.x);
        if height > available.y && height > 0.0 {
            (width, height) = page.display_size(available.x * available.y / height);
        }
        self.controller.set_display_size(width, height);

        let response = render::render_page(
            ui,
            &texture,
            Vec2::new(width, height),
            self.controller.overlay(),
            self.controller.selection_enabled(),
        );
        let rect = response.rect;
        let to_local = |pos: egui::Pos2| {
            let pos = pos.clamp(rect.min, rect.max);
            DisplayPoint::new(pos.x - rect.min.x, pos.y - rect.min.y)
        };

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.controller.pointer_down(to_local(pos));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.controller.pointer_move(to_local(pos));
            }
        }

        let released_pos = ctx.input(|i| i.pointer.interact_pos().or(i.pointer.latest_pos()));
        let result = if response.drag_stopped() {
            response
                .interact_pointer_pos()
                .or(released_pos)
                .map(|pos| self.controller.pointer_up(to_local(pos)))
        } else if self.controller.overlay().is_dragging() && ctx.input(|i| i.pointer.any_released()) {
            released_pos.map(|pos| self.controller.document_pointer_up(to_local(pos)))
        } else {
            None
        };
        match result {
            Some(Ok(true)) => crate::log("GUI: selection sent for OCR"),
            Some(Err(e)) => crate::log(&format!("GUI: {}", e)),
            _ => {}
        }

        if response.hovered() {
            // egui reports wheel-down as negative
            let delta = ctx.input(|i| i.raw_scroll_delta.y);
            if delta != 0.0 {
                if let Err(e) = self.controller.wheel(-delta) {
                    crate::log(&format!("GUI: {}", e));
                }
            }
        }
    }
}

impl eframe::App for FillerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.set_device_pixel_ratio(ctx.pixels_per_point());
        self.handle_dropped_files(ctx);

        while let Some(event) = self.controller.poll_ocr() {
            crate::log(&format!("GUI: OCR event {:?}", event));
        }

        if self.controller.overlay().rect().is_some() && self.state.last_tick.elapsed() >= FRAME_INTERVAL {
            self.controller.tick();
            self.state.last_tick = Instant::now();
        }

        self.notices.prune(NOTICE_LIFETIME);
        self.refresh_texture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            if let Some(action) = render::render_toolbar(ui, &mut self.state, self.controller.document()) {
                self.apply_toolbar(action);
            }
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("notices").show(ctx, |ui| {
            render::render_notices(ui, &self.notices.snapshot());
        });

        let view = self.controller.view();

        egui::SidePanel::right("form_panel")
            .default_width(340.0)
            .show(ctx, |ui| {
                if let Some(action) = render::render_guided_panel(ui, &self.controller) {
                    self.apply_guided(action);
                }
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let focused = self.controller.focused_field().map(|f| f.form_field_name.clone());
                    let actions = render::render_form(ui, self.controller.form(), focused.as_deref(), None);
                    self.apply_form(actions);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| match &view {
            View::Form { field } => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let actions = render::render_form(ui, self.controller.form(), None, Some(field.as_str()));
                    self.apply_form(actions);
                });
            }
            View::Pdf => self.render_document(ctx, ui),
        });

        let animating = self.controller.is_ocr_in_flight()
            || self.controller.overlay().rect().is_some()
            || view != View::Pdf
            || !self.notices.is_empty();
        if animating {
            ctx.request_repaint_after(FRAME_INTERVAL);
        }
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui(initial_pdf: Option<PathBuf>) -> Result<()> {
    let config = get_config().clone();

    let definition = FormDefinition::load_or_builtin(config.form_path.as_deref())?;
    crate::log(&format!(
        "GUI: Form '{}' with {} fields",
        definition.title,
        definition.fields.len()
    ));

    let rasterizer = PdfiumRasterizer::new()?;
    let service = OcrSpaceClient::new(&config)?;
    let notices = NoticeBoard::default();
    let controller = Controller::new(config, rasterizer, FormState::new(definition), Box::new(service))
        .with_notifier(Box::new(notices.clone()));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(1280.0, 860.0))
            .with_min_inner_size(Vec2::new(800.0, 600.0))
            .with_title("Scrap Fill")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    crate::log("GUI: Calling eframe::run_native...");

    eframe::run_native(
        "Scrap Fill",
        options,
        Box::new(move |cc| {
            crate::log("GUI: Creating FillerApp instance...");
            let pixel_ratio = cc
                .egui_ctx
                .native_pixels_per_point()
                .unwrap_or_else(|| cc.egui_ctx.pixels_per_point());
            Ok(Box::new(FillerApp::new(controller, notices, initial_pdf, pixel_ratio)))
        }),
    )
    .map_err(|e| anyhow!("GUI error: {}", e))
}
