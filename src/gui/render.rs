//! GUI rendering functions.
//!
//! Layout code only. Each function reports what the user did and the caller
//! applies it to the controller.

use eframe::egui::{self, Color32, Pos2, RichText, Stroke, TextureHandle, Vec2};

use super::state::{guided_status_text, severity_color, GuiState, Notice};
use crate::controller::Controller;
use crate::document::{Document, Rasterizer};
use crate::form::{FieldKind, FormField, FormState, Severity};
use crate::guided::GuidedState;
use crate::selection::{SelectionOverlay, DASH_LENGTH, GAP_LENGTH};

const HIGHLIGHT: Color32 = Color32::from_rgb(0, 120, 200);
const SELECTION_FILL: Color32 = Color32::from_rgba_premultiplied(0, 60, 120, 40);

/// Toolbar buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    Open,
    Close,
    PreviousPage,
    NextPage,
}

/// Guided panel buttons and edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuidedAction {
    Confirm,
    EditStaged(String),
    ClearFocus,
}

/// Form panel interactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormAction {
    /// Make this field the destination of the next selection.
    Focus(String),
    Edit { name: String, value: String },
}

/// Render the open box, close button and page navigation.
pub fn render_toolbar(
    ui: &mut egui::Ui,
    state: &mut GuiState,
    document: Option<&Document>,
) -> Option<ToolbarAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.label("PDF:");
        let input = ui.add(
            egui::TextEdit::singleline(&mut state.path_input)
                .hint_text("Path to a PDF, or drop one on the window")
                .desired_width(320.0),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let can_open = !state.path_input.trim().is_empty();
        ui.add_enabled_ui(can_open, |ui| {
            if ui.button("📂 Open").clicked() || (submitted && can_open) {
                action = Some(ToolbarAction::Open);
            }
        });

        ui.add_enabled_ui(document.is_some(), |ui| {
            if ui.button("✕ Close").clicked() {
                action = Some(ToolbarAction::Close);
            }
        });

        let Some(document) = document else {
            return;
        };

        ui.separator();
        ui.label(RichText::new(&document.name).strong());

        if document.has_multiple_pages() {
            ui.add_space(12.0);
            ui.add_enabled_ui(document.current_page() > 1, |ui| {
                if ui.button("◀").clicked() {
                    action = Some(ToolbarAction::PreviousPage);
                }
            });
            ui.label(format!("Page {} / {}", document.current_page(), document.page_count()));
            ui.add_enabled_ui(document.current_page() < document.page_count(), |ui| {
                if ui.button("▶").clicked() {
                    action = Some(ToolbarAction::NextPage);
                }
            });
        }
    });

    action
}

/// Render the guided-fill status, staged text and confirm button.
pub fn render_guided_panel<R: Rasterizer>(
    ui: &mut egui::Ui,
    controller: &Controller<R>,
) -> Option<GuidedAction> {
    let mut action = None;
    let sequencer = controller.sequencer();

    ui.heading("Guided fill");
    ui.label(guided_status_text(sequencer.state(), sequencer.fields().len()));
    ui.add_space(8.0);

    if let Some(field) = controller.focused_field() {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Filling {}: select a region", field.label)).color(HIGHLIGHT));
            if ui.small_button("Cancel").clicked() {
                action = Some(GuidedAction::ClearFocus);
            }
        });
        ui.add_space(8.0);
    }

    if controller.is_ocr_in_flight() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Reading the selected region...");
        });
        ui.add_space(8.0);
    }

    match sequencer.state() {
        GuidedState::AwaitingSelection(_) => {
            if let Some(field) = sequencer.current() {
                ui.label(format!("Drag a box around the {} on the page.", field.label));
            }
        }
        GuidedState::ResultPending { text, .. } => {
            let Some(field) = sequencer.current() else {
                return action;
            };
            ui.label(RichText::new(&field.label).strong());

            let mut edited = text.clone();
            let editor = if field.field_type.is_multiline() {
                egui::TextEdit::multiline(&mut edited).desired_rows(4)
            } else {
                egui::TextEdit::singleline(&mut edited)
            };
            if ui.add(editor.desired_width(f32::INFINITY)).changed() {
                action = Some(GuidedAction::EditStaged(edited));
            }

            ui.add_space(4.0);
            ui.label(RichText::new("Select again to replace the text.").small().weak());
            ui.add_space(4.0);
            if ui.button(RichText::new(format!("Set {}", field.label)).size(16.0)).clicked() {
                action = Some(GuidedAction::Confirm);
            }
        }
        GuidedState::Complete => {
            ui.label(RichText::new("✔ Every field has been filled.").color(severity_color(Severity::Success)));
        }
        GuidedState::Idle => {}
    }

    action
}

fn matches_field(field: &FormField, name: Option<&str>) -> bool {
    name.is_some_and(|n| field.name == n || field.hidden_input.as_deref() == Some(n))
}

/// Render every form field. `highlight` marks a field that was just written,
/// `focused` the current ad-hoc destination.
pub fn render_form(
    ui: &mut egui::Ui,
    form: &FormState,
    focused: Option<&str>,
    highlight: Option<&str>,
) -> Vec<FormAction> {
    let mut actions = Vec::new();
    let definition = form.definition();

    if !definition.title.is_empty() {
        ui.heading(&definition.title);
        ui.add_space(8.0);
    }

    for field in &definition.fields {
        let stroke = if matches_field(field, highlight) {
            Stroke::new(2.0, severity_color(Severity::Success))
        } else if matches_field(field, focused) {
            Stroke::new(2.0, HIGHLIGHT)
        } else {
            Stroke::NONE
        };

        egui::Frame::none()
            .stroke(stroke)
            .inner_margin(4.0)
            .rounding(4.0)
            .show(ui, |ui| {
                ui.label(&field.label);
                match field.kind {
                    FieldKind::Button => {
                        let caption = form
                            .button_label(&field.name)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("Select {}", field.label));
                        if ui.button(caption).clicked() {
                            actions.push(FormAction::Focus(field.name.clone()));
                        }
                    }
                    FieldKind::Input | FieldKind::Textarea => {
                        let mut value = form.value(&field.name).to_string();
                        let editor = if field.kind == FieldKind::Textarea {
                            egui::TextEdit::multiline(&mut value).desired_rows(3)
                        } else {
                            egui::TextEdit::singleline(&mut value)
                        };
                        let response = ui.add(editor.desired_width(f32::INFINITY));
                        if response.gained_focus() {
                            actions.push(FormAction::Focus(field.name.clone()));
                        }
                        if response.changed() {
                            actions.push(FormAction::Edit {
                                name: field.name.clone(),
                                value,
                            });
                        }
                    }
                }
            });
        ui.add_space(4.0);
    }

    actions
}

/// Paint the page raster and the selection outline.
///
/// Returns the page response; drag and hover are sensed on it.
pub fn render_page(
    ui: &mut egui::Ui,
    texture: &TextureHandle,
    size: Vec2,
    overlay: &SelectionOverlay,
    selection_enabled: bool,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());
    let painter = ui.painter_at(rect);

    painter.image(
        texture.id(),
        rect,
        egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    if let Some(selection) = overlay.rect() {
        let origin = rect.min.to_vec2();
        let outline: Vec<Pos2> = selection
            .outline()
            .iter()
            .map(|p| Pos2::new(p.x, p.y) + origin)
            .collect();

        painter.rect_filled(
            egui::Rect::from_two_pos(outline[0], outline[2]),
            0.0,
            SELECTION_FILL,
        );
        painter.extend(egui::Shape::dashed_line_with_offset(
            &outline,
            Stroke::new(1.5, HIGHLIGHT),
            &[DASH_LENGTH],
            &[GAP_LENGTH],
            overlay.dash_offset(),
        ));
    }

    if selection_enabled {
        response.on_hover_cursor(egui::CursorIcon::Crosshair)
    } else {
        response
    }
}

/// Render the most recent notices, newest first.
pub fn render_notices(ui: &mut egui::Ui, notices: &[Notice]) {
    for notice in notices.iter().rev() {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&notice.title).strong().color(notice.color()));
            if !notice.message.is_empty() {
                ui.label(&notice.message);
            }
        });
    }
}
