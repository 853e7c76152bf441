//! GUI application state management.
//!
//! Tracks text inputs, the cached page texture and the notices shown to the
//! user.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use eframe::egui::{Color32, TextureHandle};

use crate::form::{Notifier, Severity};
use crate::guided::GuidedState;

/// How long a notice stays on screen.
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(6);

/// At most this many notices are kept.
const MAX_NOTICES: usize = 5;

/// A toast-style message.
#[derive(Clone, Debug)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub created: Instant,
}

impl Notice {
    pub fn color(&self) -> Color32 {
        severity_color(self.severity)
    }
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::from_rgb(0, 120, 200),
        Severity::Success => Color32::from_rgb(0, 150, 0),
        Severity::Warning => Color32::from_rgb(200, 150, 0),
        Severity::Error => Color32::from_rgb(200, 0, 0),
    }
}

/// Shared notice queue. One clone is handed to the controller as its
/// notifier, the other is read by the GUI.
#[derive(Clone, Default)]
pub struct NoticeBoard {
    notices: Rc<RefCell<VecDeque<Notice>>>,
}

impl NoticeBoard {
    pub fn push(&self, severity: Severity, title: &str, message: &str) {
        let mut notices = self.notices.borrow_mut();
        notices.push_back(Notice {
            severity,
            title: title.to_string(),
            message: message.to_string(),
            created: Instant::now(),
        });
        while notices.len() > MAX_NOTICES {
            notices.pop_front();
        }
    }

    /// Drops notices older than `lifetime`.
    pub fn prune(&self, lifetime: Duration) {
        self.notices
            .borrow_mut()
            .retain(|n| n.created.elapsed() < lifetime);
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices.borrow().iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.borrow().is_empty()
    }
}

impl Notifier for NoticeBoard {
    fn notify(&mut self, severity: Severity, title: &str, message: &str) {
        self.push(severity, title, message);
    }
}

/// Status line for the guided panel.
pub fn guided_status_text(state: &GuidedState, total: usize) -> String {
    match state {
        GuidedState::Idle => "Open a PDF to start".to_string(),
        GuidedState::AwaitingSelection(i) => format!("Field {} of {}: select a region", i + 1, total),
        GuidedState::ResultPending { index, .. } => {
            format!("Field {} of {}: review the text", index + 1, total)
        }
        GuidedState::Complete => "All fields filled".to_string(),
    }
}

/// GUI application state.
pub struct GuiState {
    /// Path typed into the open box.
    pub path_input: String,
    /// Texture of the rendered page and the revision it was built from.
    pub page_texture: Option<(u64, TextureHandle)>,
    /// Last time the selection outline advanced.
    pub last_tick: Instant,
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            path_input: String::new(),
            page_texture: None,
            last_tick: Instant::now(),
        }
    }
}
