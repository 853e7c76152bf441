//! Callbacks the workflow uses to talk to its host.

use std::fmt;

/// Notification severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// User-facing notification surface.
pub trait Notifier {
    fn notify(&mut self, severity: Severity, title: &str, message: &str);
}

/// Notifier that drops everything.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&mut self, _severity: Severity, _title: &str, _message: &str) {}
}

/// Kind of change event emitted after a programmatic write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldEvent {
    Input,
    Change,
}

/// Observer for programmatic form writes (validation, derived fields, ...).
pub trait FieldListener {
    fn field_changed(&mut self, field: &str, event: FieldEvent, value: &str);
}

/// Listener that ignores all events.
#[derive(Debug, Default)]
pub struct NoopListener;

impl FieldListener for NoopListener {
    fn field_changed(&mut self, _field: &str, _event: FieldEvent, _value: &str) {}
}
