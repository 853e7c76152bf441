//! Destination form: definition, live values, fillable-field discovery and
//! host callbacks.

pub mod definition;
pub mod descriptor;
pub mod notify;

pub use definition::{FieldKind, FormDefinition, FormField, FormState};
pub use descriptor::{describe_field, scan_targets, FieldDescriptor, FieldType, WriteTarget};
pub use notify::{FieldEvent, FieldListener, NoopListener, NoopNotifier, Notifier, Severity};
