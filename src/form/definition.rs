//! Destination form model.
//!
//! A form is described in JSON (a default project-intake form is embedded)
//! and its live values are kept in `FormState`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::descriptor::WriteTarget;
use super::notify::{FieldEvent, FieldListener};
use crate::error::FillError;

const DEFAULT_FORM: &str = include_str!("../../resources/default_form.json");

/// Element kind of a form field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Input,
    Textarea,
    /// Button-style control; its value lives in `hidden_input`.
    Button,
}

/// One field of the destination form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// HTML-style input type (`text`, `email`, `tel`, `date`, `number`)
    #[serde(default)]
    pub input_type: Option<String>,
    /// Marker that makes the field a guided-fill target
    #[serde(default)]
    pub scrap: Option<String>,
    /// Hidden input backing a button-style control
    #[serde(default)]
    pub hidden_input: Option<String>,
}

/// A complete form definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub title: String,
    pub fields: Vec<FormField>,
}

impl FormDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: FormDefinition =
            serde_json::from_str(json).map_err(|e| anyhow!("Invalid form definition: {}", e))?;
        if definition.fields.is_empty() {
            return Err(anyhow!("Form definition has no fields"));
        }
        Ok(definition)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read form definition {}: {}", path.display(), e))?;
        Self::from_json(&contents)
    }

    /// The embedded project-intake form.
    pub fn builtin() -> Result<Self> {
        Self::from_json(DEFAULT_FORM)
    }

    /// Loads `path` if given, falling back to the embedded form on error.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            match Self::load(path) {
                Ok(definition) => {
                    crate::log(&format!("Form definition loaded from {}", path.display()));
                    return Ok(definition);
                }
                Err(e) => crate::log(&format!("{}. Using built-in form.", e)),
            }
        }
        Self::builtin()
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True if `name` is a field or the hidden input of a button field.
    pub fn holds_value(&self, name: &str) -> bool {
        self.fields.iter().any(|f| {
            (f.name == name && f.kind != FieldKind::Button) || f.hidden_input.as_deref() == Some(name)
        })
    }
}

/// Live form values.
#[derive(Clone, Debug)]
pub struct FormState {
    definition: FormDefinition,
    values: HashMap<String, String>,
    button_labels: HashMap<String, String>,
}

impl FormState {
    pub fn new(definition: FormDefinition) -> Self {
        Self {
            definition,
            values: HashMap::new(),
            button_labels: HashMap::new(),
        }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    /// Value of a field or hidden input (empty if never set).
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Text shown on a button-style control.
    pub fn button_label(&self, name: &str) -> Option<&str> {
        self.button_labels.get(name).map(String::as_str)
    }

    /// User edit; no events are emitted.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Programmatic write through a descriptor target.
    ///
    /// Emits `Input` then `Change` for the value holder so listeners observe
    /// the update like a user edit.
    pub fn write(
        &mut self,
        target: &WriteTarget,
        value: &str,
        listener: &mut dyn FieldListener,
    ) -> Result<(), FillError> {
        match target {
            WriteTarget::Input { field } => {
                if !self.definition.holds_value(field) {
                    return Err(FillError::FieldMissing(field.clone()));
                }
                self.values.insert(field.clone(), value.to_string());
            }
            WriteTarget::ButtonBacked { button, hidden_input } => {
                if !self.definition.holds_value(hidden_input) {
                    return Err(FillError::FieldMissing(hidden_input.clone()));
                }
                if self.definition.field(button).is_none() {
                    return Err(FillError::FieldMissing(button.clone()));
                }
                self.values.insert(hidden_input.clone(), value.to_string());
                self.button_labels.insert(button.clone(), value.to_string());
            }
        }

        let holder = target.value_holder();
        listener.field_changed(holder, FieldEvent::Input, value);
        listener.field_changed(holder, FieldEvent::Change, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::descriptor::{scan_targets, FieldType};

    #[derive(Default)]
    struct Recorder {
        events: Vec<(String, FieldEvent, String)>,
    }

    impl FieldListener for Recorder {
        fn field_changed(&mut self, field: &str, event: FieldEvent, value: &str) {
            self.events.push((field.to_string(), event, value.to_string()));
        }
    }

    #[test]
    fn test_builtin_form_parses() {
        let definition = FormDefinition::builtin().unwrap();
        let targets = scan_targets(&definition);
        assert!(targets.len() >= 3);
        assert_eq!(targets[0].field_type, FieldType::Address);
        assert!(targets.iter().any(|t| t.field_type == FieldType::Email));
        assert!(targets.iter().any(|t| t.field_type == FieldType::TextArea));
    }

    #[test]
    fn test_from_json_rejects_empty() {
        assert!(FormDefinition::from_json(r#"{ "fields": [] }"#).is_err());
        assert!(FormDefinition::from_json("nope").is_err());
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("form.json");
        let definition = FormDefinition::load_or_builtin(Some(&missing)).unwrap();
        assert_eq!(definition, FormDefinition::builtin().unwrap());
    }

    #[test]
    fn test_load_custom_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");
        fs::write(
            &path,
            r#"{ "title": "T", "fields": [ { "name": "po", "label": "PO", "scrap": "po" } ] }"#,
        )
        .unwrap();
        let definition = FormDefinition::load(&path).unwrap();
        assert_eq!(definition.fields[0].kind, FieldKind::Input);
    }

    #[test]
    fn test_write_input_emits_events() {
        let definition = FormDefinition::from_json(
            r#"{ "fields": [ { "name": "email", "label": "Email", "input_type": "email" } ] }"#,
        )
        .unwrap();
        let mut form = FormState::new(definition);
        let mut recorder = Recorder::default();

        form.write(&WriteTarget::Input { field: "email".into() }, "a@b.co", &mut recorder)
            .unwrap();

        assert_eq!(form.value("email"), "a@b.co");
        assert_eq!(
            recorder.events,
            vec![
                ("email".to_string(), FieldEvent::Input, "a@b.co".to_string()),
                ("email".to_string(), FieldEvent::Change, "a@b.co".to_string()),
            ]
        );
    }

    #[test]
    fn test_write_button_backed_updates_label_and_hidden_input() {
        let definition = FormDefinition::from_json(
            r#"{ "fields": [ { "name": "address_button", "label": "Address", "kind": "button", "hidden_input": "address", "scrap": "address" } ] }"#,
        )
        .unwrap();
        let mut form = FormState::new(definition);
        let mut recorder = Recorder::default();
        let target = WriteTarget::ButtonBacked {
            button: "address_button".into(),
            hidden_input: "address".into(),
        };

        form.write(&target, "9 Oak Rd", &mut recorder).unwrap();

        assert_eq!(form.value("address"), "9 Oak Rd");
        assert_eq!(form.button_label("address_button"), Some("9 Oak Rd"));
        assert_eq!(recorder.events.len(), 2);
        assert_eq!(recorder.events[0].0, "address");
    }

    #[test]
    fn test_write_missing_field() {
        let mut form = FormState::new(FormDefinition::builtin().unwrap());
        let err = form
            .write(&WriteTarget::Input { field: "nope".into() }, "x", &mut crate::form::NoopListener)
            .unwrap_err();
        assert!(matches!(err, FillError::FieldMissing(name) if name == "nope"));
    }
}
