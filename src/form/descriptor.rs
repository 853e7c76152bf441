//! Fillable-field discovery.
//!
//! Turns a form definition into the ordered list of fields the guided
//! workflow walks through.

use std::collections::HashSet;

use super::definition::{FieldKind, FormDefinition, FormField};

/// Scrap marker of the address field, which always comes first.
pub const ADDRESS_MARKER: &str = "address";

/// Formatting family of a destination field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Address,
    Email,
    Phone,
    Date,
    Number,
    Text,
    TextArea,
}

impl FieldType {
    /// True for destinations that keep line breaks.
    pub fn is_multiline(&self) -> bool {
        matches!(self, FieldType::TextArea)
    }
}

/// Which form element(s) receive a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteTarget {
    /// A plain input or textarea.
    Input { field: String },
    /// A button-style control whose label displays the value and whose
    /// hidden input holds it.
    ButtonBacked { button: String, hidden_input: String },
}

impl WriteTarget {
    /// Name of the element that holds the submitted value.
    pub fn value_holder(&self) -> &str {
        match self {
            WriteTarget::Input { field } => field,
            WriteTarget::ButtonBacked { hidden_input, .. } => hidden_input,
        }
    }
}

/// One fillable field in the destination form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Scrap marker value
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Name of the value-holding form element
    pub form_field_name: String,
    pub field_type: FieldType,
    pub target: WriteTarget,
}

fn name_suggests(name: &str, needles: &[&str]) -> bool {
    let lower = name.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Infers the formatting family from the element kind, input type and name.
pub fn infer_field_type(field: &FormField) -> FieldType {
    if field.scrap.as_deref() == Some(ADDRESS_MARKER) {
        return FieldType::Address;
    }
    if field.kind == FieldKind::Textarea {
        return FieldType::TextArea;
    }

    match field.input_type.as_deref().map(str::to_lowercase).as_deref() {
        Some("email") => return FieldType::Email,
        Some("tel") => return FieldType::Phone,
        Some("date") => return FieldType::Date,
        Some("number") => return FieldType::Number,
        _ => {}
    }

    let key = format!("{} {}", field.name, field.scrap.as_deref().unwrap_or(""));
    if name_suggests(&key, &["email"]) {
        FieldType::Email
    } else if name_suggests(&key, &["phone", "tel"]) {
        FieldType::Phone
    } else if name_suggests(&key, &["date"]) {
        FieldType::Date
    } else if name_suggests(&key, &["sqft", "footage", "square"]) {
        FieldType::Number
    } else {
        FieldType::Text
    }
}

fn write_target(field: &FormField) -> WriteTarget {
    match (&field.kind, &field.hidden_input) {
        (FieldKind::Button, Some(hidden)) => WriteTarget::ButtonBacked {
            button: field.name.clone(),
            hidden_input: hidden.clone(),
        },
        _ => WriteTarget::Input {
            field: field.name.clone(),
        },
    }
}

/// Describes a single form field, using its scrap marker (or its name) as
/// the descriptor name.
pub fn describe_field(field: &FormField) -> FieldDescriptor {
    let target = write_target(field);
    FieldDescriptor {
        name: field.scrap.clone().unwrap_or_else(|| field.name.clone()),
        label: field.label.clone(),
        form_field_name: target.value_holder().to_string(),
        field_type: infer_field_type(field),
        target,
    }
}

/// Builds the ordered target list from every field carrying a scrap marker.
///
/// The address field is moved to the front; later fields whose value holder
/// duplicates an earlier one are skipped.
pub fn scan_targets(definition: &FormDefinition) -> Vec<FieldDescriptor> {
    let mut seen = HashSet::new();
    let mut descriptors: Vec<FieldDescriptor> = Vec::new();

    for field in &definition.fields {
        if field.scrap.is_none() {
            continue;
        }
        let descriptor = describe_field(field);

        if !seen.insert(descriptor.form_field_name.clone()) {
            crate::log(&format!(
                "Skipping duplicate fillable field '{}' ({})",
                descriptor.form_field_name, descriptor.name
            ));
            continue;
        }

        descriptors.push(descriptor);
    }

    if let Some(pos) = descriptors.iter().position(|d| d.name == ADDRESS_MARKER) {
        let address = descriptors.remove(pos);
        descriptors.insert(0, address);
    }

    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, kind: FieldKind, input_type: Option<&str>, scrap: Option<&str>) -> FormField {
        FormField {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            input_type: input_type.map(str::to_string),
            scrap: scrap.map(str::to_string),
            hidden_input: None,
        }
    }

    #[test]
    fn test_infer_from_input_type() {
        assert_eq!(infer_field_type(&field("a", FieldKind::Input, Some("email"), Some("x"))), FieldType::Email);
        assert_eq!(infer_field_type(&field("a", FieldKind::Input, Some("tel"), Some("x"))), FieldType::Phone);
        assert_eq!(infer_field_type(&field("a", FieldKind::Input, Some("date"), Some("x"))), FieldType::Date);
        assert_eq!(infer_field_type(&field("a", FieldKind::Input, Some("number"), Some("x"))), FieldType::Number);
        assert_eq!(infer_field_type(&field("a", FieldKind::Textarea, None, Some("x"))), FieldType::TextArea);
    }

    #[test]
    fn test_infer_from_name() {
        assert_eq!(infer_field_type(&field("contact_email", FieldKind::Input, None, Some("e"))), FieldType::Email);
        assert_eq!(infer_field_type(&field("x", FieldKind::Input, Some("text"), Some("sqft"))), FieldType::Number);
        assert_eq!(infer_field_type(&field("project_name", FieldKind::Input, None, Some("p"))), FieldType::Text);
    }

    #[test]
    fn test_scan_orders_address_first_and_skips_untagged() {
        let mut address = field("address_button", FieldKind::Button, None, Some(ADDRESS_MARKER));
        address.hidden_input = Some("address".to_string());
        let definition = FormDefinition {
            title: String::new(),
            fields: vec![
                field("project_name", FieldKind::Input, None, Some("project_name")),
                field("notes", FieldKind::Textarea, None, None),
                field("contact_email", FieldKind::Input, Some("email"), Some("email")),
                address,
            ],
        };

        let targets = scan_targets(&definition);
        let names: Vec<&str> = targets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["address", "project_name", "email"]);
        assert_eq!(targets[0].form_field_name, "address");
        assert_eq!(
            targets[0].target,
            WriteTarget::ButtonBacked {
                button: "address_button".to_string(),
                hidden_input: "address".to_string()
            }
        );
        assert_eq!(targets[0].field_type, FieldType::Address);
    }

    #[test]
    fn test_scan_skips_duplicate_form_field_names() {
        let definition = FormDefinition {
            title: String::new(),
            fields: vec![
                field("phone", FieldKind::Input, Some("tel"), Some("phone")),
                field("phone", FieldKind::Input, Some("tel"), Some("office_phone")),
            ],
        };
        let targets = scan_targets(&definition);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "phone");
    }

    #[test]
    fn test_plain_input_address() {
        let definition = FormDefinition {
            title: String::new(),
            fields: vec![
                field("city", FieldKind::Input, None, Some("city")),
                field("site_address", FieldKind::Input, None, Some(ADDRESS_MARKER)),
            ],
        };
        let targets = scan_targets(&definition);
        assert_eq!(targets[0].name, ADDRESS_MARKER);
        assert_eq!(targets[0].target, WriteTarget::Input { field: "site_address".to_string() });
    }
}
