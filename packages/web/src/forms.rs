//! Request-time form synthesis and validation
//!
//! Forms are not declared statically: the node-creation form grows one
//! field triple per requested key, and slot forms carry exactly one field
//! per key of the node being edited. Submitted values validate against the
//! type registry (`SoftType::validate_value`) and failures land inline on
//! the offending field, so the page re-renders with its errors in place.

use std::collections::HashMap;

use onebase_core::models::{Key, SoftType, MAX_FORM_KEYS};
use onebase_core::services::KeyDraft;

/// Raw submitted pairs, duplicates preserved (checkbox groups rely on it).
#[derive(Debug, Clone, Default)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Merge query-string pairs behind body pairs (body wins on lookup).
    pub fn merged(body: Vec<(String, String)>, query: Vec<(String, String)>) -> Self {
        let mut pairs = body;
        pairs.extend(query);
        Self(pairs)
    }

    /// First value submitted under a name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under a name, in order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Checkbox semantics: present and not explicitly false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(v) if v != "false" && v != "0")
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Rendered control type of a form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Password,
    Email,
    Hidden,
    TextArea,
    Integer,
    Checkbox,
    /// `(value, label)` option pairs
    Select(Vec<(String, String)>),
}

/// One synthesized form field with its submitted value and inline errors.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub errors: Vec<String>,
}

/// A request-time form: ordered fields plus form-level errors.
#[derive(Debug, Clone, Default)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub errors: Vec<String>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, label: &str, kind: FieldKind) {
        self.fields.push(FormField {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            value: String::new(),
            errors: Vec::new(),
        });
    }

    pub fn text(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::Text);
        self
    }

    pub fn password(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::Password);
        self
    }

    pub fn email(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::Email);
        self
    }

    pub fn hidden(mut self, name: &str, value: &str) -> Self {
        self.push(name, "", FieldKind::Hidden);
        if let Some(field) = self.fields.last_mut() {
            field.value = value.to_string();
        }
        self
    }

    pub fn textarea(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::TextArea);
        self
    }

    pub fn integer(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::Integer);
        self
    }

    pub fn checkbox(mut self, name: &str, label: &str) -> Self {
        self.push(name, label, FieldKind::Checkbox);
        self
    }

    pub fn select(mut self, name: &str, label: &str, options: Vec<(String, String)>) -> Self {
        self.push(name, label, FieldKind::Select(options));
        self
    }

    /// First value of a field, empty string when absent.
    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    /// Copy submitted data onto the fields (checkboxes use flag semantics).
    pub fn set_values(&mut self, data: &FormData) {
        for field in &mut self.fields {
            match field.kind {
                FieldKind::Checkbox => {
                    field.value = if data.flag(&field.name) {
                        "true".to_string()
                    } else {
                        String::new()
                    };
                }
                _ => {
                    if let Some(value) = data.get(&field.name) {
                        field.value = value.to_string();
                    }
                }
            }
        }
    }

    /// Prefill from a key-name → value map.
    pub fn prefill(&mut self, values: &HashMap<String, String>) {
        for field in &mut self.fields {
            if let Some(value) = values.get(&field.name) {
                field.value = value.clone();
            }
        }
    }

    pub fn add_field_error(&mut self, name: &str, message: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.errors.push(message.into());
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.fields.iter().any(|f| !f.errors.is_empty())
    }
}

/// Login form: email + password.
pub fn login_form() -> Form {
    Form::new()
        .email("email", "Email")
        .password("password", "Password")
}

/// Registration form: email + password + confirmation.
pub fn register_form() -> Form {
    Form::new()
        .email("email", "Email")
        .password("password", "Password")
        .password("password_confirm", "Confirm Password")
}

/// Validate a submitted registration form in place.
pub fn validate_register(form: &mut Form) -> bool {
    let email = form.value("email").to_string();
    if email.trim().is_empty() || !email.contains('@') {
        form.add_field_error("email", "A valid email address is required");
    }
    let password = form.value("password").to_string();
    if password.is_empty() {
        form.add_field_error("password", "A password is required");
    }
    if password != form.value("password_confirm") {
        form.add_field_error("password", "Passwords do not match");
        form.add_field_error("password_confirm", "Passwords do not match");
    }
    !form.has_errors()
}

/// Type registry form.
pub fn type_form() -> Form {
    Form::new()
        .text("name", "Name")
        .text("repr", "Representation URL")
        .checkbox("is_primitive", "Primitive")
        .text("validator", "Validator URL")
}

/// Type registry form prefilled from an existing entry.
pub fn type_form_prefilled(soft_type: &SoftType) -> Form {
    let mut form = type_form();
    let mut values = HashMap::new();
    values.insert("name".to_string(), soft_type.name.clone());
    values.insert("repr".to_string(), soft_type.repr.clone());
    values.insert(
        "validator".to_string(),
        soft_type.validator.clone().unwrap_or_default(),
    );
    if soft_type.is_primitive {
        values.insert("is_primitive".to_string(), "true".to_string());
    }
    form.prefill(&values);
    form
}

/// Validate a submitted type form in place.
pub fn validate_type_form(form: &mut Form) -> bool {
    if form.value("name").trim().is_empty() {
        form.add_field_error("name", "A name is required");
    }
    !form.has_errors()
}

/// Clamp the requested key count into `1..=MAX_FORM_KEYS`.
pub fn clamp_key_count(requested: usize) -> usize {
    requested.clamp(1, MAX_FORM_KEYS)
}

/// Node-creation form: title, description and one field triple per key.
pub fn node_form(
    path: &str,
    key_count: usize,
    types: &[(String, String)],
    data: &FormData,
) -> Form {
    let mut form = Form::new()
        .hidden("path", path)
        .text("title", "Title")
        .textarea("description", "Description");
    for i in 0..key_count {
        form = form
            .text(&format!("key_{i}_name"), &format!("Key {i} Name"))
            .select(
                &format!("key_{i}_type"),
                &format!("Key {i} Type"),
                types.to_vec(),
            )
            .integer(&format!("key_{i}_size"), &format!("Key {i} Size"));
    }
    form.set_values(data);
    // The hidden path always wins over stray submitted values.
    if let Some(field) = form.fields.iter_mut().find(|f| f.name == "path") {
        field.value = path.to_string();
    }
    form
}

/// Validate the title of a submitted node form in place.
pub fn validate_node_form(form: &mut Form) -> bool {
    if form.value("title").trim().is_empty() {
        form.add_field_error("title", "A title is required");
    }
    !form.has_errors()
}

/// Read key drafts off a node form, stopping at the first unnamed key.
///
/// Size parse failures and duplicate names land inline; `None` signals the
/// form has errors to re-render.
pub fn parse_key_drafts(form: &mut Form, key_count: usize) -> Option<Vec<KeyDraft>> {
    let mut drafts = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for i in 0..key_count {
        let name_field = format!("key_{i}_name");
        let name = form.value(&name_field).trim().to_string();
        if name.is_empty() {
            break;
        }
        if seen.contains(&name) {
            form.add_field_error(&name_field, format!("Duplicate key name: {name}"));
            continue;
        }
        seen.push(name.clone());

        let type_field = format!("key_{i}_type");
        let soft_type = form.value(&type_field).to_string();
        if soft_type.is_empty() {
            form.add_field_error(&type_field, "A type is required");
            continue;
        }

        let size_field = format!("key_{i}_size");
        let size_raw = form.value(&size_field).trim().to_string();
        let size = if size_raw.is_empty() {
            None
        } else {
            match size_raw.parse::<usize>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    form.add_field_error(&size_field, "Size must be a whole number");
                    continue;
                }
            }
        };

        drafts.push(KeyDraft {
            name,
            soft_type,
            size,
        });
    }

    if form.has_errors() {
        None
    } else {
        Some(drafts)
    }
}

/// Slot form: one field per key, labelled with the key's type.
pub fn slot_form(
    keys: &[Key],
    types: &HashMap<String, SoftType>,
    values: Option<&HashMap<String, String>>,
) -> Form {
    let mut form = Form::new();
    for key in keys {
        let type_name = types
            .get(&key.soft_type)
            .map(|t| t.name.as_str())
            .unwrap_or("unknown");
        let label = match key.size {
            Some(size) => format!("{} ({}, max {})", key.name, type_name, size),
            None => format!("{} ({})", key.name, type_name),
        };
        form = form.text(&key.name, &label);
    }
    if let Some(values) = values {
        form.prefill(values);
    }
    form
}

/// Validate a submitted slot form against the registry.
///
/// Returns the key-name → value map when every field validates; otherwise
/// the errors sit inline on the form.
pub fn validate_slot_form(
    form: &mut Form,
    keys: &[Key],
    types: &HashMap<String, SoftType>,
) -> Option<HashMap<String, String>> {
    let mut values = HashMap::new();
    for key in keys {
        let value = form.value(&key.name).to_string();
        match types.get(&key.soft_type) {
            Some(soft_type) => {
                if let Err(err) = soft_type.validate_value(&value, key.size) {
                    form.add_field_error(&key.name, err.to_string());
                }
            }
            None => form.add_field_error(&key.name, "Unknown type"),
        }
        values.insert(key.name.clone(), value);
    }

    if form.has_errors() {
        None
    } else {
        Some(values)
    }
}
