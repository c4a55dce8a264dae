//! Schema gate for inbound résumés.
//!
//! Everything that reaches the repository or the export pipeline passes through
//! [`validate`] first, so downstream code can rely on a well-formed
//! [`StructuredResume`] and never re-checks shapes.
//!
//! Rules:
//! - `personal_data` is required and must be an object
//! - string fields must be strings; `null` counts as absent
//! - list fields default to empty; entries must be objects (never null)
//! - `document_settings` values must be non-negative numbers
//! - unknown fields are dropped, not rejected
//!
//! Every problem is collected so the caller sees the full list in one response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::resume::{DocumentSettingsOverride, StructuredResume};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("Invalid resume: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

const PERSONAL_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "email",
    "phone",
    "location",
    "website",
    "linkedin",
    "github",
    "summary",
];

const SETTINGS_FIELDS: &[&str] = &[
    "font_size",
    "name_size",
    "section_title_size",
    "line_spacing",
    "section_spacing",
    "entry_spacing",
    "page_margin",
];

/// Shape of one list-typed section of the résumé.
struct SectionSchema {
    key: &'static str,
    strings: &'static [&'static str],
    string_lists: &'static [&'static str],
}

const SECTIONS: &[SectionSchema] = &[
    SectionSchema {
        key: "work_experience",
        strings: &["title", "company", "location", "start_date", "end_date"],
        string_lists: &["highlights"],
    },
    SectionSchema {
        key: "education",
        strings: &[
            "institution",
            "degree",
            "field_of_study",
            "start_date",
            "end_date",
            "gpa",
        ],
        string_lists: &[],
    },
    SectionSchema {
        key: "projects",
        strings: &["name", "description", "url"],
        string_lists: &["technologies", "highlights"],
    },
    SectionSchema {
        key: "skills",
        strings: &["category", "skill_name"],
        string_lists: &[],
    },
];

/// Validates a candidate résumé and returns it normalized, with defaults filled in.
pub fn validate(candidate: &Value) -> Result<StructuredResume, ValidationError> {
    let Some(root) = candidate.as_object() else {
        return Err(ValidationError::single("resume", "must be a JSON object"));
    };

    let mut errors = Vec::new();
    let mut normalized = Map::new();

    match root.get("personal_data") {
        None | Some(Value::Null) => errors.push(field_error("personal_data", "is required")),
        Some(Value::Object(obj)) => {
            let personal = copy_strings(obj, PERSONAL_FIELDS, "personal_data", &mut errors);
            normalized.insert("personal_data".to_string(), Value::Object(personal));
        }
        Some(_) => errors.push(field_error("personal_data", "must be an object")),
    }

    for section in SECTIONS {
        match root.get(section.key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                let mut entries = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let path = format!("{}[{}]", section.key, i);
                    match item {
                        Value::Object(obj) => {
                            entries.push(Value::Object(copy_entry(obj, section, &path, &mut errors)))
                        }
                        Value::Null => errors.push(field_error(&path, "must not be null")),
                        _ => errors.push(field_error(&path, "must be an object")),
                    }
                }
                normalized.insert(section.key.to_string(), Value::Array(entries));
            }
            Some(_) => errors.push(field_error(section.key, "must be an array")),
        }
    }

    match root.get("document_settings") {
        None | Some(Value::Null) => {}
        Some(Value::Object(obj)) => {
            let settings = copy_settings(obj, "document_settings", &mut errors);
            normalized.insert("document_settings".to_string(), Value::Object(settings));
        }
        Some(_) => errors.push(field_error("document_settings", "must be an object")),
    }

    if !errors.is_empty() {
        return Err(ValidationError { fields: errors });
    }

    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| ValidationError::single("resume", e.to_string()))
}

/// Validates an export-time `styles` override. Only the settings keys are honoured.
pub fn validate_styles(candidate: &Value) -> Result<DocumentSettingsOverride, ValidationError> {
    let obj = match candidate {
        Value::Null => return Ok(DocumentSettingsOverride::default()),
        Value::Object(obj) => obj,
        _ => return Err(ValidationError::single("styles", "must be an object")),
    };

    let mut errors = Vec::new();
    let settings = copy_settings(obj, "styles", &mut errors);
    if !errors.is_empty() {
        return Err(ValidationError { fields: errors });
    }

    serde_json::from_value(Value::Object(settings))
        .map_err(|e| ValidationError::single("styles", e.to_string()))
}

fn field_error(field: &str, message: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn copy_strings(
    obj: &Map<String, Value>,
    keys: &[&str],
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for &key in keys {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(v @ Value::String(_)) => {
                out.insert(key.to_string(), v.clone());
            }
            Some(_) => errors.push(field_error(&format!("{path}.{key}"), "must be a string")),
        }
    }
    out
}

fn copy_entry(
    obj: &Map<String, Value>,
    schema: &SectionSchema,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut out = copy_strings(obj, schema.strings, path, errors);

    for &key in schema.string_lists {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::String(_) => list.push(item.clone()),
                        _ => errors.push(field_error(
                            &format!("{path}.{key}[{i}]"),
                            "must be a string",
                        )),
                    }
                }
                out.insert(key.to_string(), Value::Array(list));
            }
            Some(_) => errors.push(field_error(&format!("{path}.{key}"), "must be an array")),
        }
    }

    out
}

fn copy_settings(
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for &key in SETTINGS_FIELDS {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_f64() {
                Some(n) if n.is_finite() && n >= 0.0 => {
                    out.insert(key.to_string(), v.clone());
                }
                _ => errors.push(field_error(
                    &format!("{path}.{key}"),
                    "must be a non-negative number",
                )),
            },
        }
    }
    out
}
