//! Paperwork generator definitions as stored in the content store.
//!
//! A generator pairs the form fields shown to the user with the output
//! template rendered from their answers. [`GeneratorDefinition::validate`]
//! is the dry-run check the form builder performs before saving one.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ast::Template;
use crate::error::ParseError;
use crate::parser::parse;

/// Key under which repeated officer blocks are stored in the data context.
pub const OFFICERS_KEY: &str = "officers";
/// Key under which the singleton general block is stored in the data context.
pub const GENERAL_KEY: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    pub output_template: String,
}

/// One input control on the paperwork form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Root key of this field's value in the data context.
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Choices for `dropdown` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Dropdown,
    /// Repeated per-officer group, stored under `officers`.
    Officer,
    /// Singleton group (date, time, district...), stored under `general`.
    General,
}

impl FieldKind {
    pub fn is_group(self) -> bool {
        matches!(self, FieldKind::Officer | FieldKind::General)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    #[error("invalid generator JSON: {0}")]
    Json(String),
    #[error("generator id must not be empty")]
    MissingId,
    #[error("field #{index} has an empty name")]
    EmptyFieldName { index: usize },
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },
    #[error("dropdown field '{name}' has no options")]
    EmptyDropdown { name: String },
    #[error("only one '{kind}' field is allowed")]
    DuplicateGroup { kind: String },
    #[error("field name '{name}' is reserved")]
    ReservedName { name: String },
    #[error("output template: {0}")]
    Template(#[from] ParseError),
}

impl GeneratorDefinition {
    pub fn from_json(src: &str) -> Result<Self, GeneratorError> {
        serde_json::from_str(src).map_err(|e| GeneratorError::Json(e.to_string()))
    }

    /// Check the field list and parse the output template.
    ///
    /// Returns the parsed template so callers can cache it.
    pub fn validate(&self) -> Result<Template, GeneratorError> {
        if self.id.trim().is_empty() {
            return Err(GeneratorError::MissingId);
        }

        let mut names = BTreeSet::new();
        let mut groups = BTreeSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.kind.is_group() {
                let kind = match field.kind {
                    FieldKind::Officer => "officer",
                    _ => "general",
                };
                if !groups.insert(kind) {
                    return Err(GeneratorError::DuplicateGroup {
                        kind: kind.to_owned(),
                    });
                }
                continue;
            }

            if field.name.trim().is_empty() {
                return Err(GeneratorError::EmptyFieldName { index });
            }
            if field.name == OFFICERS_KEY || field.name == GENERAL_KEY {
                return Err(GeneratorError::ReservedName {
                    name: field.name.clone(),
                });
            }
            if !names.insert(field.name.as_str()) {
                return Err(GeneratorError::DuplicateField {
                    name: field.name.clone(),
                });
            }
            if field.kind == FieldKind::Dropdown && field.options.is_empty() {
                return Err(GeneratorError::EmptyDropdown {
                    name: field.name.clone(),
                });
            }
        }

        Ok(parse(&self.output_template)?)
    }

    pub fn has_group(&self, kind: FieldKind) -> bool {
        self.fields.iter().any(|f| f.kind == kind)
    }
}
