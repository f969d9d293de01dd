//! DataContext assembly from submitted form JSON.
//!
//! For each field the generator declares:
//! - plain fields (`text`, `textarea`, `dropdown`) are copied when present
//!   and otherwise left unresolved, so a half-filled form still renders
//! - an `officer` field copies the `officers` list
//! - a `general` field copies the `general` map
//!
//! Keys the generator does not declare are ignored.

use std::collections::BTreeSet;

use mdc_core::generator::{GENERAL_KEY, OFFICERS_KEY};
use mdc_core::{FieldKind, GeneratorDefinition, Value};

use crate::context::DataContext;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    #[error("form data must be a JSON object, got {got}")]
    NotAnObject { got: &'static str },
}

pub fn assemble_context(
    def: &GeneratorDefinition,
    form: &serde_json::Value,
) -> Result<DataContext, AssembleError> {
    let form_obj = form.as_object().ok_or(AssembleError::NotAnObject {
        got: json_type_name(form),
    })?;

    let mut ctx = DataContext::new();
    let mut used = BTreeSet::new();

    for field in &def.fields {
        let key = match field.kind {
            FieldKind::Officer => OFFICERS_KEY,
            FieldKind::General => GENERAL_KEY,
            _ => field.name.as_str(),
        };
        used.insert(key);
        let Some(raw) = form_obj.get(key) else {
            continue;
        };

        match field.kind {
            FieldKind::Officer => match raw {
                serde_json::Value::Array(_) => ctx.insert(key, Value::from_json(raw)),
                other => tracing::warn!(
                    generator = %def.id,
                    got = json_type_name(other),
                    "officers must be a list, ignoring"
                ),
            },
            FieldKind::General => match raw {
                serde_json::Value::Object(_) => ctx.insert(key, Value::from_json(raw)),
                other => tracing::warn!(
                    generator = %def.id,
                    got = json_type_name(other),
                    "general must be an object, ignoring"
                ),
            },
            FieldKind::Dropdown => {
                if let Some(choice) = raw.as_str() {
                    if !choice.is_empty() && !field.options.iter().any(|o| o == choice) {
                        tracing::warn!(
                            generator = %def.id,
                            field = %field.name,
                            choice,
                            "dropdown value is not one of the declared options"
                        );
                    }
                }
                ctx.insert(key, Value::from_json(raw));
            }
            FieldKind::Text | FieldKind::Textarea => ctx.insert(key, Value::from_json(raw)),
        }
    }

    for key in form_obj.keys() {
        if !used.contains(key.as_str()) {
            tracing::debug!(generator = %def.id, key = %key, "ignoring undeclared form key");
        }
    }

    Ok(ctx)
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
