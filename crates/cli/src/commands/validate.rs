use std::path::Path;
use std::process;

use mdc_core::{GeneratorDefinition, GeneratorError, ParseError};

use super::{read_file, read_json};
use crate::{report_error, OutputFormat};

static GENERATOR_SCHEMA_STR: &str = include_str!("../../../../docs/generator-schema.json");

pub(crate) fn cmd_validate(path: &Path, raw: bool, output: OutputFormat, quiet: bool) {
    if raw {
        let src = read_file(path, "template", output, quiet);
        match mdc_core::parse(&src) {
            Ok(_) => report_valid("template", None, output, quiet),
            Err(e) => report_invalid("template", vec![e.to_string()], Some(&e), output, quiet),
        }
        return;
    }

    let schema: serde_json::Value = match serde_json::from_str(GENERATOR_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("internal error: failed to parse embedded generator schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc = read_json(path, "generator", output, quiet);
    let errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();
    if !errors.is_empty() {
        report_invalid("generator", errors, None, output, quiet);
    }

    let def: GeneratorDefinition = match serde_json::from_value(doc) {
        Ok(d) => d,
        Err(e) => report_invalid("generator", vec![e.to_string()], None, output, quiet),
    };

    match def.validate() {
        Ok(_) => report_valid("generator", Some(&def.id), output, quiet),
        Err(GeneratorError::Template(e)) => report_invalid(
            "generator",
            vec![format!("output template: {}", e)],
            Some(&e),
            output,
            quiet,
        ),
        Err(e) => report_invalid("generator", vec![e.to_string()], None, output, quiet),
    }
}

fn report_valid(doc_type: &str, id: Option<&str>, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!("valid"),
        OutputFormat::Json => {
            let mut json = serde_json::json!({ "valid": true, "type": doc_type });
            if let Some(id) = id {
                json["id"] = serde_json::json!(id);
            }
            println!("{}", json);
        }
    }
}

fn report_invalid(
    doc_type: &str,
    errors: Vec<String>,
    location: Option<&ParseError>,
    output: OutputFormat,
    quiet: bool,
) -> ! {
    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid {}", doc_type);
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let mut json = serde_json::json!({
                "valid": false,
                "type": doc_type,
                "errors": errors,
            });
            if let Some(e) = location {
                json["location"] = e.to_json_value();
            }
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
    process::exit(1);
}
