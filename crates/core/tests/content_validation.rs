//! Validates every generator shipped under content/generators against the
//! generator JSON Schema at docs/generator-schema.json, then dry-validates
//! its field list and output template.

use std::path::{Path, PathBuf};

use mdc_core::GeneratorDefinition;

fn workspace_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(rel)
}

fn collect_generator_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "json"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn shipped_generators_match_schema_and_validate() {
    let schema_path = workspace_path("docs/generator-schema.json");
    let schema_src = std::fs::read_to_string(&schema_path)
        .unwrap_or_else(|e| panic!("Failed to read schema at {}: {}", schema_path.display(), e));
    let schema_value: serde_json::Value = serde_json::from_str(&schema_src).unwrap();
    let validator = jsonschema::validator_for(&schema_value)
        .unwrap_or_else(|e| panic!("Failed to compile schema: {}", e));

    let mut tested = 0usize;
    let mut failures = Vec::new();

    for path in collect_generator_files(&workspace_path("content/generators")) {
        let src = std::fs::read_to_string(&path).unwrap();
        let instance: serde_json::Value = serde_json::from_str(&src).unwrap();
        if let Err(error) = validator.validate(&instance) {
            failures.push(format!("{}: schema: {}", path.display(), error));
        }
        match GeneratorDefinition::from_json(&src).and_then(|def| def.validate().map(|_| def)) {
            Ok(def) => {
                let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
                if def.id != stem {
                    failures.push(format!("{}: id '{}' does not match file name", path.display(), def.id));
                }
            }
            Err(e) => failures.push(format!("{}: {}", path.display(), e)),
        }
        tested += 1;
    }

    assert!(tested > 0, "No generator files found -- check paths");
    assert!(
        failures.is_empty(),
        "Validation failed for {} of {} generators:\n{}",
        failures.len(),
        tested,
        failures.join("\n")
    );
}

#[test]
fn schema_rejects_unknown_field_kind() {
    let schema_src = std::fs::read_to_string(workspace_path("docs/generator-schema.json")).unwrap();
    let schema_value: serde_json::Value = serde_json::from_str(&schema_src).unwrap();
    let validator = jsonschema::validator_for(&schema_value).unwrap();

    let doc = serde_json::json!({
        "id": "bad",
        "title": "Bad",
        "fields": [{"name": "x", "type": "checkbox"}],
        "outputTemplate": ""
    });
    assert!(validator.validate(&doc).is_err());
}
