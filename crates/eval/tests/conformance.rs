//! Render conformance suite over the bundled content store.
//!
//! Each case is a triplet keyed by file stem:
//! - `content/generators/<name>.json` -- generator definition
//! - `content/forms/<name>.json`      -- submitted form data
//! - `content/expected/<name>.txt`    -- expected rendered text
//!
//! Rendering uses a fixed clock so `addDays` fallbacks are stable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdc_core::GeneratorDefinition;
use mdc_eval::{render_generator, FixedClock, HelperRegistry};
use time::macros::date;

fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("content")
}

fn run_render_fixture(content: &Path, name: &str) {
    let generator_path = content.join("generators").join(format!("{}.json", name));
    let form_path = content.join("forms").join(format!("{}.json", name));
    let expected_path = content.join("expected").join(format!("{}.txt", name));

    let generator_src = std::fs::read_to_string(&generator_path)
        .unwrap_or_else(|e| panic!("Failed to read generator {}: {}", name, e));
    let def = GeneratorDefinition::from_json(&generator_src)
        .unwrap_or_else(|e| panic!("Invalid generator {}: {}", name, e));

    let form_src = std::fs::read_to_string(&form_path)
        .unwrap_or_else(|e| panic!("Failed to read form for {}: {}", name, e));
    let form: serde_json::Value = serde_json::from_str(&form_src)
        .unwrap_or_else(|e| panic!("Invalid form JSON for {}: {}", name, e));

    let registry = HelperRegistry::with_clock(Arc::new(FixedClock(date!(2025 - 06 - 07))));
    let actual = render_generator(&def, &form, &registry)
        .unwrap_or_else(|e| panic!("Render failed for {}: {}", name, e));

    let expected = std::fs::read_to_string(&expected_path)
        .unwrap_or_else(|e| panic!("Failed to read expected output for {}: {}", name, e));

    assert_eq!(
        actual, expected,
        "Output mismatch for {}\n\nActual:\n{}\n\nExpected:\n{}",
        name, actual, expected
    );
}

#[test]
fn arrest_report() {
    run_render_fixture(&content_dir(), "arrest-report");
}

#[test]
fn traffic_citation() {
    run_render_fixture(&content_dir(), "traffic-citation");
}

#[test]
fn every_form_has_an_expected_output() {
    let content = content_dir();
    let mut count = 0;
    for entry in std::fs::read_dir(content.join("forms")).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = path.file_stem().unwrap().to_str().unwrap().to_owned();
        run_render_fixture(&content, &name);
        count += 1;
    }
    assert!(count >= 2, "expected at least two form fixtures, found {}", count);
}

#[test]
fn half_filled_form_still_renders() {
    let src = std::fs::read_to_string(content_dir().join("generators/traffic-citation.json")).unwrap();
    let def = GeneratorDefinition::from_json(&src).unwrap();
    let registry = HelperRegistry::with_clock(Arc::new(FixedClock(date!(2025 - 06 - 07))));
    let out = render_generator(&def, &serde_json::json!({"driver": "Lena Ortiz"}), &registry).unwrap();
    assert_eq!(
        out,
        "[b]TRAFFIC CITATION[/b] - \n\nDriver: Lena Ortiz\nNo violations recorded.\n"
    );
}
