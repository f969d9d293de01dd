use std::path::PathBuf;
use std::process;

use mdc_core::GeneratorDefinition;

use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_list(config: &Config, output: OutputFormat, quiet: bool) {
    let dir = &config.generators_dir;
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            let msg = format!("error reading generators directory '{}': {}", dir.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut generators = Vec::new();
    for path in paths {
        let loaded = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|src| GeneratorDefinition::from_json(&src).map_err(|e| e.to_string()));
        match loaded {
            Ok(def) => generators.push(def),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable generator"),
        }
    }

    match output {
        OutputFormat::Text => {
            for def in &generators {
                println!("{}\t{}", def.id, def.title);
            }
            if generators.is_empty() && !quiet {
                eprintln!("no generators found in '{}'", dir.display());
            }
        }
        OutputFormat::Json => {
            let list: Vec<serde_json::Value> = generators
                .iter()
                .map(|def| {
                    serde_json::json!({
                        "id": def.id,
                        "title": def.title,
                        "fields": def.fields.len(),
                    })
                })
                .collect();
            println!("{}", serde_json::Value::Array(list));
        }
    }
}
