pub(crate) mod list;
pub(crate) mod render;
pub(crate) mod validate;

use std::path::Path;
use std::process;

use crate::{report_error, OutputFormat};

/// Read a file to a string, or report and exit.
pub(crate) fn read_file(path: &Path, what: &str, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading {} '{}': {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Read and parse a JSON file, or report and exit.
pub(crate) fn read_json(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> serde_json::Value {
    let text = read_file(path, what, output, quiet);
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
