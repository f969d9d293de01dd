use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use mdc_core::{GeneratorDefinition, Value};
use mdc_eval::{render_generator, DataContext, FixedClock, HelperRegistry, Renderer};
use time::macros::format_description;
use time::Date;

use super::{read_file, read_json};
use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_render(
    config: &Config,
    generator: &str,
    data_path: &Path,
    raw: bool,
    today: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let registry = match today {
        Some(text) => match Date::parse(text, format_description!("[year]-[month]-[day]")) {
            Ok(date) => HelperRegistry::with_clock(Arc::new(FixedClock(date))),
            Err(e) => {
                let msg = format!("error: invalid --today '{}': {}", text, e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        },
        None => HelperRegistry::builtin(),
    };

    let form = read_json(data_path, "form data", output, quiet);

    let (id, rendered) = if raw {
        let path = Path::new(generator);
        let src = read_file(path, "template", output, quiet);
        (path.display().to_string(), render_raw(&src, &form, &registry, output, quiet))
    } else {
        let path = resolve_generator(config, generator, output, quiet);
        let src = read_file(&path, "generator", output, quiet);
        let def = match GeneratorDefinition::from_json(&src) {
            Ok(d) => d,
            Err(e) => {
                report_error(&format!("error: {}", e), output, quiet);
                process::exit(1);
            }
        };
        match render_generator(&def, &form, &registry) {
            Ok(text) => (def.id, text),
            Err(e) => {
                report_error(&format!("error: {}", e), output, quiet);
                process::exit(1);
            }
        }
    };

    match output {
        OutputFormat::Text => print!("{}", rendered),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "generator": id, "output": rendered })
            );
        }
    }
}

/// A bare template is rendered against the form object as-is.
fn render_raw(
    src: &str,
    form: &serde_json::Value,
    registry: &HelperRegistry,
    output: OutputFormat,
    quiet: bool,
) -> String {
    let ctx = match Value::from_json(form) {
        Value::Map(fields) => DataContext::from(fields),
        other => {
            let msg = format!(
                "error: form data must be a JSON object, got {}",
                other.type_name()
            );
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match mdc_core::parse(src) {
        Ok(template) => Renderer::new(registry).render(&template, ctx.as_value()),
        Err(e) => {
            report_error(&format!("error: template {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// An existing file path wins; otherwise `<generators_dir>/<id>.json`.
fn resolve_generator(config: &Config, generator: &str, output: OutputFormat, quiet: bool) -> PathBuf {
    let direct = Path::new(generator);
    if direct.is_file() {
        return direct.to_path_buf();
    }
    let by_id = config.generators_dir.join(format!("{}.json", generator));
    if by_id.is_file() {
        tracing::debug!(id = generator, path = %by_id.display(), "resolved generator id");
        return by_id;
    }
    let msg = format!(
        "error: generator '{}' not found (looked in '{}')",
        generator,
        config.generators_dir.display()
    );
    report_error(&msg, output, quiet);
    process::exit(1);
}
