//! mdc-eval -- renders paperwork templates against form data.
//!
//! The evaluator consumes parsed templates from `mdc-core`, assembles a
//! [`DataContext`] from submitted form JSON, and expands directives with
//! the built-in helper registry. Rendering never fails once a template has
//! parsed: unresolved paths render empty and helpers never error.

pub mod assemble;
pub mod cache;
pub mod clock;
pub mod context;
pub mod helpers;
pub mod render;

pub use assemble::{assemble_context, AssembleError};
pub use cache::TemplateCache;
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{DataContext, General, Officer};
pub use helpers::{HelperRegistry, INVALID_DATE};
pub use render::Renderer;

use mdc_core::{GeneratorDefinition, GeneratorError, ParseError};

/// Failure while rendering a generator against form data.
#[derive(Debug, thiserror::Error)]
pub enum PaperworkError {
    #[error("invalid generator: {0}")]
    Generator(#[from] GeneratorError),
    #[error("invalid form data: {0}")]
    Assemble(#[from] AssembleError),
}

/// Parse `src` and render it against `data` with the global registry.
///
/// # Returns
/// * The expanded text, or the `ParseError` for a malformed template
pub fn render_template(src: &str, data: &DataContext) -> Result<String, ParseError> {
    let template = mdc_core::parse(src)?;
    Ok(Renderer::default().render(&template, data.as_value()))
}

/// Validate a generator, assemble its context from `form`, and render
/// its output template.
///
/// # Arguments
/// * `def` - Generator definition from the content store
/// * `form` - Submitted form JSON object
/// * `registry` - Helper registry (carries the clock `addDays` falls back to)
pub fn render_generator(
    def: &GeneratorDefinition,
    form: &serde_json::Value,
    registry: &HelperRegistry,
) -> Result<String, PaperworkError> {
    let template = def.validate()?;
    let ctx = assemble_context(def, form)?;
    tracing::debug!(generator = %def.id, "rendering generator");
    Ok(Renderer::new(registry).render(&template, ctx.as_value()))
}
