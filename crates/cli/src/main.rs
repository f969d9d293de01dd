mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Environment variable holding the `tracing` filter directive.
const LOG_ENV: &str = "MDC_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Paperwork generator toolchain.
#[derive(Parser)]
#[command(name = "mdc", version, about = "Paperwork generator toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to the config file (default: ./mdc.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dry-validate a generator definition (or a bare template with --raw)
    Validate {
        /// Path to the generator JSON file
        file: PathBuf,
        /// Treat FILE as a bare template instead of a generator definition
        #[arg(long)]
        raw: bool,
    },

    /// Render a generator against submitted form data
    Render {
        /// Generator file path, or a generator id from the generators directory
        generator: String,
        /// Path to the form data JSON file
        #[arg(long)]
        data: PathBuf,
        /// Treat GENERATOR as a bare template file
        #[arg(long)]
        raw: bool,
        /// Date used when addDays falls back to today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// List the generators in the generators directory
    List,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    init_logging(&config);

    match cli.command {
        Commands::Validate { file, raw } => {
            commands::validate::cmd_validate(&file, raw, cli.output, cli.quiet);
        }
        Commands::Render {
            generator,
            data,
            raw,
            today,
        } => {
            commands::render::cmd_render(
                &config,
                &generator,
                &data,
                raw,
                today.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::List => {
            commands::list::cmd_list(&config, cli.output, cli.quiet);
        }
    }
}

/// Filter precedence: `MDC_LOG`, then the config's `log_filter`, then `warn`.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| match &config.log_filter {
            Some(directive) => EnvFilter::try_new(directive),
            None => EnvFilter::try_new("warn"),
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
