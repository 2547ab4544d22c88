//! # bundlefile
//!
//! Command-line front end of the bundlefile resolver.
//!
//! This is the main entry point of the CLI tool. It parses commands, sets up
//! logging and error reporting, and dispatches to the command handlers.

use bundlefile_core::BundleError;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Resolve front-end asset bundle configurations
#[derive(Parser)]
#[command(name = "bundlefile", version, about = "Resolve front-end asset bundle configurations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Format of log events written to stderr
    #[arg(long, global = true, value_enum, env = "BUNDLEFILE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the build-ready bundles of a document as JSON
    Resolve(ResolveArgs),
    /// Report every problem found while resolving a document
    Check(ResolveArgs),
    /// Print each bundle with its flattened dependencies
    Deps(ResolveArgs),
    /// Print the processor batches of every build-ready resource
    Plan(ResolveArgs),
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Root document (YAML, JSON or TOML)
    #[arg(value_name = "FILE")]
    pub file: Utf8PathBuf,

    /// Environment, `dev` or `prod`
    #[arg(long)]
    pub env: Option<String>,

    /// Theme to resolve
    #[arg(long)]
    pub theme: Option<String>,

    /// Warn about inputs that produce no output
    #[arg(long)]
    pub strict: bool,

    /// Log every dependency decision
    #[arg(long)]
    pub debug: bool,

    /// Include the paths to watch
    #[arg(long)]
    pub watch: bool,

    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    info!("Starting bundlefile v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new(cli.verbose);
    commands::dispatch_command(cli.command, &ctx)
}

fn setup_logging(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "warn" };
    // Diagnostics are printed by the commands themselves
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bundlefile={level},bundlefile_core={level},bundlefile_config={level},bundlefile_resolver={level},bundlefile_core::utils::diagnostics=off"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("bundlefile encountered an unexpected error: {}", panic_info);
        eprintln!("bundlefile crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/bundlefile/bundlefile/issues");
        eprintln!("Error: {}", panic_info);
    }));
}

fn report_error(err: &anyhow::Error) {
    let formatter = ErrorFormatter::new();
    match err.downcast_ref::<BundleError>() {
        Some(bundle_error) => eprintln!("{}", formatter.format_error(bundle_error)),
        None => eprintln!("{}", formatter.format_simple(&format!("{:#}", err))),
    }
}
