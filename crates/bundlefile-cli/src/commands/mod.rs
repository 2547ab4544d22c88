//! Command implementations and dispatch logic.
//!
//! Every command loads the root document the same way: options are layered
//! from the defaults, `BUNDLEFILE_*` environment variables and CLI flags,
//! then a [`ResolverContext`] resolves the document over the real
//! filesystem.

use bundlefile_config::{OptionsLayering, ResolveOptions};
use bundlefile_core::{BundleResult, Diagnostics, DocumentId};
use bundlefile_resolver::ResolverContext;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

pub mod check;
pub mod deps;
pub mod plan;
pub mod resolve;


use crate::{output::OutputHandler, Commands, ResolveArgs};

/// Shared context for all commands
pub struct CommandContext {
    pub output: OutputHandler,
    /// `BUNDLEFILE_*` variables of the process environment
    pub env_overrides: HashMap<String, String>,
    pub verbose: bool,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(verbose: bool) -> Self {
        Self {
            output: OutputHandler::new(),
            env_overrides: OptionsLayering::collect_env_overrides(),
            verbose,
        }
    }
}

/// Layer the options of a command.
///
/// Flags override the environment only when they are given.
pub fn options_for(args: &ResolveArgs, ctx: &CommandContext) -> BundleResult<(ResolveOptions, Diagnostics)> {
    let mut layering = OptionsLayering::new().with_env_overrides(ctx.env_overrides.clone());
    if let Some(env) = &args.env {
        layering = layering.with_cli_override("env", env.as_str());
    }
    if let Some(theme) = &args.theme {
        layering = layering.with_cli_override("theme", theme.as_str());
    }
    for (key, enabled) in [
        ("verbose", ctx.verbose),
        ("strict", args.strict),
        ("debug", args.debug),
        ("watch", args.watch),
    ] {
        if enabled {
            layering = layering.with_cli_override(key, "true");
        }
    }

    let mut diagnostics = Diagnostics::new();
    let options = layering.merge(&mut diagnostics)?;
    Ok((options, diagnostics))
}

/// Resolve the root document of a command.
///
/// Diagnostics collected before a fatal error are printed before the error
/// is returned.
pub fn load(args: &ResolveArgs, ctx: &CommandContext) -> BundleResult<(ResolverContext, DocumentId)> {
    let (options, diagnostics) = options_for(args, ctx)?;
    let mut resolver = ResolverContext::new(options).with_diagnostics(diagnostics);
    match resolver.resolve(&args.file) {
        Ok(id) => Ok((resolver, id)),
        Err(err) => {
            print_diagnostics(&mut resolver, ctx);
            Err(err)
        },
    }
}

/// Print and clear the diagnostics collected so far
pub fn print_diagnostics(resolver: &mut ResolverContext, ctx: &CommandContext) {
    for diagnostic in resolver.take_diagnostics() {
        ctx.output.diagnostic(&diagnostic);
    }
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// Dispatch a command to its handler
pub fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Resolve(args) => {
            info!("Resolving {}", args.file);
            resolve::execute(&args, ctx)
        },
        Commands::Check(args) => {
            info!("Checking {} (strict: {})", args.file, args.strict);
            check::execute(&args, ctx)
        },
        Commands::Deps(args) => {
            info!("Listing dependencies of {}", args.file);
            deps::execute(&args, ctx)
        },
        Commands::Plan(args) => {
            info!("Planning processors of {}", args.file);
            plan::execute(&args, ctx)
        },
    }
}
