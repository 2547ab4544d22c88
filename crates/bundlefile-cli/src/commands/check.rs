//! `bundlefile check`: report every problem of a document

use super::{load, CommandContext};
use crate::ResolveArgs;
use bundlefile_core::{Diagnostic, DocumentId, FileSystem, Level};
use bundlefile_resolver::{ProcessorResolver, ResolverContext};

/// Execute the check command
pub fn execute(args: &ResolveArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let (mut resolver, id) = load(args, ctx)?;
    let diagnostics = collect(&mut resolver, id);

    for diagnostic in &diagnostics {
        ctx.output.diagnostic(diagnostic);
    }

    let errors = diagnostics.iter().filter(|d| d.level == Level::Error).count();
    let warnings = diagnostics.iter().filter(|d| d.level == Level::Warning).count();
    if errors > 0 {
        anyhow::bail!("'{}' has {} error(s) and {} warning(s)", args.file, errors, warnings);
    }
    ctx.output.success(&format!("'{}' is valid ({} warning(s))", args.file, warnings));
    Ok(())
}

/// Every diagnostic of a resolution, including build-ready merging and
/// processor planning
pub fn collect<F: FileSystem>(resolver: &mut ResolverContext<F>, id: DocumentId) -> Vec<Diagnostic> {
    let bundles = resolver.build_ready(id);
    let processors = ProcessorResolver::from_context(resolver);

    let mut diagnostics = resolver.take_diagnostics();
    for bundle in &bundles {
        for (kind, resource) in bundle.resources() {
            if let Err(err) = processors.plan(resource) {
                diagnostics.push(Diagnostic {
                    level: Level::Error,
                    message: err.to_string(),
                    context: Some(format!("{}→{}", bundle.name, kind)),
                });
            }
        }
    }
    diagnostics
}
