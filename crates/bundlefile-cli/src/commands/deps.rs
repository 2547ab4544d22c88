//! `bundlefile deps`: print every bundle with its flattened dependencies

use super::{load, print_diagnostics, CommandContext};
use crate::ResolveArgs;
use bundlefile_core::{DocumentId, FileSystem};
use bundlefile_resolver::ResolverContext;

/// Execute the deps command
pub fn execute(args: &ResolveArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let (mut resolver, id) = load(args, ctx)?;
    let lines = render(&resolver, id);
    print_diagnostics(&mut resolver, ctx);
    ctx.output.report(&lines.join("\n"));
    Ok(())
}

/// One line per bundle variant, followed by an indented line per dependency
pub fn render<F: FileSystem>(resolver: &ResolverContext<F>, id: DocumentId) -> Vec<String> {
    let mut lines = Vec::new();
    for key in resolver.bundle_keys(id) {
        let Some(bundle) = resolver.bundle(&key) else {
            continue;
        };
        lines.push(bundle.identity());
        for dep_key in resolver.resolved_dependencies(&key) {
            let Some(dep) = resolver.bundle(&dep_key) else {
                continue;
            };
            match resolver.document_path(dep.original_owner) {
                Some(path) if dep.original_owner != id => {
                    lines.push(format!("  {} ({})", dep.identity(), path))
                },
                _ => lines.push(format!("  {}", dep.identity())),
            }
        }
    }
    lines
}
