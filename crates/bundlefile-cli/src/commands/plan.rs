//! `bundlefile plan`: print the processor batches of every build-ready resource

use super::{load, print_diagnostics, to_json, CommandContext};
use crate::ResolveArgs;
use bundlefile_core::{BundleResult, DocumentId, FileSystem};
use bundlefile_resolver::{ProcessorResolver, ResolverContext};
use serde_json::{json, Value};

/// Execute the plan command
pub fn execute(args: &ResolveArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let (mut resolver, id) = load(args, ctx)?;
    let entries = plan(&mut resolver, id);
    print_diagnostics(&mut resolver, ctx);
    ctx.output.report(&to_json(&entries?, args.compact)?);
    Ok(())
}

/// Processor batches per build-ready resource.
///
/// Fails on the first batch needing an unknown callback.
pub fn plan<F: FileSystem>(resolver: &mut ResolverContext<F>, id: DocumentId) -> BundleResult<Vec<Value>> {
    let bundles = resolver.build_ready(id);
    let processors = ProcessorResolver::from_context(resolver);

    let mut entries = Vec::new();
    for bundle in &bundles {
        for (kind, resource) in bundle.resources() {
            let batches = processors.plan(resource)?;
            entries.push(json!({
                "bundle": bundle.name,
                "theme": bundle.theme,
                "kind": kind,
                "output": resource.output,
                "batches": batches,
            }));
        }
    }
    Ok(entries)
}
