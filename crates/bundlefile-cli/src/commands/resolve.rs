//! `bundlefile resolve`: print the build-ready view of a document

use super::{load, print_diagnostics, to_json, CommandContext};
use crate::ResolveArgs;
use bundlefile_core::{DocumentId, FileSystem};
use bundlefile_resolver::{ResolverContext, WatchList};
use serde_json::{json, Value};

/// Execute the resolve command
pub fn execute(args: &ResolveArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let (mut resolver, id) = load(args, ctx)?;
    let report = report(&mut resolver, id);
    print_diagnostics(&mut resolver, ctx);
    ctx.output.report(&to_json(&report, args.compact)?);
    Ok(())
}

/// Build-ready view of a document, with the watch list when watching
pub fn report<F: FileSystem>(resolver: &mut ResolverContext<F>, id: DocumentId) -> Value {
    let bundles = resolver.build_ready(id);
    let options = resolver.options();

    let mut report = json!({
        "document": resolver.document_path(id).map(|p| p.as_str()),
        "environment": options.environment.as_str(),
        "theme": options.theme,
        "bundles": bundles,
    });
    if options.watch {
        report["watch"] = json!(WatchList::collect(&bundles));
    }
    report
}
