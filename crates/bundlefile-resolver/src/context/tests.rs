use super::*;
use crate::{FlattenState, ProcessorResolver, WatchList};
use bundlefile_core::{Level, MemoryFileSystem};

fn filesystem(files: &[(&str, &str)]) -> MemoryFileSystem {
    files
        .iter()
        .fold(MemoryFileSystem::new("/site"), |fs, (path, contents)| fs.with_file(path, *contents))
}

fn resolve_with(options: ResolveOptions, files: &[(&str, &str)]) -> (ResolverContext<MemoryFileSystem>, DocumentId) {
    let mut context = ResolverContext::with_fs(options, filesystem(files));
    let id = context.resolve(Utf8Path::new("bundles.yml")).unwrap();
    (context, id)
}

fn resolve(files: &[(&str, &str)]) -> (ResolverContext<MemoryFileSystem>, DocumentId) {
    resolve_with(ResolveOptions::default(), files)
}

fn deps_of(context: &ResolverContext<MemoryFileSystem>, id: DocumentId, name: &str) -> Vec<String> {
    context.document(id).unwrap().variants(name)[0]
        .deps
        .iter()
        .map(|d| d.identity())
        .collect()
}

fn messages(context: &ResolverContext<MemoryFileSystem>, level: Level) -> Vec<String> {
    context
        .diagnostics()
        .at_level(level)
        .map(|d| d.message.clone())
        .collect()
}

fn input_files(resource: &bundlefile_core::ResourceSpec) -> Vec<String> {
    resource.input_files().map(|p| p.absolute.to_string()).collect()
}

#[test]
fn test_dependency_inputs_come_before_own_inputs() {
    let (mut context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  app:
    scripts:
      input: [a.js, b.js]
      output: out.js
    deps: [lib]
  lib:
    scripts: lib.js
"#,
    )]);

    let ready = context.build_ready(id);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "app");

    let scripts = ready[0].scripts.as_ref().unwrap();
    assert_eq!(input_files(scripts), vec!["/site/lib.js", "/site/a.js", "/site/b.js"]);
    assert_eq!(scripts.output.as_ref().unwrap().dev.absolute, "/site/out.js");
    assert!(context.diagnostics().is_empty());
}

#[test]
fn test_output_can_come_from_a_dependency() {
    let (mut context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  app:
    styles: app.css
    deps: [theme]
  theme:
    standalone: false
    styles:
      input: theme.css
      output: {dev: build/site.css, prod: build/site.min.css}
"#,
    )]);

    let ready = context.build_ready(id);
    assert_eq!(ready.len(), 1);
    let styles = ready[0].styles.as_ref().unwrap();
    assert_eq!(input_files(styles), vec!["/site/theme.css", "/site/app.css"]);
    assert_eq!(styles.output.as_ref().unwrap().select(true).absolute, "/site/build/site.min.css");
}

#[test]
fn test_missing_outputs_warned_in_strict_mode() {
    let files = [(
        "bundles.yml",
        r#"
packages:
  app:
    scripts: app.js
    misc: {input: "img/*.png", output: public/img}
    deps: [lib]
  lib:
    standalone: false
    scripts: lib.js
"#,
    )];

    let (mut quiet, id) = resolve(&files);
    let ready = quiet.build_ready(id);
    assert_eq!(ready.len(), 1);
    assert!(ready[0].scripts.is_none());
    assert_eq!(ready[0].misc.len(), 1);
    assert!(quiet.diagnostics().is_empty());

    let (mut strict, id) = resolve_with(ResolveOptions::default().strict(true), &files);
    strict.build_ready(id);
    let warnings = messages(&strict, Level::Warning);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("Dependency 'lib' defines 'scripts' input"));
    assert!(warnings[1].contains("Input 'scripts' have been defined with no output"));
}

#[test]
fn test_bundles_without_resources_are_excluded() {
    let (mut context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  empty:
    deps: [lib]
  lib:
    scripts: lib.js
"#,
    )]);
    assert!(context.build_ready(id).is_empty());
}

#[test]
fn test_duplicate_requirements_keep_newest_requested() {
    let (context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  A:
    - version: "1.0"
      scripts: a1.js
    - version: "2.0"
      scripts: a2.js
  app:
    deps: ["A#1.0", "A#2.0", "A", "other"]
    scripts: app.js
  other:
    deps: ["A#1.0"]
    scripts: other.js
"#,
    )]);

    assert_eq!(deps_of(&context, id, "app"), vec!["A#2.0", "other"]);
    assert_eq!(deps_of(&context, id, "other"), vec!["A#1.0"]);
}

#[test]
fn test_unconstrained_request_picks_newest() {
    let (context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  lib:
    - {version: "1.0", scripts: lib-1.0.js}
    - {version: "1.2", scripts: lib-1.2.js}
    - {version: "2.0", scripts: lib-2.0.js}
  pinned: {deps: ["lib#1.0"], scripts: p.js}
  latest: {deps: [lib], scripts: l.js}
"#,
    )]);

    let key = |name: &str| BundleKey::new(id, name, 0);
    assert_eq!(context.resolved_dependencies(&key("pinned")), vec![BundleKey::new(id, "lib", 0)]);
    assert_eq!(context.resolved_dependencies(&key("latest")), vec![BundleKey::new(id, "lib", 2)]);
}

#[test]
fn test_theme_falls_back_to_default() {
    let (context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  ui:
    - scripts: ui.js
    - theme: dark
      scripts: ui-dark.js
  app:
    deps: ["ui:light", "ui:dark"]
    scripts: app.js
"#,
    )]);

    let document = context.document(id).unwrap();
    assert_eq!(document.variants("ui")[0].theme.as_deref(), Some("default"));
    assert_eq!(
        context.resolved_dependencies(&BundleKey::new(id, "app", 0)),
        vec![BundleKey::new(id, "ui", 0), BundleKey::new(id, "ui", 1)]
    );
}

#[test]
fn test_missing_dependency_is_reported_and_skipped() {
    let (context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  app:
    deps: [lib, "lib#9", ghost]
    scripts: app.js
  lib:
    scripts: lib.js
"#,
    )]);

    assert_eq!(deps_of(&context, id, "app"), vec!["lib"]);
    let errors: Vec<_> = context.diagnostics().errors().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("'lib' (version '9' theme 'none') not found"));
    assert!(errors[1].message.contains("'ghost'"));
    assert_eq!(errors[0].context.as_deref(), Some("bundles.yml→packages→app→deps→1"));
    assert_eq!(errors[1].context.as_deref(), Some("bundles.yml→packages→app→deps→2"));
}

#[test]
fn test_dependency_cycle_completes_with_warning() {
    let (context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  a: {scripts: a.js, deps: [b]}
  b: {scripts: b.js, deps: [c]}
  c: {scripts: c.js, deps: [a]}
"#,
    )]);

    let warnings = messages(&context, Level::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("a -> b -> c -> a"));

    assert_eq!(deps_of(&context, id, "a"), vec!["c", "b"]);
    assert_eq!(deps_of(&context, id, "b"), vec!["a", "c"]);
    assert_eq!(deps_of(&context, id, "c"), vec!["a"]);
}

#[test]
fn test_flattening_is_idempotent() {
    let (mut context, id) = resolve(&[(
        "bundles.yml",
        r#"
packages:
  app: {scripts: app.js, deps: [mid]}
  mid: {scripts: mid.js, deps: [base]}
  base: {scripts: base.js}
"#,
    )]);

    let before = deps_of(&context, id, "app");
    assert_eq!(before, vec!["base", "mid"]);
    assert_eq!(context.flatten(&BundleKey::new(id, "app", 0)), FlattenState::Flattened);
    assert_eq!(deps_of(&context, id, "app"), before);

    // Resolving the same root again reuses the cached document
    let again = context.resolve(Utf8Path::new("/site/bundles.yml")).unwrap();
    assert_eq!(again, id);
    assert_eq!(context.documents().count(), 1);
}

#[test]
fn test_external_dependency() {
    let (mut context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
packages:
  app:
    scripts: {input: app.js, output: out.js}
    deps: ["vendor/jquery.yml#jquery", "vendor/jquery.yml#jquery.ui"]
"#,
        ),
        (
            "vendor/jquery.yml",
            r#"
packages:
  jquery: {scripts: jquery.js}
  jquery.ui: {scripts: ui.js, deps: [jquery]}
"#,
        ),
    ]);

    let vendor = context.document_id(Utf8Path::new("/site/vendor/jquery.yml")).unwrap();
    assert_eq!(vendor, DocumentId(2));
    assert_eq!(context.state(vendor), Some(LoadState::Loaded));

    let ready = context.build_ready(id);
    let scripts = ready[0].scripts.as_ref().unwrap();
    assert_eq!(
        input_files(scripts),
        vec!["/site/vendor/jquery.js", "/site/vendor/ui.js", "/site/app.js"]
    );
}

#[test]
fn test_undecodable_document_fails_without_aborting() {
    let (context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
packages:
  app: {scripts: app.js, deps: ["broken.yml#x", "broken.yml#y"]}
"#,
        ),
        ("broken.yml", "packages: [unclosed"),
    ]);

    assert!(deps_of(&context, id, "app").is_empty());
    let broken = context.document_id(Utf8Path::new("/site/broken.yml")).unwrap();
    assert_eq!(context.state(broken), Some(LoadState::Failed));
    assert!(context.document(broken).is_none());

    // Decoded once, then served from cache as failed
    let errors = messages(&context, Level::Error);
    assert_eq!(errors.iter().filter(|m| m.contains("Failed to decode")).count(), 1);
    assert_eq!(errors.iter().filter(|m| m.contains("Failed to load package file")).count(), 2);
}

#[test]
fn test_missing_root_is_an_error() {
    let mut context = ResolverContext::with_fs(ResolveOptions::default(), filesystem(&[]));
    let err = context.resolve(Utf8Path::new("nowhere.yml")).unwrap_err();
    assert!(matches!(err, BundleError::DocumentNotLoaded { .. }));
    assert!(!err.is_fatal());
    assert_eq!(context.diagnostics().errors().count(), 1);
}

#[test]
fn test_imported_conflict_keeps_first_copy() {
    let (context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
imports: [one.yml, two.yml, same.yml]
packages:
  app: {scripts: {input: app.js, output: out.js}, deps: [shared]}
"#,
        ),
        ("one.yml", "packages:\n  shared: {scripts: one.js}\n"),
        ("two.yml", "packages:\n  shared: {scripts: two.js}\n"),
        ("same.yml", "packages:\n  shared: {scripts: one.js}\n"),
    ]);

    let warnings = messages(&context, Level::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Two bundles named 'shared'"));
    assert!(warnings[0].contains("different content"));
    assert!(warnings[0].contains("/site/one.yml"));
    assert!(warnings[0].contains("/site/two.yml"));

    let shared = context.document(id).unwrap().variants("shared");
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].owner, id);
    assert_eq!(shared[0].original_owner, DocumentId(2));
    assert_eq!(input_files(shared[0].scripts.as_ref().unwrap()), vec!["/site/one.js"]);
    assert_eq!(deps_of(&context, id, "app"), vec!["shared"]);
}

#[test]
fn test_imported_local_bundles_keep_their_owner() {
    let (mut context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
imports: lib.yml
packages:
  app: {scripts: {input: app.js, output: out.js}, deps: [widget]}
  sneaky: {scripts: s.js, deps: [helper]}
"#,
        ),
        (
            "lib.yml",
            r#"
packages:
  "@helper": {scripts: helper.js}
  widget: {scripts: widget.js, deps: [helper]}
"#,
        ),
    ]);

    let lib = DocumentId(2);
    let document = context.document(id).unwrap();
    assert_eq!(document.variants("helper")[0].owner, lib);
    assert_eq!(document.variants("widget")[0].owner, id);

    let ready = context.build_ready(id);
    let app = ready.iter().find(|b| b.name == "app").unwrap();
    assert_eq!(
        input_files(app.scripts.as_ref().unwrap()),
        vec!["/site/helper.js", "/site/widget.js", "/site/app.js"]
    );

    // Local bundles of another document are not visible by name
    let errors = messages(&context, Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'helper'"));
}

#[test]
fn test_themed_import_applies_default_theme() {
    let (context, id) = resolve(&[
        (
            "bundles.yml",
            "imports: dark.yml\npackages:\n  ui: {styles: ui.css}\n",
        ),
        ("dark.yml", "packages:\n  ui: {theme: dark, styles: ui-dark.css}\n"),
    ]);

    let themes: Vec<_> = context
        .document(id)
        .unwrap()
        .variants("ui")
        .iter()
        .map(|b| b.theme.clone().unwrap())
        .collect();
    assert_eq!(themes, vec!["default", "dark"]);
}

#[test]
fn test_circular_imports_complete_with_warning() {
    let (context, id) = resolve(&[
        ("bundles.yml", "imports: other.yml\npackages:\n  x: {scripts: x.js}\n"),
        ("other.yml", "imports: bundles.yml\npackages:\n  y: {scripts: y.js}\n"),
    ]);

    let warnings = messages(&context, Level::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Circular import detected"));
    assert!(warnings[0].contains("/site/bundles.yml -> /site/other.yml -> /site/bundles.yml"));

    let document = context.document(id).unwrap();
    assert_eq!(document.variants("x").len(), 1);
    assert_eq!(document.variants("y").len(), 1);
    let other = context.document(DocumentId(2)).unwrap();
    assert_eq!(other.variants("x").len(), 1);
}

#[test]
fn test_cross_document_cycle_is_flattened_once_loaded() {
    let (context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
packages:
  x: {scripts: x.js, deps: ["other.yml#y"]}
  z: {scripts: z.js}
"#,
        ),
        ("other.yml", "packages:\n  y: {scripts: y.js, deps: [\"bundles.yml#z\"]}\n"),
    ]);

    assert_eq!(deps_of(&context, id, "x"), vec!["z", "y"]);
    assert_eq!(deps_of(&context, DocumentId(2), "y"), vec!["z"]);
    assert_eq!(messages(&context, Level::Warning).len(), 1);
    assert!(messages(&context, Level::Error).is_empty());
}

#[test]
fn test_bundles_waiting_on_a_loading_document_keep_transitive_deps() {
    let (context, id) = resolve(&[
        (
            "bundles.yml",
            r#"
packages:
  x: {scripts: x.js, deps: ["other.yml#y"]}
  z: {scripts: z.js}
"#,
        ),
        (
            "other.yml",
            r#"
packages:
  y: {scripts: y.js, deps: ["bundles.yml#z"]}
  w: {scripts: w.js, deps: [y]}
"#,
        ),
    ]);

    let other = DocumentId(2);
    assert_eq!(deps_of(&context, id, "x"), vec!["z", "y"]);
    assert_eq!(deps_of(&context, other, "y"), vec!["z"]);
    assert_eq!(deps_of(&context, other, "w"), vec!["z", "y"]);
    assert!(context
        .documents()
        .flat_map(|doc| doc.iter_bundles())
        .all(|bundle| bundle.deps_flattened));
    assert_eq!(messages(&context, Level::Warning).len(), 1);
    assert!(messages(&context, Level::Error).is_empty());
}

#[test]
fn test_registering_a_taken_id_for_another_path_is_fatal() {
    let (mut context, id) = resolve(&[("bundles.yml", "packages:\n  app: {scripts: app.js}\n")]);

    assert!(context.register(id, Utf8Path::new("/site/bundles.yml")).is_ok());
    let err = context.register(id, Utf8Path::new("/site/other.yml")).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        BundleError::DuplicateDocumentId { id: 1, ref existing, ref path }
            if existing == "/site/bundles.yml" && path == "/site/other.yml"
    ));
    assert_eq!(context.documents().count(), 1);
}

#[test]
fn test_debug_mode_logs_dependency_decisions() {
    let (context, _) = resolve_with(
        ResolveOptions::default().debug(true),
        &[("bundles.yml", "packages:\n  app: {scripts: a.js, deps: [lib]}\n  lib: {scripts: l.js}\n")],
    );

    let infos = messages(&context, Level::Info);
    assert!(infos.iter().any(|m| m.contains("Bundle 'app' requires 'lib'")));
    assert!(infos.iter().any(|m| m.starts_with("Resolved as 'lib'")));
    assert!(infos.iter().any(|m| m == "Dependencies of 'app': [lib]"));
}

#[test]
fn test_watch_list() {
    let (mut context, id) = resolve_with(
        ResolveOptions::default().watch(true),
        &[(
            "bundles.yml",
            r#"
packages:
  app:
    scripts:
      input: [a.js, b.js]
      output: out.js
      watch: "src/**/*.js"
    styles:
      input: app.css
      output: out.css
      autoWatch: false
"#,
        )],
    );

    let watch = WatchList::collect(&context.build_ready(id));
    assert_eq!(watch.get("scripts"), ["/site/src/**/*.js", "/site/a.js", "/site/b.js"]);
    assert!(watch.get("styles").is_empty());
    assert!(watch.get("misc").is_empty());
}

#[test]
fn test_processor_plan_uses_document_declarations() {
    let (mut context, id) = resolve(&[(
        "bundles.yml",
        r#"
processors:
  - {name: minify, callback: uglify, extensions: [js]}
packages:
  app:
    scripts:
      input: [lib.ts, a.js, b.js]
      output: out.js
"#,
    )]);

    let ready = context.build_ready(id);
    let scripts = ready[0].scripts.as_ref().unwrap();
    let mut processors = ProcessorResolver::from_context(&context);

    let err = processors.plan(scripts).unwrap_err();
    assert!(matches!(err, BundleError::UnknownProcessor { ref name } if name == "uglify"));

    processors.register_callback("uglify");
    let batches = processors.plan(scripts).unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].steps[0].callback, "typescript");
    assert_eq!(batches[1].files, vec!["/site/a.js", "/site/b.js"]);
    assert_eq!(batches[1].steps[0].callback, "uglify");
}
