//! Common utilities for benchmarks

use bundlefile_core::MemoryFileSystem;
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use std::fmt::Write;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// YAML document declaring `count` bundles, each depending on the previous one
pub fn chain_document(count: usize) -> String {
    let mut yaml = String::from("packages:\n");
    for i in 0..count {
        let _ = writeln!(yaml, "  b{}:", i);
        let _ = writeln!(yaml, "    scripts: {{input: [src/b{0}.ts, src/b{0}.js], output: build/b{0}.js}}", i);
        if i > 0 {
            let _ = writeln!(yaml, "    deps: [b{}]", i - 1);
        }
    }
    yaml
}

/// `count` documents, each importing the next and declaring one bundle
/// depending on the bundle of the next document
pub fn import_chain(count: usize) -> MemoryFileSystem {
    let mut fs = MemoryFileSystem::new("/site");
    for i in 0..count {
        let name = if i == 0 {
            "bundles.yml".to_string()
        } else {
            format!("doc{}.yml", i)
        };
        let mut yaml = String::new();
        if i + 1 < count {
            let _ = writeln!(yaml, "imports: doc{}.yml", i + 1);
        }
        let _ = writeln!(yaml, "packages:\n  d{}:\n    styles: d{}.css", i, i);
        if i + 1 < count {
            let _ = writeln!(yaml, "    deps: [d{}]", i + 1);
        }
        fs = fs.with_file(name, yaml);
    }
    fs
}

/// Document declaring one bundle with `count` versioned variants
pub fn versioned_document(count: usize) -> String {
    let mut yaml = String::from("packages:\n  lib:\n");
    for i in 0..count {
        let _ = writeln!(yaml, "    - {{version: \"{}.{}\", scripts: lib-{}.js}}", i / 10, i % 10, i);
    }
    yaml.push_str("  app:\n    deps: [lib]\n");
    yaml
}
