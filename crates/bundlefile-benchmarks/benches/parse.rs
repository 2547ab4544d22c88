//! Document decoding and version parsing benchmarks
//!
//! Benchmarks decoding the same bundle declarations written as YAML, JSON
//! and TOML, and lenient version parsing.

use bundlefile_benchmarks::{chain_document, criterion_config};
use bundlefile_config::decode_document;
use bundlefile_core::Version;
use camino::Utf8Path;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

/// Benchmark decoding documents of each supported format
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [10, 100, 500].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        let yaml = chain_document(*count);
        group.bench_with_input(BenchmarkId::new("yaml", count), &yaml, |b, content| {
            b.iter(|| black_box(decode_document(Utf8Path::new("bundles.yml"), content).unwrap()));
        });

        let json = create_json_content(*count);
        group.bench_with_input(BenchmarkId::new("json", count), &json, |b, content| {
            b.iter(|| black_box(decode_document(Utf8Path::new("bundles.json"), content).unwrap()));
        });

        let toml = create_toml_content(*count);
        group.bench_with_input(BenchmarkId::new("toml", count), &toml, |b, content| {
            b.iter(|| black_box(decode_document(Utf8Path::new("bundles.toml"), content).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark lenient version parsing and comparison
fn bench_versions(c: &mut Criterion) {
    let mut group = c.benchmark_group("versions");
    let inputs: Vec<String> = (0..1000)
        .map(|i| match i % 4 {
            0 => format!("{}.{}.{}", i / 100, i / 10 % 10, i % 10),
            1 => format!("v{}.{}", i / 10, i % 10),
            2 => format!("{}.x", i),
            _ => format!("{}-beta", i),
        })
        .collect();

    group.bench_function("parse_lenient", |b| {
        let mut index = 0;
        b.iter(|| {
            let input = &inputs[index % inputs.len()];
            index += 1;
            black_box(Version::parse_lenient(input))
        });
    });

    let versions: Vec<Version> = inputs.iter().map(|i| Version::parse_lenient(i).0).collect();
    group.bench_function("compare", |b| {
        b.iter(|| {
            versions
                .windows(2)
                .filter(|pair| pair[0].satisfies(&pair[1]))
                .count()
        });
    });

    group.finish();
}

fn create_json_content(count: usize) -> String {
    let packages: Vec<String> = (0..count)
        .map(|i| {
            let deps = if i > 0 {
                format!(r#", "deps": ["b{}"]"#, i - 1)
            } else {
                String::new()
            };
            format!(
                r#""b{0}": {{"scripts": {{"input": ["src/b{0}.ts", "src/b{0}.js"], "output": "build/b{0}.js"}}{1}}}"#,
                i, deps
            )
        })
        .collect();
    format!(r#"{{"packages": {{{}}}}}"#, packages.join(", "))
}

fn create_toml_content(count: usize) -> String {
    let mut toml = String::new();
    for i in 0..count {
        let _ = writeln!(toml, "[packages.b{}]", i);
        if i > 0 {
            let _ = writeln!(toml, "deps = [\"b{}\"]", i - 1);
        }
        let _ = writeln!(toml, "[packages.b{}.scripts]", i);
        let _ = writeln!(toml, "input = [\"src/b{0}.ts\", \"src/b{0}.js\"]", i);
        let _ = writeln!(toml, "output = \"build/b{}.js\"\n", i);
    }
    toml
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_decode, bench_versions
}
criterion_main!(benches);
