// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks for catalog fingerprinting and profile naming.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use dtg_core::{ToolCatalog, ToolDescriptor};
use dtg_profile::{compute_fingerprint, generate_profile_name};
use serde_json::json;

/// Build a catalog of `n` tools with nested schemas.
fn make_catalog(n: usize) -> ToolCatalog {
    (0..n)
        .map(|i| {
            ToolDescriptor::new(
                format!("self.device{}.action{i}", i % 7),
                json!({
                    "type": "object",
                    "properties": {
                        "level": {"type": "integer", "minimum": 0, "maximum": 100},
                        "mode": {"type": "string", "enum": ["auto", "manual"]},
                    },
                    "required": ["level"],
                }),
            )
            .with_description(format!("action {i}"))
        })
        .collect()
}

fn bench_fingerprint_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_by_catalog_size");

    for size in [0, 10, 100, 500] {
        let catalog = make_catalog(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, cat| {
            b.iter(|| compute_fingerprint(black_box(cat)));
        });
    }

    group.finish();
}

fn bench_profile_name(c: &mut Criterion) {
    let catalog = make_catalog(50);
    c.bench_function("profile_name_50_tools", |b| {
        b.iter(|| generate_profile_name(black_box(&catalog)));
    });
}

criterion_group!(benches, bench_fingerprint_sizes, bench_profile_name);
criterion_main!(benches);
