//! Trace ingestion benchmarks
//!
//! Measures parsing one rank document and loading a whole directory of
//! rank files (parallel read, sequential merge).
//!
//! Run with: cargo bench --bench ingest_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lbscope::ingest::{load_directory, parse_rank_trace, DEFAULT_FILE_STEM};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

/// Rank document with `objects` tasks per phase and a ring of messages
fn rank_document(rank: u64, n_ranks: u64, objects: u64, phases: u64) -> Value {
    let base = rank * objects;
    let phases: Vec<Value> = (0..phases)
        .map(|phase| {
            let tasks: Vec<Value> = (0..objects)
                .map(|k| {
                    json!({
                        "node": rank,
                        "time": 1.0 + ((k + phase) % 7) as f64,
                        "entity": {"type": "object", "id": base + k, "home": rank, "migratable": k % 4 != 0},
                        "user_defined": {"slot": k}
                    })
                })
                .collect();
            let next = ((rank + 1) % n_ranks) * objects;
            let communications: Vec<Value> = (0..objects)
                .map(|k| {
                    json!({"type": "SendRecv", "bytes": 8.0, "from": {"id": base + k}, "to": {"id": next + k}})
                })
                .collect();
            json!({"id": phase, "tasks": tasks, "communications": communications})
        })
        .collect();
    json!({"metadata": {"rank": rank}, "phases": phases})
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rank");

    for objects in [100u64, 1_000] {
        let text = rank_document(0, 1, objects, 4).to_string();
        group.bench_with_input(BenchmarkId::from_parameter(objects), &text, |b, text| {
            b.iter(|| black_box(parse_rank_trace(0, text)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_load_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_directory");
    group.sample_size(20);

    for n_ranks in [4u64, 16] {
        let temp_dir = TempDir::new().unwrap();
        for rank in 0..n_ranks {
            let path = temp_dir
                .path()
                .join(format!("{}.{}.json", DEFAULT_FILE_STEM, rank));
            fs::write(path, rank_document(rank, n_ranks, 200, 4).to_string()).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(n_ranks), &temp_dir, |b, dir| {
            b.iter(|| black_box(load_directory(dir.path(), DEFAULT_FILE_STEM, None)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_load_directory);
criterion_main!(benches);
