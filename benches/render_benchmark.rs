//! Performance benchmarks for dirscribe
//!
//! Measures the two halves of a rebuild cycle in isolation on synthetic
//! trees of increasing size.
//!
//! **Benchmarks Included:**
//! - `build_tree`: filtered directory walk at 100, 1000 and 5000 files
//! - `render`: tree rendering of the same snapshots, with and without glyphs
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                       # Run all benchmarks
//! cargo bench -- build_tree         # Walk only
//! cargo bench -- render             # Rendering only
//! ```

use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dirscribe::render::render;
use dirscribe::watcher::{build_tree, VisibilityFilter};
use dirscribe::Config;
use tempfile::TempDir;

const EXTENSIONS: &[&str] = &["py", "rs", "md", "json", "pyc", "txt"];

/// Lay out `files` files spread over nested directories, plus an ignored
/// `node_modules` tree.
fn create_tree(files: usize) -> TempDir {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = tmp.path();

    for i in 0..files {
        let dir = root
            .join(format!("pkg_{}", i % 10))
            .join(format!("mod_{}", i % 7));
        fs::create_dir_all(&dir).expect("failed to create dir");
        let ext = EXTENSIONS[i % EXTENSIONS.len()];
        fs::write(dir.join(format!("file_{i}.{ext}")), "").expect("failed to write file");
    }

    let ignored = root.join("node_modules").join("left-pad");
    fs::create_dir_all(&ignored).expect("failed to create dir");
    for i in 0..50 {
        fs::write(ignored.join(format!("index_{i}.js")), "").expect("failed to write file");
    }

    tmp
}

fn filter() -> VisibilityFilter {
    VisibilityFilter::from_config(&Config::default()).expect("default config is valid")
}

fn bench_build_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_tree");
    group.sample_size(10);

    for size in [100, 1000, 5000] {
        let tmp = create_tree(size);
        let filter = filter();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| build_tree(black_box(tmp.path()), &filter).expect("walk failed"));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [100, 1000, 5000] {
        let tmp = create_tree(size);
        let snapshot = snapshot(tmp.path());

        for use_emojis in [false, true] {
            let config = Config {
                use_emojis,
                ..Default::default()
            };
            let id = BenchmarkId::new(if use_emojis { "glyphs" } else { "plain" }, size);
            group.bench_with_input(id, &snapshot, |b, root| {
                b.iter(|| render(black_box(root), &config));
            });
        }
    }

    group.finish();
}

fn snapshot(root: &Path) -> dirscribe::watcher::PathEntry {
    build_tree(root, &filter()).expect("walk failed").root
}

criterion_group!(benches, bench_build_tree, bench_render);
criterion_main!(benches);
