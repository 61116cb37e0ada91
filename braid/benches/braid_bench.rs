//! Benchmarks for the braided tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dysni_braid::BraidedTree;

/// Blocking-key-like strings: six letters, many shared prefixes.
fn generate_keys(count: usize) -> Vec<String> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|_| {
            (0..6)
                .map(|_| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                    (b'a' + ((state >> 33) % 26) as u8) as char
                })
                .collect()
        })
        .collect()
}

fn build(keys: &[String]) -> BraidedTree<String, usize> {
    let mut tree = BraidedTree::new();
    for (i, k) in keys.iter().enumerate() {
        tree.insert(k.clone(), i);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("braid_insert");
    for size in [1_000, 10_000, 100_000].iter() {
        let keys = generate_keys(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(build(&keys)));
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let keys = generate_keys(100_000);
    let tree = build(&keys);
    c.bench_function("braid_find_100k", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 7919) % keys.len();
            black_box(tree.find(keys[i].as_str()))
        });
    });
}

fn bench_neighbor_walk(c: &mut Criterion) {
    let keys = generate_keys(100_000);
    let tree = build(&keys);
    c.bench_function("braid_walk_10_each_side", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 7919) % keys.len();
            let Some(node) = tree.find(keys[i].as_str()) else {
                return 0;
            };
            let mut seen = node.values().len();
            let mut cur = node;
            for _ in 0..10 {
                match cur.prev() {
                    Some(p) => {
                        seen += p.values().len();
                        cur = p;
                    }
                    None => break,
                }
            }
            let mut cur = node;
            for _ in 0..10 {
                match cur.next() {
                    Some(n) => {
                        seen += n.values().len();
                        cur = n;
                    }
                    None => break,
                }
            }
            black_box(seen)
        });
    });
}

fn bench_delete(c: &mut Criterion) {
    let keys = generate_keys(10_000);
    c.bench_function("braid_delete_10k", |b| {
        b.iter_with_setup(
            || build(&keys),
            |mut tree| {
                for (i, k) in keys.iter().enumerate() {
                    tree.delete(k.as_str(), &i);
                }
                black_box(tree)
            },
        );
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_find,
    bench_neighbor_walk,
    bench_delete
);
criterion_main!(benches);
