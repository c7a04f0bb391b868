//! Criterion benchmarks for the block scheduler (`partita-core::graph`).
//!
//! Measures per-block `update()` cost with a trivial gain module, so the
//! numbers are dominated by action draining, task submission and pool
//! hand-off. Three topologies at several worker counts:
//!
//! - **Chain** - every module depends on the previous one (no parallelism)
//! - **Diamond** - one source fanning out to parallel gains, merged by one sum
//! - **Wide** - independent sources with no dependencies
//!
//! Run with: `cargo bench -p partita-core -- scheduler/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use partita_core::{AudioProcessor, MAX_MODULE_INPUTS, Module, ModuleInputs, PoolParty};

const BLOCK_SIZE: usize = 256;
const THREAD_COUNTS: &[usize] = &[1, 2, 4];

// ---------------------------------------------------------------------------
// Trivial modules
// ---------------------------------------------------------------------------

struct Gain(f32);

impl Module for Gain {
    fn commit(&mut self) {}

    fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        for (out, &x) in output.iter_mut().zip(inputs[0]) {
            *out = x * self.0 + 1.0;
        }
    }
}

struct Sum;

impl Module for Sum {
    fn commit(&mut self) {}

    fn sample(&mut self, inputs: &ModuleInputs<'_>, output: &mut [f32]) {
        output.fill(0.0);
        for input in inputs {
            for (out, &x) in output.iter_mut().zip(*input) {
                *out += x;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

fn chain(threads: usize, length: usize) -> AudioProcessor {
    let processor = AudioProcessor::with_threads(threads).unwrap();
    let mut previous = processor.add_module(Box::new(Gain(0.5)));
    for _ in 1..length {
        let next = processor.add_module(Box::new(Gain(0.5)));
        processor.route(previous).to(next);
        previous = next;
    }
    processor
}

fn diamond(threads: usize, width: usize) -> AudioProcessor {
    let processor = AudioProcessor::with_threads(threads).unwrap();
    let source = processor.add_module(Box::new(Gain(1.0)));
    let sum = processor.add_module(Box::new(Sum));
    for slot in 0..width.min(MAX_MODULE_INPUTS) {
        let branch = processor.add_module(Box::new(Gain(0.25)));
        processor.route(source).to(branch);
        processor.route(branch).to_slot(sum, slot);
    }
    processor
}

fn wide(threads: usize, count: usize) -> AudioProcessor {
    let processor = AudioProcessor::with_threads(threads).unwrap();
    for _ in 0..count {
        processor.add_module(Box::new(Gain(0.5)));
    }
    processor
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_topologies(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/update");

    for &threads in THREAD_COUNTS {
        let builders: [(&str, fn(usize, usize) -> AudioProcessor, usize); 3] =
            [("chain", chain, 16), ("diamond", diamond, 16), ("wide", wide, 16)];
        for (name, build, size) in builders {
            let mut processor = build(threads, size);
            processor.update(BLOCK_SIZE);
            group.bench_with_input(
                BenchmarkId::new(name, format!("{threads}t")),
                &BLOCK_SIZE,
                |b, &block| {
                    b.iter(|| processor.update(black_box(block)));
                },
            );
        }
    }

    group.finish();
}

fn bench_pool_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/pool");

    for &workers in THREAD_COUNTS {
        let mut pool = PoolParty::new();
        pool.setup(workers).unwrap();
        group.bench_function(BenchmarkId::new("empty_items_32", workers), |b| {
            b.iter(|| {
                for _ in 0..32 {
                    pool.add_work(|| {});
                }
                pool.work();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_topologies, bench_pool_batch);
criterion_main!(benches);
