//! Benchmarks for lowering and barrier resolution
//!
//! Run with: cargo bench -p qlane-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use qlane_compile::{Compiler, resolve_barriers};
use qlane_ir::ast::{Expr, Function, LaneBody, Program, Stmt};
use qlane_ir::{BarrierId, BlockId, Instruction, LaneId, LaneSequence};

/// Lanes of `blocks` straight-line blocks with lane-dependent lengths.
fn straight_lanes(num_lanes: u32, blocks: u32) -> Vec<LaneSequence> {
    let members: Vec<LaneId> = (0..num_lanes).map(LaneId).collect();
    (0..num_lanes)
        .map(|lane| {
            let mut seq = LaneSequence::new(LaneId(lane));
            for k in 0..blocks {
                seq.push(Instruction::pulse("X", u64::from(10 + lane * 7 + k)));
                seq.push(Instruction::barrier(BarrierId(k), members.iter().copied()));
            }
            seq
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_barriers");

    for blocks in &[10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("straight", blocks), blocks, |b, &n| {
            let lanes = straight_lanes(8, n);
            b.iter(|| {
                let mut lanes = lanes.clone();
                resolve_barriers(black_box(&mut lanes)).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let lanes: Vec<LaneId> = (0..4).map(LaneId).collect();
    let body = |id: u32| {
        (0..50)
            .map(|k| {
                Stmt::concurrent(
                    BlockId(k),
                    lanes.clone(),
                    vec![
                        Stmt::repeat(4, vec![Stmt::pulse("X90", 20 + u64::from(id))]),
                        Stmt::while_loop(Expr::name("m"), vec![Stmt::pulse("Y90", 10)]),
                    ],
                )
            })
            .collect::<Vec<_>>()
    };
    let program = Program {
        functions: vec![Function::new(
            "bench",
            lanes.iter().map(|l| LaneBody::new(*l, body(l.0))).collect(),
        )],
    };

    c.bench_function("compile_program", |b| {
        let mut compiler = Compiler::default();
        b.iter(|| compiler.compile(black_box(&program)));
    });
}

criterion_group!(benches, bench_resolve, bench_compile);
criterion_main!(benches);
