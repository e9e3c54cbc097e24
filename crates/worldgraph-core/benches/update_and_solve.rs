//! # Worldgraph Benchmarks
//!
//! Measures the two hot paths on synthetic problems of growing length:
//! - Incremental updates, one transfer per span
//! - Solving the resulting transfer chain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use worldgraph_core::{update_world_model, DeterministicReasoner, Problem, UpdateConfig};

/// A chain of `steps` gifts from Tom to Ann, each span a single transfer.
fn synthetic_problem(steps: usize) -> (Problem, Vec<String>) {
    let mut spans = vec!["Tom has 1000 apples.".to_string()];
    let mut lins = vec!["container ( tom , 1000 , apple , none , none )".to_string()];
    for i in 0..steps {
        spans.push(format!("He gives {} apples to Ann.", i + 1));
        lins.push(format!("transfer ( ann , tom , {} , apple , none , none )", i + 1));
    }
    let question = "How many apples does Tom have?".to_string();
    lins.push("container ( tom , none , apple , none , none )".to_string());
    let problem = Problem::new("bench", spans.join(" "), question, spans);
    (problem, lins)
}

fn parse_all(problem: &mut Problem, lins: &[String]) {
    for lin in lins {
        let _ = update_world_model(problem, lin, &UpdateConfig::default());
    }
}

fn bench_incremental_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_update");

    for size in [10, 50, 200].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (problem, lins) = synthetic_problem(size);
            b.iter(|| {
                let mut p = problem.clone();
                parse_all(&mut p, &lins);
                black_box(p.num_states());
            });
        });
    }

    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    let reasoner = DeterministicReasoner::default();

    for size in [10, 50, 200].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (mut problem, lins) = synthetic_problem(size);
            parse_all(&mut problem, &lins);
            b.iter(|| black_box(reasoner.reason_problem(&problem).ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_incremental_update, bench_solve);
criterion_main!(benches);
