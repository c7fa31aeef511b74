use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use stellers::{ForceConfig, FrameInput, Link, Node, StabilizationEngine};
use std::hint::black_box;
use std::time::Duration;

/// `side x side` jammed lattice at 12px spacing with horizontal and vertical springs at rest.
fn build_engine(name: &str, side: usize) -> StabilizationEngine {
    let id = |row: usize, col: usize| format!("{name}_{row}_{col}");
    let mut nodes = Vec::with_capacity(side * side);
    let mut links = Vec::new();
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for row in 0..side {
        for col in 0..side {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let jitter = (state >> 40) as f64 / (1u64 << 24) as f64 - 0.5;
            nodes.push(
                Node::new(id(row, col), col as f64 * 12.0, row as f64 * 12.0)
                    .with_velocity(0.2 * jitter, -0.1 * jitter),
            );
            if col > 0 {
                links.push(Link::new(id(row, col - 1), id(row, col)).with_length(12.0));
            }
            if row > 0 {
                links.push(Link::new(id(row - 1, col), id(row, col)).with_length(12.0));
            }
        }
    }
    StabilizationEngine::with_graph(ForceConfig::default(), nodes, &links)
        .unwrap_or_else(|e| panic!("bench graph {name}: {e}"))
}

fn bench_frame_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("stellers_frame_step");
    group.sample_size(30);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for side in [10usize, 20, 30] {
        let name = format!("lattice_{side}x{side}");
        group.bench_with_input(BenchmarkId::new("hot", &name), &side, |b, &side| {
            b.iter_batched(
                || build_engine("hot", side),
                |mut engine| {
                    let report = engine.step(FrameInput::default());
                    black_box(report);
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("cooling_run", &name), &side, |b, &side| {
            b.iter_batched(
                || build_engine("cool", side),
                |mut engine| {
                    for frame in 0..60 {
                        let input = FrameInput::from_lifecycle(frame as f64 / 60.0, 1.0 / 60.0);
                        black_box(engine.step(input));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_step);
criterion_main!(benches);
