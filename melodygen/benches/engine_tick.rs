//! Criterion benchmarks for the sequencer engine
//!
//! Run with: cargo bench -p melodygen
//!
//! Measures per-tick cost of `SequencerEngine::process` under a fast clock,
//! with the modifiers off and with every modifier active.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use melodygen::render::ClockDriver;
use melodygen::scale::ScaleId;
use melodygen::{Configuration, EngineSettings, SequencerEngine};

const SAMPLE_RATE: f32 = 48000.0;
const FRAMES_PER_ITER: u64 = 480; // 10ms worth

fn engine() -> SequencerEngine {
    SequencerEngine::new(EngineSettings {
        sample_rate: SAMPLE_RATE,
        guard_window_octaves: 6.0,
        seed: Some(0x5eed),
        ..Default::default()
    })
    .unwrap()
}

/// Run N ticks against the clock
#[inline(always)]
fn process_frames(
    engine: &mut SequencerEngine,
    config: Configuration,
    clock: &ClockDriver,
    n: u64,
) {
    for i in 0..n {
        let out = engine.process(clock.trigger_at(i), config);
        black_box(out);
    }
}

fn bench_configs(c: &mut Criterion) {
    // 120-sample period: four rising and four falling edges per iteration.
    let clock = ClockDriver::new(120, 0.5);

    let plain = Configuration {
        scale_index: ScaleId::Major.index(),
        octave_range: 3,
        disjunction: 0.5,
        ..Default::default()
    };
    let busy = Configuration {
        rest_probability: 0.2,
        trill_probability: 0.3,
        repeat_probability: 0.5,
        root_gravity: 0.3,
        trill_rate: 9.0,
        ..plain
    };

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(FRAMES_PER_ITER));
    for (name, config) in [("plain", plain), ("all_modifiers", busy)] {
        group.bench_with_input(BenchmarkId::new("process", name), &config, |b, &config| {
            let mut engine = engine();
            b.iter(|| process_frames(&mut engine, config, &clock, FRAMES_PER_ITER))
        });
    }
    group.finish();
}

fn bench_idle(c: &mut Criterion) {
    let config = Configuration::default();
    let mut engine = engine();
    c.bench_function("engine/idle_low", |b| {
        b.iter(|| {
            for _ in 0..FRAMES_PER_ITER {
                black_box(engine.process(black_box(0.0), config));
            }
        })
    });
}

criterion_group!(benches, bench_configs, bench_idle);
criterion_main!(benches);
