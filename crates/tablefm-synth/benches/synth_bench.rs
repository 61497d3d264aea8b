//! Criterion benchmarks for tablefm-synth components
//!
//! Run with: cargo bench -p tablefm-synth

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablefm_synth::{
    Algorithm, AlgorithmRouter, EngineConfig, FmEngine, SlotId, SlotTarget, VoiceManager,
};

const TABLE_SIZE: usize = 44100;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ============================================================================
// Router benchmarks
// ============================================================================

fn full_router(algorithm: Algorithm) -> AlgorithmRouter {
    let mut router = AlgorithmRouter::new(TABLE_SIZE, 440.0);
    router.set_algorithm_kind(algorithm);
    for slot in SlotId::ALL {
        router.set_active(SlotTarget::Oscillator(slot), true);
        router.set_active(SlotTarget::Envelope(slot), true);
    }
    router.note_on(440.0, 100.0);
    router
}

fn bench_router_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Router");

    for algorithm in Algorithm::ALL {
        for &block_size in BLOCK_SIZES {
            let mut router = full_router(algorithm);
            let mut buffer = vec![0.0_f32; block_size];

            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        router.process_in_place(&mut buffer);
                        black_box(buffer[0])
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_engine_with_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    for &block_size in BLOCK_SIZES {
        let (mut engine, handle) = FmEngine::new(EngineConfig::default());
        let mut buffer = vec![0.0_f32; block_size];
        let mut frequency = 440.0;

        group.bench_with_input(
            BenchmarkId::new("MasterFrequencySweep", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    frequency = if frequency > 880.0 { 440.0 } else { frequency * 1.01 };
                    let _ = handle.set_master_frequency(frequency);
                    engine.process_in_place(&mut buffer);
                    black_box(buffer[0])
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Voice pool benchmarks
// ============================================================================

fn bench_voice_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("VoiceManager");

    for &block_size in BLOCK_SIZES {
        let mut pool: VoiceManager<8> = VoiceManager::new(TABLE_SIZE, TABLE_SIZE);
        pool.set_mod_amplitude(0.5);
        let mut buffer = vec![0.0_f32; block_size];

        group.bench_with_input(BenchmarkId::new("8Voices", block_size), &block_size, |b, _| {
            b.iter(|| {
                while pool.active_voice_count() < 8 {
                    pool.note_on(220.0 + pool.active_voice_count() as f32 * 55.0, 100.0);
                }
                pool.process(&mut buffer);
                black_box(buffer[0])
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_router_algorithms,
    bench_engine_with_commands,
    bench_voice_pool
);
criterion_main!(benches);
