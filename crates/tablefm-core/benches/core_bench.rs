//! Criterion benchmarks for tablefm-core primitives
//!
//! Run with: cargo bench -p tablefm-core

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablefm_core::{CurveQ, EnvelopeCurves, EnvelopeMode, OscMode, Oscillator, QAdsrEnvelope};

const TABLE_SIZE: usize = 44100;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ============================================================================
// Oscillator benchmarks
// ============================================================================

fn bench_oscillator_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillator");

    let modes = [
        ("CarrierNoInput", OscMode::CarrierNoInput),
        ("CarrierWithInput", OscMode::CarrierWithInput),
        ("SumWithInput", OscMode::SumWithInput),
    ];

    for (name, mode) in &modes {
        for &block_size in BLOCK_SIZES {
            let mut osc = Oscillator::new(TABLE_SIZE, 440.0);
            let mut buffer = vec![0.25_f32; block_size];

            group.bench_with_input(BenchmarkId::new(*name, block_size), &block_size, |b, _| {
                b.iter(|| {
                    osc.process_in_place(&mut buffer, *mode);
                    black_box(buffer[0])
                })
            });
        }
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");

    for &block_size in BLOCK_SIZES {
        let mut env = QAdsrEnvelope::new(TABLE_SIZE);
        env.set_q(0.5, 2.0, 3.0);
        env.set_mode(EnvelopeMode::Loop);
        env.note_on(100.0);
        let mut buffer = vec![1.0_f32; block_size];

        group.bench_with_input(BenchmarkId::new("Loop", block_size), &block_size, |b, _| {
            b.iter(|| {
                env.apply_in_place(&mut buffer);
                black_box(buffer[0])
            })
        });
    }

    group.finish();
}

fn bench_curve_generation(c: &mut Criterion) {
    c.bench_function("EnvelopeCurves::generate/44100", |b| {
        let q = CurveQ {
            attack: 0.5,
            decay: 2.0,
            release: 3.0,
        };
        b.iter(|| black_box(EnvelopeCurves::generate(TABLE_SIZE, q)))
    });
}

criterion_group!(benches, bench_oscillator_modes, bench_envelope, bench_curve_generation);
criterion_main!(benches);
