//! Property-based tests for tablefm-core.
//!
//! Phase accounting, amplitude linearity, envelope range, curve regeneration
//! and per-component parameter acceptance, driven by proptest.

use proptest::prelude::*;
use tablefm_core::{EnvelopeMode, EnvelopeStage, OscMode, Oscillator, QAdsrEnvelope};

fn circular_distance(a: f64, b: f64, period: f64) -> f64 {
    let d = (a - b).rem_euclid(period);
    d.min(period - d)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// After `L` samples in ModulatorNoInput mode the phase equals
    /// `L · f mod T`, however the samples are split into blocks.
    #[test]
    fn phase_tracks_total_samples(
        table_size in 16usize..2048,
        frequency in 0.01f32..64.0,
        blocks in prop::collection::vec(1usize..256, 1..8),
    ) {
        let mut osc = Oscillator::new(table_size, frequency);
        let mut total = 0usize;
        for len in &blocks {
            let mut buf = vec![0.0_f32; *len];
            osc.process(&[], &mut buf, OscMode::ModulatorNoInput);
            total += len;
        }

        let period = table_size as f64;
        let expected = (total as f64 * frequency as f64).rem_euclid(period);
        let tolerance = total as f64 * period * 1.2e-7 + 1e-3;
        let got = osc.phase() as f64;
        prop_assert!(
            circular_distance(got, expected, period) <= tolerance,
            "phase {} expected {} (T={}, f={}, L={})", got, expected, table_size, frequency, total
        );
    }

    /// Output at amplitude `a` is `a` times the output at amplitude 1.
    #[test]
    fn amplitude_is_linear(
        amplitude in 0.0f32..=1.0,
        frequency in 0.1f32..40.0,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
        mode in 0usize..5,
    ) {
        let mode = [
            OscMode::ModulatorNoInput,
            OscMode::ModulatorWithInput,
            OscMode::CarrierNoInput,
            OscMode::CarrierWithInput,
            OscMode::SumWithInput,
        ][mode];

        let mut unit = Oscillator::new(256, frequency);
        let mut scaled = Oscillator::new(256, frequency);
        scaled.set_amplitude(amplitude);

        let mut a = [0.0_f32; 32];
        let mut b = [0.0_f32; 32];
        unit.process(&input, &mut a, mode);
        scaled.process(&input, &mut b, mode);

        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!((x * amplitude - y).abs() <= 1e-6, "{} * {} != {}", x, amplitude, y);
        }
    }

    /// Every stage of every Q shape stays within [0, 1].
    #[test]
    fn envelope_value_in_unit_range(
        q_attack in 0.05f32..8.0,
        q_decay in 0.05f32..8.0,
        q_release in 0.05f32..8.0,
        sustain in 0.0f32..=1.0,
        velocity in 0.0f32..200.0,
        looped in any::<bool>(),
        release_at in 0usize..400,
    ) {
        let mut env = QAdsrEnvelope::new(256);
        env.set_q(q_attack, q_decay, q_release);
        env.set_adsr(0.3, 0.7, sustain, 0.9);
        if looped {
            env.set_mode(EnvelopeMode::Loop);
        }
        env.note_on(velocity);

        for i in 0..600 {
            if i == release_at {
                env.note_off();
            }
            let v = env.advance();
            prop_assert!((0.0..=1.0).contains(&v), "value {} at sample {} in {:?}", v, i, env.stage());
        }
    }

    /// Calling set_q with the current exponents rebuilds identical curves.
    #[test]
    fn set_q_with_same_values_is_idempotent(
        q_attack in 0.05f32..8.0,
        q_decay in 0.05f32..8.0,
        q_release in 0.05f32..8.0,
    ) {
        let mut env = QAdsrEnvelope::new(128);
        env.set_q(q_attack, q_decay, q_release);
        let before = env.curves().clone();

        env.set_q(q_attack, q_decay, q_release);
        let after = env.curves();

        prop_assert!(!std::sync::Arc::ptr_eq(&before, after));
        prop_assert_eq!(before.attack(), after.attack());
        prop_assert_eq!(before.decay(), after.decay());
        prop_assert_eq!(before.release(), after.release());
    }

    /// Each set_adsr component is accepted or rejected on its own.
    #[test]
    fn set_adsr_is_per_component(
        attack in -1.0f32..2.0,
        decay in -1.0f32..2.0,
        sustain in -1.0f32..2.0,
        release in -1.0f32..2.0,
    ) {
        let mut env = QAdsrEnvelope::new(64);
        env.set_adsr(attack, decay, sustain, release);

        let time_ok = |t: f32| t > 0.0 && t <= 1.0;
        prop_assert_eq!(env.attack_time(), if time_ok(attack) { attack } else { 0.5 });
        prop_assert_eq!(env.decay_time(), if time_ok(decay) { decay } else { 0.5 });
        prop_assert_eq!(
            env.sustain_level(),
            if (0.0..=1.0).contains(&sustain) { sustain } else { 0.5 }
        );
        prop_assert_eq!(env.release_time(), if time_ok(release) { release } else { 0.5 });
    }

    /// Without a held note the envelope never leaves Silent.
    #[test]
    fn idle_envelope_stays_silent(samples in 1usize..2000, looped in any::<bool>()) {
        let mut env = QAdsrEnvelope::new(100);
        if looped {
            env.set_mode(EnvelopeMode::Loop);
        }
        for _ in 0..samples {
            prop_assert_eq!(env.advance(), 0.0);
        }
        prop_assert_eq!(env.stage(), EnvelopeStage::Silent);
    }
}
