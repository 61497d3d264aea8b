//! Property-based tests for tablefm-synth.
//!
//! Output range of the router under arbitrary routing, and pool bookkeeping
//! of the voice manager, driven by proptest.

use proptest::prelude::*;
use tablefm_synth::{AlgorithmRouter, SlotId, SlotTarget, VoiceManager};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// With input in [-1, 1], every routing keeps output within
    /// master amplitude.
    #[test]
    fn router_output_within_master_amplitude(
        algorithm in 1u8..=4,
        master_amp in 0.0f32..=1.0,
        osc_active in prop::array::uniform4(any::<bool>()),
        env_active in prop::array::uniform4(any::<bool>()),
        factors in prop::array::uniform4(0.1f32..8.0),
        amps in prop::array::uniform4(0.0f32..=1.0),
        input in prop::collection::vec(-1.0f32..=1.0, 256),
    ) {
        let mut router = AlgorithmRouter::new(1024, 5.0);
        router.set_algorithm(algorithm);
        router.set_master_amplitude(master_amp);
        for (i, slot) in SlotId::ALL.into_iter().enumerate() {
            router.set_active(SlotTarget::Oscillator(slot), osc_active[i]);
            router.set_active(SlotTarget::Envelope(slot), env_active[i]);
            router.set_oscillator_frequency_factor(slot, factors[i]);
            router.set_oscillator_amplitude(slot, amps[i]);
        }
        router.note_on(5.0, 100.0);

        let mut out = vec![0.0_f32; input.len()];
        router.process(&input, &mut out);
        for s in &out {
            prop_assert!(s.is_finite());
            prop_assert!(s.abs() <= master_amp + 1e-6, "{} exceeds {}", s, master_amp);
        }
    }

    /// The pool never reports more voices than it has, and every note is
    /// either placed or counted as dropped.
    #[test]
    fn pool_accounts_for_every_note(
        notes in prop::collection::vec((0.5f32..50.0, 0.0f32..128.0, 0usize..64), 1..40),
    ) {
        let mut pool: VoiceManager<8> = VoiceManager::new(512, 100);
        let mut placed = 0u64;
        let mut block = [0.0_f32; 64];
        for (freq, vel, gap) in notes.iter().copied() {
            if pool.note_on(freq, vel).is_some() {
                placed += 1;
            }
            pool.process(&mut block[..gap]);
            prop_assert!(pool.active_voice_count() <= 8);
            prop_assert!(block[..gap].iter().all(|s| s.abs() <= 8.0));
        }
        prop_assert_eq!(placed + pool.dropped_notes(), notes.len() as u64);
    }
}
