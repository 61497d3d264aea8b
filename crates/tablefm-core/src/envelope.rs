//! Q-shaped ADSR envelope with a trailing Silent stage.
//!
//! The envelope walks a fractional index through one curve table per stage.
//! Each stage lasts `size / step` samples where
//! `step = (ADSR_MAX - time) / STAGE_SCALE`, so a stage time of `0.5` on a
//! 44100-sample table takes about 4433 samples. Stage times near zero give
//! the shortest stages, and a time at or above [`ADSR_MAX`] stops the
//! envelope where it is.
//!
//! Stage values at index `i` of a table of `M` samples:
//!
//! | Stage   | Value                                        |
//! |---------|----------------------------------------------|
//! | Attack  | `attack[i]`                                  |
//! | Decay   | `decay[i] + rv · (i / M)^q_decay`            |
//! | Sustain | `rv`                                         |
//! | Release | `release[i] · rv`                            |
//! | Silent  | `0`                                          |
//!
//! where `rv = sustain · velocity / VELOCITY_MAX`. The decay term starts at
//! `1` and lands exactly on `rv`, so the attack peak flows into the held
//! level without a step.

use alloc::sync::Arc;

use libm::{fmodf, powf};

use crate::table::{CurveQ, EnvelopeCurves};

/// Upper bound of the stage-time scale.
pub const ADSR_MAX: f32 = 100.0;

/// Divisor applied to `ADSR_MAX - time` for every stage.
pub const STAGE_SCALE: f32 = 10.0;

/// Velocity treated as full scale. Larger velocities are clamped.
pub const VELOCITY_MAX: f32 = 128.0;

const DEFAULT_TIME: f32 = 0.5;

/// Envelope stages, in the order they are visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Rising along the attack curve.
    Attack,
    /// Falling from the peak to the sustain level.
    Decay,
    /// Holding the sustain level.
    Sustain,
    /// Falling from the sustain level to zero.
    Release,
    /// Output is zero.
    #[default]
    Silent,
}

/// How the Sustain and Silent stages behave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeMode {
    /// Sustain holds until note-off; Silent is terminal.
    #[default]
    Trigger,
    /// Sustain and Silent last a fixed time, and Silent re-enters Attack
    /// for as long as the note is held.
    Loop,
}

/// Optional envelope features.
///
/// The reduced set keeps linear curves and trigger mode only; calls that need
/// a disabled feature are ignored like any other invalid parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvelopeCapabilities {
    /// Accept curve exponents other than linear.
    pub q_shaping: bool,
    /// Accept [`EnvelopeMode::Loop`].
    pub loop_mode: bool,
}

impl EnvelopeCapabilities {
    /// Every feature enabled.
    pub const FULL: Self = Self {
        q_shaping: true,
        loop_mode: true,
    };

    /// Linear curves, trigger mode only.
    pub const BASIC: Self = Self {
        q_shaping: false,
        loop_mode: false,
    };
}

impl Default for EnvelopeCapabilities {
    fn default() -> Self {
        Self::FULL
    }
}

/// Q-shaped Attack/Decay/Sustain/Release/Silent envelope.
///
/// # Example
///
/// ```rust
/// use tablefm_core::{EnvelopeStage, QAdsrEnvelope};
///
/// let mut env = QAdsrEnvelope::new(100);
/// env.note_on(128.0);
///
/// // (100 - 0.5) / 10 = 9.95 per sample: 11 samples cover the attack table.
/// for _ in 0..11 {
///     env.advance();
/// }
/// assert_eq!(env.stage(), EnvelopeStage::Decay);
///
/// env.note_off();
/// assert_eq!(env.stage(), EnvelopeStage::Release);
/// ```
#[derive(Debug, Clone)]
pub struct QAdsrEnvelope {
    curves: Arc<EnvelopeCurves>,
    table_size: usize,
    capabilities: EnvelopeCapabilities,

    stage: EnvelopeStage,
    mode: EnvelopeMode,
    phase_index: f32,
    note_held: bool,
    result_volume: f32,

    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,
    silent_time: f32,
    sustain_time: f32,
}

impl QAdsrEnvelope {
    /// Envelope with every feature enabled.
    ///
    /// Defaults: all stage times and the sustain level at `0.5`, linear
    /// curves, trigger mode, starting Silent.
    pub fn new(table_size: usize) -> Self {
        Self::with_capabilities(table_size, EnvelopeCapabilities::FULL)
    }

    /// Envelope restricted to `capabilities`.
    pub fn with_capabilities(table_size: usize, capabilities: EnvelopeCapabilities) -> Self {
        let table_size = table_size.max(1);
        Self {
            curves: Arc::new(EnvelopeCurves::generate(table_size, CurveQ::LINEAR)),
            table_size,
            capabilities,
            stage: EnvelopeStage::Silent,
            mode: EnvelopeMode::Trigger,
            phase_index: 0.0,
            note_held: false,
            result_volume: 0.0,
            attack_time: DEFAULT_TIME,
            decay_time: DEFAULT_TIME,
            sustain_level: DEFAULT_TIME,
            release_time: DEFAULT_TIME,
            silent_time: DEFAULT_TIME,
            sustain_time: DEFAULT_TIME,
        }
    }

    /// Start a note.
    ///
    /// Velocity is clamped to `[0, VELOCITY_MAX]` and fixes the held level at
    /// `sustain · velocity / VELOCITY_MAX`. A NaN velocity is ignored.
    pub fn note_on(&mut self, velocity: f32) {
        if velocity.is_nan() {
            return;
        }
        let velocity = velocity.clamp(0.0, VELOCITY_MAX);
        self.result_volume = self.sustain_level * velocity / VELOCITY_MAX;
        self.stage = EnvelopeStage::Attack;
        self.phase_index = 0.0;
        self.note_held = true;
    }

    /// Release the note.
    ///
    /// Trigger mode always enters Release. Loop mode enters Release unless it
    /// is already Silent, where it simply stops looping.
    pub fn note_off(&mut self) {
        let release = match self.mode {
            EnvelopeMode::Trigger => true,
            EnvelopeMode::Loop => self.stage != EnvelopeStage::Silent,
        };
        if release {
            self.stage = EnvelopeStage::Release;
        }
        self.phase_index = 0.0;
        self.note_held = false;
    }

    /// Value at the current position, in `[0, 1]`.
    #[inline]
    pub fn value(&self) -> f32 {
        let index = (self.phase_index as usize).min(self.table_size - 1);
        match self.stage {
            EnvelopeStage::Attack => self.curves.attack()[index],
            EnvelopeStage::Decay => {
                let x = index as f32 / self.table_size as f32;
                let tail = self.result_volume * powf(x, self.curves.q().decay);
                (self.curves.decay()[index] + tail).clamp(0.0, 1.0)
            }
            EnvelopeStage::Sustain => self.result_volume,
            EnvelopeStage::Release => self.curves.release()[index] * self.result_volume,
            EnvelopeStage::Silent => 0.0,
        }
    }

    /// Return the current value and move one sample forward.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let value = self.value();
        self.step();
        value
    }

    /// Multiply `input` by the envelope into `output`.
    ///
    /// Positions past the end of `input` read as silence.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (i, out) in output.iter_mut().enumerate() {
            let x = input.get(i).copied().unwrap_or(0.0);
            *out = x * self.advance();
        }
    }

    /// Multiply `buffer` by the envelope in place.
    pub fn apply_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.advance();
        }
    }

    /// Per-sample index increment for the current stage.
    ///
    /// Zero means the stage holds: Sustain and Silent in trigger mode, or any
    /// stage whose time is at or above [`ADSR_MAX`].
    pub fn step_size(&self) -> f32 {
        let time = match (self.stage, self.mode) {
            (EnvelopeStage::Attack, _) => self.attack_time,
            (EnvelopeStage::Decay, _) => self.decay_time,
            (EnvelopeStage::Release, _) => self.release_time,
            (EnvelopeStage::Sustain, EnvelopeMode::Loop) => self.sustain_time,
            (EnvelopeStage::Silent, EnvelopeMode::Loop) => self.silent_time,
            (EnvelopeStage::Sustain | EnvelopeStage::Silent, EnvelopeMode::Trigger) => {
                return 0.0;
            }
        };
        ((ADSR_MAX - time) / STAGE_SCALE).max(0.0)
    }

    #[inline]
    fn step(&mut self) {
        let step = self.step_size();
        if step <= 0.0 {
            return;
        }
        let size = self.table_size as f32;
        self.phase_index += step;
        if self.phase_index >= size {
            self.phase_index -= size;
            if self.phase_index >= size {
                self.phase_index = fmodf(self.phase_index, size);
            }
            self.next_stage();
        }
    }

    fn next_stage(&mut self) {
        self.stage = match self.stage {
            EnvelopeStage::Attack => EnvelopeStage::Decay,
            EnvelopeStage::Decay => EnvelopeStage::Sustain,
            EnvelopeStage::Sustain => EnvelopeStage::Release,
            EnvelopeStage::Release => EnvelopeStage::Silent,
            EnvelopeStage::Silent => {
                if self.mode == EnvelopeMode::Loop && self.note_held {
                    EnvelopeStage::Attack
                } else {
                    EnvelopeStage::Silent
                }
            }
        };
    }

    /// Update stage times and sustain level.
    ///
    /// Each component is taken separately and only if valid: attack, decay
    /// and release in `(0, 1]`, sustain in `[0, 1]`. The held level of a
    /// sounding note is fixed at note-on and does not follow later sustain
    /// changes.
    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        let time_ok = |t: f32| t > 0.0 && t <= 1.0;
        if time_ok(attack) {
            self.attack_time = attack;
        }
        if time_ok(decay) {
            self.decay_time = decay;
        }
        if (0.0..=1.0).contains(&sustain) {
            self.sustain_level = sustain;
        }
        if time_ok(release) {
            self.release_time = release;
        }
    }

    /// Rebuild the stage curves with new exponents.
    ///
    /// Components `<= 0` keep their previous exponent. Allocates; use
    /// [`swap_curves`](Self::swap_curves) from the audio thread.
    pub fn set_q(&mut self, attack: f32, decay: f32, release: f32) {
        if !self.capabilities.q_shaping {
            return;
        }
        let q = self.curves.q().merged(attack, decay, release);
        self.curves = Arc::new(EnvelopeCurves::generate(self.table_size, q));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            q_attack = q.attack,
            q_decay = q.decay,
            q_release = q.release,
            "envelope curves regenerated"
        );
    }

    /// Install pre-built curves without allocating.
    ///
    /// Returns whichever curves are no longer in use: the previous set on
    /// success, or `curves` itself when it is the wrong length or needs
    /// disabled Q shaping.
    pub fn swap_curves(&mut self, curves: Arc<EnvelopeCurves>) -> Arc<EnvelopeCurves> {
        let shape_ok = self.capabilities.q_shaping || curves.q() == CurveQ::LINEAR;
        if curves.len() == self.table_size && shape_ok {
            core::mem::replace(&mut self.curves, curves)
        } else {
            curves
        }
    }

    /// Switch between trigger and loop behavior. The current stage is kept.
    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        if mode == EnvelopeMode::Loop && !self.capabilities.loop_mode {
            return;
        }
        self.mode = mode;
    }

    /// Set the loop-mode Silent and Sustain durations.
    ///
    /// Each is taken only if `> 0`, on the same scale as the stage times.
    pub fn set_silent_and_sustain_time(&mut self, silent: f32, sustain: f32) {
        if !self.capabilities.loop_mode {
            return;
        }
        if silent > 0.0 {
            self.silent_time = silent;
        }
        if sustain > 0.0 {
            self.sustain_time = sustain;
        }
    }

    /// Force the envelope to Silent and drop any held note.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Silent;
        self.phase_index = 0.0;
        self.note_held = false;
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current mode.
    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    /// True between note-on and note-off.
    pub fn is_note_held(&self) -> bool {
        self.note_held
    }

    /// True unless Silent.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Silent
    }

    /// Fractional position within the current stage's table.
    pub fn phase_index(&self) -> f32 {
        self.phase_index
    }

    /// Held level computed at the last note-on.
    pub fn result_volume(&self) -> f32 {
        self.result_volume
    }

    /// Attack time.
    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    /// Decay time.
    pub fn decay_time(&self) -> f32 {
        self.decay_time
    }

    /// Sustain level.
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// Release time.
    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    /// Loop-mode Silent time.
    pub fn silent_time(&self) -> f32 {
        self.silent_time
    }

    /// Loop-mode Sustain time.
    pub fn sustain_time(&self) -> f32 {
        self.sustain_time
    }

    /// Curve exponents currently in use.
    pub fn q(&self) -> CurveQ {
        self.curves.q()
    }

    /// Curves currently in use.
    pub fn curves(&self) -> &Arc<EnvelopeCurves> {
        &self.curves
    }

    /// Fixed table length.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Enabled features.
    pub fn capabilities(&self) -> EnvelopeCapabilities {
        self.capabilities
    }
}
