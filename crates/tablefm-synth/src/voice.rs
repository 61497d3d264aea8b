//! Polyphonic backing voices with a shared modulator and a baked envelope.
//!
//! Each [`Voice`] is a bare carrier phase plus a position in one pre-baked
//! ADSR curve shared by the whole pool. A single sine modulator, also shared,
//! bends every carrier:
//!
//! ```text
//! carrier_increment = (1 + mod_amplitude · modulator[mod_phase]) · voice.frequency
//! ```
//!
//! A voice plays its curve once from start to end and frees itself when it
//! runs off the end. There is no gate: notes are one-shots.

use alloc::sync::Arc;
use alloc::vec::Vec;

use libm::powf;
use tablefm_core::{VELOCITY_MAX, WaveTable, table, wrap_phase};

/// Convert a MIDI note number to frequency in Hz (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * powf(2.0, (note as f32 - 69.0) / 12.0)
}

/// Convert Hz to a per-sample phase increment for a table of `table_size`
/// samples played at `sample_rate`.
#[inline]
pub fn hz_to_increment(hz: f32, table_size: usize, sample_rate: f32) -> f32 {
    hz * table_size as f32 / sample_rate
}

/// What happens when every voice is busy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceAllocationMode {
    /// Drop the new note and count it (default).
    #[default]
    Drop,
    /// Restart the voice that was triggered longest ago.
    StealOldest,
}

/// Relative stage lengths and sustain level of the baked curve.
///
/// Attack, decay and release share the curve length in proportion to their
/// values; the curve rises to 1, falls to `sustain`, then falls to 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveShape {
    /// Attack share, in `(0, 1]`.
    pub attack: f32,
    /// Decay share, in `(0, 1]`.
    pub decay: f32,
    /// Level reached at the end of decay, in `[0, 1]`.
    pub sustain: f32,
    /// Release share, in `(0, 1]`.
    pub release: f32,
}

impl Default for CurveShape {
    fn default() -> Self {
        Self {
            attack: 0.5,
            decay: 0.5,
            sustain: 0.5,
            release: 0.5,
        }
    }
}

impl CurveShape {
    /// Returns a copy taking each valid component.
    pub fn merged(self, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let share = |new: f32, old: f32| if new > 0.0 && new <= 1.0 { new } else { old };
        Self {
            attack: share(attack, self.attack),
            decay: share(decay, self.decay),
            sustain: if (0.0..=1.0).contains(&sustain) {
                sustain
            } else {
                self.sustain
            },
            release: share(release, self.release),
        }
    }

    /// Bake the curve into `len` samples.
    pub fn bake(self, len: usize) -> Vec<f32> {
        let Self {
            attack: a,
            decay: d,
            sustain: s,
            release: r,
        } = self;
        let total = a + d + r;
        table::build(len, |x| {
            let t = x * total;
            let y = if t < a {
                t / a
            } else if t < a + d {
                1.0 + (s - 1.0) * (t - a) / d
            } else {
                s * (1.0 - (t - a - d) / r)
            };
            y.clamp(0.0, 1.0)
        })
    }
}

/// One backing voice.
#[derive(Clone, Debug, Default)]
pub struct Voice {
    frequency: f32,
    velocity: f32,
    carrier_phase: f32,
    envelope_index: usize,
    occupied: bool,
    age: u64,
}

impl Voice {
    fn start(&mut self, frequency: f32, velocity: f32, age: u64) {
        self.frequency = frequency;
        self.velocity = velocity;
        self.carrier_phase = 0.0;
        self.envelope_index = 0;
        self.occupied = true;
        self.age = age;
    }

    /// Per-sample carrier increment before modulation.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Gain in `[0, 1]`, normalized from the note-on velocity.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Carrier phase in table samples.
    pub fn carrier_phase(&self) -> f32 {
        self.carrier_phase
    }

    /// Position in the baked curve.
    pub fn envelope_index(&self) -> usize {
        self.envelope_index
    }

    /// True while the voice is sounding.
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Allocation order stamp; higher is newer.
    pub fn age(&self) -> u64 {
        self.age
    }
}

/// Fixed pool of `N` backing voices.
///
/// # Example
///
/// ```rust
/// use tablefm_synth::VoiceManager;
///
/// let mut pool: VoiceManager<8> = VoiceManager::new(1024, 4096);
/// pool.set_mod_amplitude(0.3);
/// assert_eq!(pool.note_on(10.0, 100.0), Some(0));
///
/// let mut block = [0.0_f32; 64];
/// pool.process(&mut block);
/// assert_eq!(pool.active_voice_count(), 1);
/// ```
#[derive(Debug)]
pub struct VoiceManager<const N: usize> {
    voices: [Voice; N],
    carrier: WaveTable,
    modulator: WaveTable,
    table_size: usize,
    mod_phase: f32,
    mod_frequency: f32,
    mod_amplitude: f32,
    curve: Arc<[f32]>,
    shape: CurveShape,
    allocation_mode: VoiceAllocationMode,
    age_counter: u64,
    dropped_notes: u64,
}

impl<const N: usize> VoiceManager<N> {
    /// Pool over sine carrier and modulator tables of `table_size` samples,
    /// with a baked curve of `curve_len` samples.
    ///
    /// The modulator starts at increment 100 with zero depth.
    pub fn new(table_size: usize, curve_len: usize) -> Self {
        let table_size = table_size.max(1);
        let shape = CurveShape::default();
        let sine = WaveTable::sine(table_size);
        Self {
            voices: core::array::from_fn(|_| Voice::default()),
            carrier: sine.clone(),
            modulator: sine,
            table_size,
            mod_phase: 0.0,
            mod_frequency: 100.0,
            mod_amplitude: 0.0,
            curve: shape.bake(curve_len.max(1)).into(),
            shape,
            allocation_mode: VoiceAllocationMode::Drop,
            age_counter: 0,
            dropped_notes: 0,
        }
    }

    /// Start a note on the first free voice.
    ///
    /// `frequency` is a per-sample increment and must be `> 0`; `velocity`
    /// is clamped to `[0, VELOCITY_MAX]`. Returns the voice index, or `None`
    /// if the parameters are invalid or the pool is full and the note was
    /// dropped.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) -> Option<usize> {
        if !(frequency.is_finite() && frequency > 0.0) || velocity.is_nan() {
            return None;
        }
        let index = self.allocate_voice()?;
        self.age_counter += 1;
        let gain = velocity.clamp(0.0, VELOCITY_MAX) / VELOCITY_MAX;
        self.voices[index].start(frequency, gain, self.age_counter);
        Some(index)
    }

    fn allocate_voice(&mut self) -> Option<usize> {
        if let Some(free) = self.voices.iter().position(|v| !v.occupied) {
            return Some(free);
        }
        match self.allocation_mode {
            VoiceAllocationMode::Drop => {
                self.dropped_notes += 1;
                #[cfg(feature = "tracing")]
                tracing::debug!(dropped = self.dropped_notes, "voice pool full, note dropped");
                None
            }
            VoiceAllocationMode::StealOldest => self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.age)
                .map(|(i, _)| i),
        }
    }

    /// Produce the next mixed sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let size = self.table_size as f32;
        let mod_index = (self.mod_phase as usize).min(self.table_size - 1);
        let bend = 1.0 + self.mod_amplitude * self.modulator.get(mod_index);
        self.mod_phase = wrap_phase(self.mod_phase + self.mod_frequency, size);

        let mut out = 0.0;
        for voice in self.voices.iter_mut().filter(|v| v.occupied) {
            let index = (voice.carrier_phase as usize).min(self.table_size - 1);
            let sample = self.carrier.get(index);
            voice.carrier_phase = wrap_phase(voice.carrier_phase + bend * voice.frequency, size);

            out += sample * voice.velocity * self.curve[voice.envelope_index];
            voice.envelope_index += 1;
            if voice.envelope_index >= self.curve.len() {
                voice.occupied = false;
            }
        }
        out
    }

    /// Overwrite `output` with the mix of all sounding voices.
    pub fn process(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Set the shared modulator's per-sample increment. Ignored unless `> 0`.
    pub fn set_mod_frequency(&mut self, frequency: f32) {
        if frequency.is_finite() && frequency > 0.0 {
            self.mod_frequency = frequency;
        }
    }

    /// Set modulation depth. Ignored unless in `[0, 1)`.
    pub fn set_mod_amplitude(&mut self, amplitude: f32) {
        if (0.0..1.0).contains(&amplitude) {
            self.mod_amplitude = amplitude;
        }
    }

    /// Re-bake the shared curve from new stage shares and sustain level.
    ///
    /// Components are accepted one by one. Allocates; from the audio thread
    /// use [`swap_curve`](Self::swap_curve) with a curve baked elsewhere.
    pub fn update_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.shape = self.shape.merged(attack, decay, sustain, release);
        self.curve = self.shape.bake(self.curve.len()).into();
    }

    /// Install a curve baked elsewhere. Returns the curve no longer in use.
    ///
    /// Sounding voices keep their index; one that is now past the end of a
    /// shorter curve frees itself on its next sample. An empty curve is
    /// handed straight back.
    pub fn swap_curve(&mut self, curve: Arc<[f32]>, shape: CurveShape) -> Arc<[f32]> {
        if curve.is_empty() {
            return curve;
        }
        for voice in &mut self.voices {
            if voice.envelope_index >= curve.len() {
                voice.envelope_index = curve.len() - 1;
            }
        }
        self.shape = shape;
        core::mem::replace(&mut self.curve, curve)
    }

    /// Silence every voice immediately.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.occupied = false;
        }
    }

    /// Silence every voice and rewind the modulator and counters.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            *voice = Voice::default();
        }
        self.mod_phase = 0.0;
        self.age_counter = 0;
        self.dropped_notes = 0;
    }

    /// Set what happens when the pool is full.
    pub fn set_allocation_mode(&mut self, mode: VoiceAllocationMode) {
        self.allocation_mode = mode;
    }

    /// Current allocation mode.
    pub fn allocation_mode(&self) -> VoiceAllocationMode {
        self.allocation_mode
    }

    /// Pool size.
    pub fn voice_count(&self) -> usize {
        N
    }

    /// Number of sounding voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.occupied).count()
    }

    /// Notes dropped because the pool was full, since construction or reset.
    pub fn dropped_notes(&self) -> u64 {
        self.dropped_notes
    }

    /// All voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// The baked curve.
    pub fn curve(&self) -> &[f32] {
        &self.curve
    }

    /// Shape the curve was baked from.
    pub fn shape(&self) -> CurveShape {
        self.shape
    }

    /// Modulator increment.
    pub fn mod_frequency(&self) -> f32 {
        self.mod_frequency
    }

    /// Modulation depth.
    pub fn mod_amplitude(&self) -> f32 {
        self.mod_amplitude
    }

    /// Carrier and modulator table length.
    pub fn table_size(&self) -> usize {
        self.table_size
    }
}
