//! Four-slot FM algorithm router.
//!
//! The router owns four [`Slot`]s, each an oscillator and an envelope with
//! separate on/off switches, and runs them in fixed order over one running
//! buffer. The selected [`Algorithm`] decides how each slot's oscillator
//! treats the buffer it receives:
//!
//! ```text
//! Algorithm   slot 1           slot 2       slot 3       slot 4
//! 1           Carrier          Mod(in)      Mod(in)      Mod(in)
//! 2           Carrier          Sum(in)      Mod(in)      Mod(in)
//! 3           Carrier          Sum(in)      Sum(in)      Mod(in)
//! 4           Carrier          Sum(in)      Sum(in)      Sum(in)
//! ```
//!
//! `Mod(in)` lets the previous stage bend the slot's phase increment,
//! `Sum(in)` averages the slot's table with the previous stage. A slot's
//! envelope only runs while its oscillator does. After the last slot the
//! whole block is scaled by the master amplitude.

use alloc::sync::Arc;

use tablefm_core::{
    EnvelopeCapabilities, EnvelopeCurves, EnvelopeMode, OscMode, Oscillator, QAdsrEnvelope,
    TableError, WaveTable,
};

/// Number of oscillator/envelope slots.
pub const SLOT_COUNT: usize = 4;

/// One of the four routing topologies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Carrier followed by three chained modulators.
    #[default]
    Cascade,
    /// Carrier summed with slot 2, then two modulators.
    SumThenCascade,
    /// Carrier summed with slots 2 and 3, then one modulator.
    DoubleSumThenModulate,
    /// All four slots summed.
    Additive,
}

impl Algorithm {
    /// All algorithms in id order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Cascade,
        Algorithm::SumThenCascade,
        Algorithm::DoubleSumThenModulate,
        Algorithm::Additive,
    ];

    const ROUTES: [[OscMode; SLOT_COUNT]; 4] = [
        [
            OscMode::CarrierNoInput,
            OscMode::ModulatorWithInput,
            OscMode::ModulatorWithInput,
            OscMode::ModulatorWithInput,
        ],
        [
            OscMode::CarrierNoInput,
            OscMode::SumWithInput,
            OscMode::ModulatorWithInput,
            OscMode::ModulatorWithInput,
        ],
        [
            OscMode::CarrierNoInput,
            OscMode::SumWithInput,
            OscMode::SumWithInput,
            OscMode::ModulatorWithInput,
        ],
        [
            OscMode::CarrierNoInput,
            OscMode::SumWithInput,
            OscMode::SumWithInput,
            OscMode::SumWithInput,
        ],
    ];

    /// Algorithm for a numeric id in `1..=4`.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=4 => Some(Self::ALL[usize::from(id - 1)]),
            _ => None,
        }
    }

    /// Numeric id in `1..=4`.
    pub fn id(self) -> u8 {
        match self {
            Algorithm::Cascade => 1,
            Algorithm::SumThenCascade => 2,
            Algorithm::DoubleSumThenModulate => 3,
            Algorithm::Additive => 4,
        }
    }

    /// Oscillator mode for each slot, in processing order.
    pub fn modes(self) -> [OscMode; SLOT_COUNT] {
        Self::ROUTES[usize::from(self.id() - 1)]
    }

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Cascade => "cascade",
            Algorithm::SumThenCascade => "sum-then-cascade",
            Algorithm::DoubleSumThenModulate => "double-sum-then-modulate",
            Algorithm::Additive => "additive",
        }
    }
}

/// A slot number in `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    /// Slot 1.
    pub const ONE: Self = Self(1);
    /// Slot 2.
    pub const TWO: Self = Self(2);
    /// Slot 3.
    pub const THREE: Self = Self(3);
    /// Slot 4.
    pub const FOUR: Self = Self(4);

    /// All slots in processing order.
    pub const ALL: [SlotId; SLOT_COUNT] = [Self::ONE, Self::TWO, Self::THREE, Self::FOUR];

    /// Slot for `id` in `1..=4`.
    pub fn new(id: u8) -> Option<Self> {
        (1..=4).contains(&id).then_some(Self(id))
    }

    /// Slot number in `1..=4`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based array position.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

/// The oscillator or the envelope of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotTarget {
    /// A slot's oscillator.
    Oscillator(SlotId),
    /// A slot's envelope.
    Envelope(SlotId),
}

impl SlotTarget {
    /// Decode a flat control id: `1..=4` are oscillators, `11..=14` are
    /// envelopes. Anything else is `None`.
    pub fn from_raw(id: u8) -> Option<Self> {
        match id {
            1..=4 => SlotId::new(id).map(SlotTarget::Oscillator),
            11..=14 => SlotId::new(id - 10).map(SlotTarget::Envelope),
            _ => None,
        }
    }

    /// Flat control id.
    pub fn raw(self) -> u8 {
        match self {
            SlotTarget::Oscillator(slot) => slot.get(),
            SlotTarget::Envelope(slot) => slot.get() + 10,
        }
    }
}

/// An oscillator/envelope pair with independent on/off switches.
#[derive(Debug, Clone)]
pub struct Slot {
    oscillator: Oscillator,
    envelope: QAdsrEnvelope,
    oscillator_active: bool,
    envelope_active: bool,
}

impl Slot {
    fn new(table_size: usize, master_frequency: f32, caps: EnvelopeCapabilities) -> Self {
        Self {
            oscillator: Oscillator::new(table_size, master_frequency),
            envelope: QAdsrEnvelope::with_capabilities(table_size, caps),
            oscillator_active: false,
            envelope_active: false,
        }
    }

    /// The slot's oscillator.
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// The slot's envelope.
    pub fn envelope(&self) -> &QAdsrEnvelope {
        &self.envelope
    }

    /// True if the oscillator runs.
    pub fn is_oscillator_active(&self) -> bool {
        self.oscillator_active
    }

    /// True if the envelope is switched on. It only runs while the
    /// oscillator does.
    pub fn is_envelope_active(&self) -> bool {
        self.envelope_active
    }

    fn process_in_place(&mut self, buffer: &mut [f32], mode: OscMode) {
        if !self.oscillator_active {
            return;
        }
        self.oscillator.process_in_place(buffer, mode);
        if self.envelope_active {
            self.envelope.apply_in_place(buffer);
        }
    }
}

/// Monophonic four-slot FM voice.
///
/// # Example
///
/// ```rust
/// use tablefm_synth::{AlgorithmRouter, SlotId, SlotTarget};
///
/// let mut router = AlgorithmRouter::new(44100, 440.0);
/// router.toggle_active(SlotTarget::Oscillator(SlotId::TWO));
/// router.set_oscillator_frequency_factor(SlotId::TWO, 2.0);
/// router.set_algorithm(4);
///
/// let mut block = [0.0_f32; 64];
/// router.process_in_place(&mut block);
/// ```
#[derive(Debug, Clone)]
pub struct AlgorithmRouter {
    slots: [Slot; SLOT_COUNT],
    algorithm: Algorithm,
    master_frequency: f32,
    master_amplitude: f32,
    table_size: usize,
}

impl AlgorithmRouter {
    /// Router with every envelope feature enabled.
    ///
    /// Slot 1's oscillator starts active; every other oscillator and every
    /// envelope starts inactive. Algorithm 1, master amplitude 1.
    pub fn new(table_size: usize, master_frequency: f32) -> Self {
        Self::with_capabilities(table_size, master_frequency, EnvelopeCapabilities::FULL)
    }

    /// Router whose envelopes are restricted to `caps`.
    pub fn with_capabilities(
        table_size: usize,
        master_frequency: f32,
        caps: EnvelopeCapabilities,
    ) -> Self {
        let table_size = table_size.max(1);
        let mut slots: [Slot; SLOT_COUNT] =
            core::array::from_fn(|_| Slot::new(table_size, master_frequency, caps));
        slots[0].oscillator_active = true;

        Self {
            slots,
            algorithm: Algorithm::Cascade,
            master_frequency: if master_frequency.is_finite() && master_frequency > 0.0 {
                master_frequency
            } else {
                0.0
            },
            master_amplitude: 1.0,
            table_size,
        }
    }

    /// Run the active slots over `input`, writing the result to `output`.
    ///
    /// `output` decides the block length; `input` samples beyond it are
    /// ignored and missing ones read as silence.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        output[n..].fill(0.0);
        self.process_in_place(output);
    }

    /// Run the active slots with `buffer` as both input and output.
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        let modes = self.algorithm.modes();
        for (slot, mode) in self.slots.iter_mut().zip(modes) {
            slot.process_in_place(buffer, mode);
        }
        let gain = self.master_amplitude;
        for sample in buffer.iter_mut() {
            *sample *= gain;
        }
    }

    /// Retune to `frequency` and start every envelope at `velocity`.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) {
        self.set_master_frequency(frequency);
        for slot in &mut self.slots {
            slot.envelope.note_on(velocity);
        }
    }

    /// Release every envelope.
    pub fn note_off(&mut self) {
        for slot in &mut self.slots {
            slot.envelope.note_off();
        }
    }

    /// Set one slot's frequency to `factor · master`. Ignored unless
    /// `factor > 0`.
    pub fn set_oscillator_frequency_factor(&mut self, slot: SlotId, factor: f32) {
        let master = self.master_frequency;
        self.slots[slot.index()]
            .oscillator
            .set_frequency_factor(master, factor);
    }

    /// Set one slot's oscillator gain. Ignored unless in `[0, 1]`.
    pub fn set_oscillator_amplitude(&mut self, slot: SlotId, amplitude: f32) {
        self.slots[slot.index()].oscillator.set_amplitude(amplitude);
    }

    /// Retune every slot to its factor times `frequency`. Ignored unless
    /// `frequency > 0`.
    pub fn set_master_frequency(&mut self, frequency: f32) {
        if !(frequency.is_finite() && frequency > 0.0) {
            return;
        }
        self.master_frequency = frequency;
        for slot in &mut self.slots {
            let factor = slot.oscillator.frequency_factor();
            slot.oscillator.set_frequency_factor(frequency, factor);
        }
    }

    /// Set the output gain. Ignored unless in `[0, 1]`.
    pub fn set_master_amplitude(&mut self, amplitude: f32) {
        if (0.0..=1.0).contains(&amplitude) {
            self.master_amplitude = amplitude;
        }
    }

    /// See [`QAdsrEnvelope::set_adsr`].
    pub fn set_envelope(
        &mut self,
        slot: SlotId,
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    ) {
        self.slots[slot.index()]
            .envelope
            .set_adsr(attack, decay, sustain, release);
    }

    /// See [`QAdsrEnvelope::set_q`]. Allocates.
    pub fn set_envelope_q(&mut self, slot: SlotId, attack: f32, decay: f32, release: f32) {
        self.slots[slot.index()].envelope.set_q(attack, decay, release);
    }

    /// See [`QAdsrEnvelope::set_mode`].
    pub fn set_envelope_mode(&mut self, slot: SlotId, mode: EnvelopeMode) {
        self.slots[slot.index()].envelope.set_mode(mode);
    }

    /// See [`QAdsrEnvelope::set_silent_and_sustain_time`].
    pub fn set_silent_time(&mut self, slot: SlotId, silent: f32, sustain_loop: f32) {
        self.slots[slot.index()]
            .envelope
            .set_silent_and_sustain_time(silent, sustain_loop);
    }

    /// Select the algorithm by id. Ids outside `1..=4` are ignored.
    pub fn set_algorithm(&mut self, id: u8) {
        if let Some(algorithm) = Algorithm::from_id(id) {
            self.algorithm = algorithm;
        }
    }

    /// Select the algorithm.
    pub fn set_algorithm_kind(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    /// Replace a slot's waveform with host samples. Allocates.
    ///
    /// On error the slot keeps its current waveform.
    pub fn load_wave_table(&mut self, slot: SlotId, samples: &[f32]) -> Result<(), TableError> {
        let result = self.slots[slot.index()].oscillator.load_table(samples);
        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::warn!(slot = slot.get(), %err, "wave table rejected");
        }
        result
    }

    /// Install a pre-built waveform. Returns the table no longer in use.
    pub fn swap_wave_table(&mut self, slot: SlotId, table: WaveTable) -> WaveTable {
        self.slots[slot.index()].oscillator.swap_table(table)
    }

    /// Install pre-built envelope curves. Returns the curves no longer in use.
    pub fn swap_envelope_curves(
        &mut self,
        slot: SlotId,
        curves: Arc<EnvelopeCurves>,
    ) -> Arc<EnvelopeCurves> {
        self.slots[slot.index()].envelope.swap_curves(curves)
    }

    /// Restore a slot's sine waveform. Allocates.
    pub fn reset_waveform(&mut self, slot: SlotId) {
        self.slots[slot.index()].oscillator.reset_waveform();
    }

    /// Flip one oscillator or envelope on or off.
    pub fn toggle_active(&mut self, target: SlotTarget) {
        let active = !self.is_active(target);
        self.set_active(target, active);
    }

    /// Switch one oscillator or envelope on or off.
    pub fn set_active(&mut self, target: SlotTarget, active: bool) {
        match target {
            SlotTarget::Oscillator(slot) => self.slots[slot.index()].oscillator_active = active,
            SlotTarget::Envelope(slot) => self.slots[slot.index()].envelope_active = active,
        }
    }

    /// True if the target is switched on.
    pub fn is_active(&self, target: SlotTarget) -> bool {
        match target {
            SlotTarget::Oscillator(slot) => self.slots[slot.index()].oscillator_active,
            SlotTarget::Envelope(slot) => self.slots[slot.index()].envelope_active,
        }
    }

    /// One slot.
    pub fn slot(&self, slot: SlotId) -> &Slot {
        &self.slots[slot.index()]
    }

    /// A slot's oscillator.
    pub fn oscillator(&self, slot: SlotId) -> &Oscillator {
        &self.slots[slot.index()].oscillator
    }

    /// A slot's envelope.
    pub fn envelope(&self, slot: SlotId) -> &QAdsrEnvelope {
        &self.slots[slot.index()].envelope
    }

    /// Selected algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Master per-sample increment.
    pub fn master_frequency(&self) -> f32 {
        self.master_frequency
    }

    /// Output gain.
    pub fn master_amplitude(&self) -> f32 {
        self.master_amplitude
    }

    /// Table length shared by every slot.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Rewind every oscillator and silence every envelope. Switches,
    /// parameters and tables are kept.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.oscillator.reset();
            slot.envelope.reset();
        }
    }
}
