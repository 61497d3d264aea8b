//! Phase-accumulating table oscillator.
//!
//! The phase is measured in table samples, so `frequency` is the per-sample
//! phase increment: with a table of `N` samples at sample rate `sr`, an
//! increment of `f` plays at `f · sr / N` Hz. A table as long as the sample
//! rate makes the increment read directly in Hz.

use libm::floorf;

use crate::error::TableError;
use crate::table::WaveTable;

/// Wrap `phase` into `[0, size)`.
///
/// A single subtraction covers normal forward motion. Anything still out of
/// range (negative increments, increments larger than the table) falls back
/// to a Euclidean remainder. A non-finite phase restarts at 0.
#[inline]
pub fn wrap_phase(phase: f32, size: f32) -> f32 {
    let wrapped = if phase >= size { phase - size } else { phase };
    if (0.0..size).contains(&wrapped) {
        return wrapped;
    }
    if !wrapped.is_finite() {
        return 0.0;
    }
    let r = wrapped - size * floorf(wrapped / size);
    // r can round up to exactly `size` for tiny negative inputs
    if r >= size || r < 0.0 { 0.0 } else { r }
}

/// How an oscillator combines its input signal with the table.
///
/// `s` is the table sample at the current phase, `x` the input sample, `f`
/// the oscillator frequency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OscMode {
    /// Output `s`, advance by `f`. Input ignored.
    #[default]
    ModulatorNoInput,
    /// Output `s`, advance by `(1 + x) · f`.
    ModulatorWithInput,
    /// Output `s`, advance by `f`. Input ignored.
    CarrierNoInput,
    /// Output `s`, advance by `(1 + x) · f`.
    CarrierWithInput,
    /// Output `(s + x) / 2`, advance by `f`.
    SumWithInput,
}

impl OscMode {
    /// True if the mode reads its input.
    pub fn uses_input(self) -> bool {
        !matches!(self, OscMode::ModulatorNoInput | OscMode::CarrierNoInput)
    }
}

/// Table-lookup oscillator.
///
/// # Example
///
/// ```rust
/// use tablefm_core::{OscMode, Oscillator};
///
/// // 8-sample table, advance 2 samples per output: a quarter-table step.
/// let mut osc = Oscillator::new(8, 2.0);
/// let mut out = [0.0_f32; 4];
/// osc.process(&[], &mut out, OscMode::CarrierNoInput);
/// assert!((out[1] - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    table: WaveTable,
    table_size: usize,
    phase: f32,
    frequency: f32,
    frequency_factor: f32,
    amplitude: f32,
}

impl Oscillator {
    /// Create an oscillator over a fresh sine table.
    ///
    /// `table_size` is clamped to at least one sample. An invalid
    /// `frequency` falls back to zero (silent phase).
    pub fn new(table_size: usize, frequency: f32) -> Self {
        let table_size = table_size.max(1);
        Self {
            table: WaveTable::sine(table_size),
            table_size,
            phase: 0.0,
            frequency: if is_valid_frequency(frequency) {
                frequency
            } else {
                0.0
            },
            frequency_factor: 1.0,
            amplitude: 1.0,
        }
    }

    /// Produce one sample from `input` in `mode` and advance the phase.
    #[inline]
    pub fn advance(&mut self, input: f32, mode: OscMode) -> f32 {
        let index = (self.phase as usize).min(self.table_size - 1);
        let sample = self.table.get(index);

        let (out, increment) = match mode {
            OscMode::ModulatorNoInput | OscMode::CarrierNoInput => (sample, self.frequency),
            OscMode::ModulatorWithInput | OscMode::CarrierWithInput => {
                (sample, (1.0 + input) * self.frequency)
            }
            OscMode::SumWithInput => ((sample + input) * 0.5, self.frequency),
        };

        self.phase = wrap_phase(self.phase + increment, self.table_size as f32);
        out * self.amplitude
    }

    /// Process a block.
    ///
    /// `input` is read sample-for-sample alongside `output`; positions past
    /// the end of `input` read as silence. Modes that ignore their input may
    /// pass an empty slice.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], mode: OscMode) {
        for (i, out) in output.iter_mut().enumerate() {
            let x = input.get(i).copied().unwrap_or(0.0);
            *out = self.advance(x, mode);
        }
    }

    /// Process a block where input and output are the same buffer.
    ///
    /// Each sample is read before it is overwritten, which is what lets the
    /// router chain slots through one running buffer.
    pub fn process_in_place(&mut self, buffer: &mut [f32], mode: OscMode) {
        for sample in buffer.iter_mut() {
            *sample = self.advance(*sample, mode);
        }
    }

    /// Set the phase increment directly. Ignored unless `f > 0`.
    pub fn set_frequency(&mut self, frequency: f32) {
        if is_valid_frequency(frequency) {
            self.frequency = frequency;
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!(frequency, "oscillator frequency rejected");
        }
    }

    /// Set `frequency = factor · master`. Ignored unless `factor > 0`.
    ///
    /// The factor is remembered so a later master change can reapply it.
    pub fn set_frequency_factor(&mut self, master: f32, factor: f32) {
        if !is_valid_frequency(factor) {
            #[cfg(feature = "tracing")]
            tracing::trace!(factor, "oscillator frequency factor rejected");
            return;
        }
        self.frequency_factor = factor;
        self.set_frequency(factor * master);
    }

    /// Set output gain. Ignored unless `amplitude ∈ [0, 1]`.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        if (0.0..=1.0).contains(&amplitude) {
            self.amplitude = amplitude;
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!(amplitude, "oscillator amplitude rejected");
        }
    }

    /// Copy host-supplied samples in as the new waveform.
    ///
    /// On error the current waveform keeps playing.
    pub fn load_table(&mut self, samples: &[f32]) -> Result<(), TableError> {
        let table = WaveTable::from_samples(samples, self.table_size)?;
        self.table = table;
        Ok(())
    }

    /// Install a pre-built waveform without allocating.
    ///
    /// Returns the table that is no longer in use: the previous one on
    /// success, or `table` itself if its length does not match, in which case
    /// nothing changes. Callers on the audio thread should hand the returned
    /// table back to a non-real-time thread for dropping.
    pub fn swap_table(&mut self, table: WaveTable) -> WaveTable {
        if table.len() == self.table_size {
            core::mem::replace(&mut self.table, table)
        } else {
            table
        }
    }

    /// Rebuild the default sine waveform.
    pub fn reset_waveform(&mut self) {
        self.table = WaveTable::sine(self.table_size);
    }

    /// Return the phase to the start of the table.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current phase in table samples.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current per-sample increment.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Last accepted frequency factor.
    pub fn frequency_factor(&self) -> f32 {
        self.frequency_factor
    }

    /// Current output gain.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Fixed table length.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Waveform currently playing.
    pub fn table(&self) -> &WaveTable {
        &self.table
    }
}

#[inline]
fn is_valid_frequency(f: f32) -> bool {
    f.is_finite() && f > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn wrap_phase_single_subtraction() {
        assert_eq!(wrap_phase(10.5, 8.0), 2.5);
        assert_eq!(wrap_phase(3.0, 8.0), 3.0);
        assert_eq!(wrap_phase(8.0, 8.0), 0.0);
    }

    #[test]
    fn wrap_phase_falls_back_to_remainder() {
        assert_eq!(wrap_phase(20.0, 8.0), 4.0);
        assert_eq!(wrap_phase(-3.0, 8.0), 5.0);
        let tiny = wrap_phase(-1e-9, 8.0);
        assert!((0.0..8.0).contains(&tiny));
    }

    #[test]
    fn wrap_phase_resets_non_finite() {
        assert_eq!(wrap_phase(f32::NAN, 8.0), 0.0);
        assert_eq!(wrap_phase(f32::INFINITY, 8.0), 0.0);
        assert_eq!(wrap_phase(f32::NEG_INFINITY, 8.0), 0.0);
    }

    #[test]
    fn non_finite_input_does_not_stick() {
        let mut osc = Oscillator::new(8, 1.0);
        osc.advance(f32::NAN, OscMode::CarrierWithInput);
        assert_eq!(osc.phase(), 0.0);
        osc.advance(f32::INFINITY, OscMode::ModulatorWithInput);
        assert_eq!(osc.phase(), 0.0);

        for _ in 0..100 {
            osc.advance(0.0, OscMode::CarrierWithInput);
        }
        assert_eq!(osc.phase(), 4.0);
    }

    #[test]
    fn carrier_no_input_walks_table() {
        let mut osc = Oscillator::new(4, 1.0);
        osc.load_table(&[0.0, 0.25, 0.5, 0.75]).unwrap();
        let mut out = [0.0; 6];
        osc.process(&[], &mut out, OscMode::CarrierNoInput);
        assert_eq!(out, [0.0, 0.25, 0.5, 0.75, 0.0, 0.25]);
    }

    #[test]
    fn with_input_scales_increment() {
        let mut osc = Oscillator::new(8, 1.0);
        let out = osc.advance(1.0, OscMode::ModulatorWithInput);
        assert_eq!(out, 0.0);
        assert_eq!(osc.phase(), 2.0);

        osc.advance(-0.5, OscMode::CarrierWithInput);
        assert_eq!(osc.phase(), 2.5);
    }

    #[test]
    fn sum_with_input_averages() {
        let mut osc = Oscillator::new(4, 1.0);
        osc.load_table(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        let mut buf = vec![0.0, 1.0, -1.0];
        osc.process_in_place(&mut buf, OscMode::SumWithInput);
        assert_eq!(buf, vec![0.5, 1.0, 0.0]);
        assert_eq!(osc.phase(), 3.0);
    }

    #[test]
    fn amplitude_scales_output() {
        let mut osc = Oscillator::new(4, 1.0);
        osc.load_table(&[0.8, 0.8, 0.8, 0.8]).unwrap();
        osc.set_amplitude(0.5);
        assert!((osc.advance(0.0, OscMode::CarrierNoInput) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn invalid_parameters_are_ignored() {
        let mut osc = Oscillator::new(16, 2.0);
        osc.set_frequency(0.0);
        osc.set_frequency(-1.0);
        osc.set_frequency(f32::NAN);
        assert_eq!(osc.frequency(), 2.0);

        osc.set_amplitude(1.5);
        osc.set_amplitude(-0.1);
        assert_eq!(osc.amplitude(), 1.0);

        osc.set_frequency_factor(100.0, 0.0);
        assert_eq!(osc.frequency(), 2.0);
        osc.set_frequency_factor(100.0, 0.5);
        assert_eq!(osc.frequency(), 50.0);
        assert_eq!(osc.frequency_factor(), 0.5);
    }

    #[test]
    fn rejected_table_keeps_previous() {
        let mut osc = Oscillator::new(4, 1.0);
        let before = osc.table().clone();
        assert!(osc.load_table(&[0.0; 3]).is_err());
        assert!(osc.table().ptr_eq(&before));

        let retired = osc.swap_table(WaveTable::sine(5));
        assert_eq!(retired.len(), 5);
        assert!(osc.table().ptr_eq(&before));
    }

    #[test]
    fn swap_returns_previous_table() {
        let mut osc = Oscillator::new(4, 1.0);
        let before = osc.table().clone();
        let retired = osc.swap_table(WaveTable::sine(4));
        assert!(retired.ptr_eq(&before));
        assert!(!osc.table().ptr_eq(&before));
    }

    #[test]
    fn reset_waveform_restores_sine() {
        let mut osc = Oscillator::new(8, 1.0);
        osc.load_table(&[0.3; 8]).unwrap();
        osc.reset_waveform();
        let samples: Vec<f32> = osc.table().as_slice().to_vec();
        assert!((samples[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn phase_stays_in_range_with_large_increment() {
        let mut osc = Oscillator::new(8, 30.0);
        for _ in 0..100 {
            osc.advance(0.7, OscMode::CarrierWithInput);
            assert!((0.0..8.0).contains(&osc.phase()));
        }
        for _ in 0..100 {
            osc.advance(-3.0, OscMode::ModulatorWithInput);
            assert!((0.0..8.0).contains(&osc.phase()));
        }
    }
}
