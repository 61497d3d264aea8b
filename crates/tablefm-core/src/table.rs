//! Lookup-table generation.
//!
//! Every table in tablefm is built here from a closed-form shape evaluated at
//! normalized positions `x = i / size`, and then published as an immutable,
//! reference-counted slice. A table is never mutated once published:
//! regenerating means building a fresh one and swapping the owning handle, so
//! a reader that still holds the previous handle keeps a complete table.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f32::consts::TAU;

use libm::{powf, sinf};

use crate::error::TableError;

/// Build a table of `size` samples where sample `i` is `shape(i / size)`.
///
/// A `size` of zero yields an empty table.
///
/// ```rust
/// use tablefm_core::table::build;
///
/// let ramp = build(4, |x| x);
/// assert_eq!(ramp, vec![0.0, 0.25, 0.5, 0.75]);
/// ```
pub fn build<F>(size: usize, mut shape: F) -> Vec<f32>
where
    F: FnMut(f32) -> f32,
{
    let len = size as f32;
    (0..size).map(|i| shape(i as f32 / len)).collect()
}

/// One period of a sine wave, `sin(2π·x)`.
#[inline]
pub fn sine(x: f32) -> f32 {
    sinf(x * TAU)
}

/// Rising curve `x^q`, clamped to `[0, 1]`.
///
/// `q = 1` is linear, `q > 1` starts slow, `q < 1` starts fast.
#[inline]
pub fn slope_up(x: f32, q: f32) -> f32 {
    powf(x, q).clamp(0.0, 1.0)
}

/// Falling curve `1 - x^q`, clamped to `[0, 1]`.
#[inline]
pub fn slope_down(x: f32, q: f32) -> f32 {
    (1.0 - powf(x, q)).clamp(0.0, 1.0)
}

/// Build a sine table of `size` samples.
pub fn sine_table(size: usize) -> Vec<f32> {
    build(size, sine)
}

/// An oscillator waveform.
///
/// Cloning is cheap: clones share the same samples.
#[derive(Debug, Clone)]
pub struct WaveTable {
    samples: Arc<[f32]>,
}

impl WaveTable {
    /// Sine waveform of `size` samples.
    pub fn sine(size: usize) -> Self {
        Self {
            samples: sine_table(size).into(),
        }
    }

    /// Validate and copy host-supplied samples.
    ///
    /// The slice must be exactly `expected_len` long and every sample finite.
    pub fn from_samples(samples: &[f32], expected_len: usize) -> Result<Self, TableError> {
        if samples.is_empty() {
            return Err(TableError::Empty);
        }
        if samples.len() != expected_len {
            return Err(TableError::LengthMismatch {
                expected: expected_len,
                actual: samples.len(),
            });
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(TableError::NonFinite { index });
        }
        Ok(Self {
            samples: Arc::from(samples),
        })
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the table holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.samples[index]
    }

    /// All samples.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// True if both handles share the same samples.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

/// Curve exponents for the attack, decay and release stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveQ {
    /// Attack exponent.
    pub attack: f32,
    /// Decay exponent.
    pub decay: f32,
    /// Release exponent.
    pub release: f32,
}

impl CurveQ {
    /// Straight-line curves.
    pub const LINEAR: Self = Self {
        attack: 1.0,
        decay: 1.0,
        release: 1.0,
    };

    /// Returns a copy with each component replaced by the matching argument
    /// when that argument is a valid exponent (finite and `> 0`).
    pub fn merged(self, attack: f32, decay: f32, release: f32) -> Self {
        let pick = |new: f32, old: f32| if is_valid_q(new) { new } else { old };
        Self {
            attack: pick(attack, self.attack),
            decay: pick(decay, self.decay),
            release: pick(release, self.release),
        }
    }
}

impl Default for CurveQ {
    fn default() -> Self {
        Self::LINEAR
    }
}

#[inline]
fn is_valid_q(q: f32) -> bool {
    q.is_finite() && q > 0.0
}

/// The three shaped stage curves of a Q-ADSR envelope.
///
/// All three are built together and shared behind a single `Arc`, so a swap
/// replaces them as a unit and a stage can never read a half-updated set.
#[derive(Debug)]
pub struct EnvelopeCurves {
    attack: Vec<f32>,
    decay: Vec<f32>,
    release: Vec<f32>,
    q: CurveQ,
}

impl EnvelopeCurves {
    /// Build all three curves for `q` at `size` samples each.
    ///
    /// Attack is `slope_up(q.attack)`, decay and release are
    /// `slope_down(q.decay)` and `slope_down(q.release)`.
    pub fn generate(size: usize, q: CurveQ) -> Self {
        Self {
            attack: build(size, |x| slope_up(x, q.attack)),
            decay: build(size, |x| slope_down(x, q.decay)),
            release: build(size, |x| slope_down(x, q.release)),
            q,
        }
    }

    /// Samples per curve.
    #[inline]
    pub fn len(&self) -> usize {
        self.attack.len()
    }

    /// True if the curves are empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attack.is_empty()
    }

    /// Attack curve.
    #[inline]
    pub fn attack(&self) -> &[f32] {
        &self.attack
    }

    /// Decay curve.
    #[inline]
    pub fn decay(&self) -> &[f32] {
        &self.decay
    }

    /// Release curve.
    #[inline]
    pub fn release(&self) -> &[f32] {
        &self.release
    }

    /// Exponents these curves were built with.
    #[inline]
    pub fn q(&self) -> CurveQ {
        self.q
    }
}
