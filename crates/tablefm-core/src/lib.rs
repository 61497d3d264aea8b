//! tablefm Core - table-driven building blocks for block-based FM synthesis
//!
//! This crate provides the sample-level primitives the tablefm engine is
//! assembled from. Everything here reads from precomputed lookup tables, so
//! the per-sample cost is an index, a multiply and a few adds.
//!
//! # Core Components
//!
//! ## Tables
//!
//! - [`table::build`] - Fill a table from a shape function of normalized position
//! - [`WaveTable`] - Immutable, shareable oscillator waveform
//! - [`EnvelopeCurves`] - Attack/decay/release shapes for one Q triple
//! - [`CurveQ`] - Per-stage curve exponents
//!
//! ## Oscillator
//!
//! - [`Oscillator`] - Phase-accumulating table reader
//! - [`OscMode`] - How the oscillator combines its input with the table
//!
//! ```rust
//! use tablefm_core::{OscMode, Oscillator};
//!
//! let mut osc = Oscillator::new(1024, 8.0);
//! let mut block = [0.0_f32; 64];
//! osc.process_in_place(&mut block, OscMode::CarrierNoInput);
//! ```
//!
//! ## Envelope
//!
//! - [`QAdsrEnvelope`] - Attack/Decay/Sustain/Release/Silent state machine with
//!   Q-shaped curves and an optional free-running loop mode
//! - [`EnvelopeStage`] / [`EnvelopeMode`] - Stage tracking and trigger/loop behavior
//! - [`EnvelopeCapabilities`] - Feature switches for Q shaping and loop mode
//!
//! ```rust
//! use tablefm_core::{EnvelopeStage, QAdsrEnvelope};
//!
//! let mut env = QAdsrEnvelope::new(1024);
//! env.note_on(128.0);
//! assert_eq!(env.stage(), EnvelopeStage::Attack);
//!
//! let mut block = [1.0_f32; 32];
//! env.apply_in_place(&mut block);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for table storage).
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tablefm-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Real-time Guarantees
//!
//! Processing never allocates. Tables are only built by constructors and by
//! explicit regeneration calls (`set_q`, `reset_waveform`, `load_table`),
//! which callers are expected to keep off the audio thread or to replace
//! with the pre-built `swap_*` variants.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod envelope;
pub mod error;
pub mod oscillator;
pub mod table;

pub use envelope::{
    ADSR_MAX, EnvelopeCapabilities, EnvelopeMode, EnvelopeStage, QAdsrEnvelope, STAGE_SCALE,
    VELOCITY_MAX,
};
pub use error::TableError;
pub use oscillator::{OscMode, Oscillator, wrap_phase};
pub use table::{CurveQ, EnvelopeCurves, WaveTable};
