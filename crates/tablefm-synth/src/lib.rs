//! tablefm Synth - FM routing, backing voices and control handoff
//!
//! Builds playable instruments out of the `tablefm-core` primitives.
//!
//! # Core Components
//!
//! ## Algorithm Router
//!
//! A monophonic four-operator FM voice:
//!
//! - [`AlgorithmRouter`] - Four oscillator/envelope slots run over one buffer
//! - [`Algorithm`] - The four fixed routing topologies
//! - [`SlotId`] / [`SlotTarget`] - Slot addressing, including the flat
//!   `1..=4` / `11..=14` control ids
//!
//! ```rust
//! use tablefm_synth::{AlgorithmRouter, SlotId, SlotTarget};
//!
//! let mut router = AlgorithmRouter::new(44100, 440.0);
//! router.toggle_active(SlotTarget::Oscillator(SlotId::TWO));
//! router.toggle_active(SlotTarget::Envelope(SlotId::ONE));
//! router.set_oscillator_frequency_factor(SlotId::TWO, 0.5);
//! router.note_on(220.0, 100.0);
//!
//! let mut block = [0.0_f32; 64];
//! router.process(&[], &mut block);
//! ```
//!
//! ## Backing Voices
//!
//! - [`VoiceManager`] - Fixed pool of one-shot voices sharing a modulator
//!   and a baked envelope curve
//! - [`VoiceAllocationMode`] - Drop or steal when the pool is full
//! - [`CurveShape`] - Stage proportions of the baked curve
//!
//! ## Cross-thread Control (`std`)
//!
//! - [`FmEngine`] - Router that drains queued commands at each block start
//! - [`ControlHandle`] - Control-thread sender that pre-builds tables
//! - [`ControlError`] - Why a command was not queued
//!
//! # no_std Support
//!
//! The router and voices are `no_std` compatible. The engine/handle pair
//! needs the default `std` feature.
//!
//! ```toml
//! [dependencies]
//! tablefm-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
#[cfg(feature = "std")]
pub mod control;
#[cfg(feature = "std")]
pub mod engine;
#[cfg(feature = "std")]
pub mod error;
pub mod router;
pub mod voice;

pub use config::EngineConfig;
#[cfg(feature = "std")]
pub use control::{ControlHandle, EngineCommand};
#[cfg(feature = "std")]
pub use engine::FmEngine;
#[cfg(feature = "std")]
pub use error::ControlError;
pub use router::{Algorithm, AlgorithmRouter, SLOT_COUNT, Slot, SlotId, SlotTarget};
pub use voice::{
    CurveShape, Voice, VoiceAllocationMode, VoiceManager, hz_to_increment, midi_to_freq,
};
