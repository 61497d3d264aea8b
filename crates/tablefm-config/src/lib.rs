//! Patch files for the tablefm synthesizer.
//!
//! A patch is a TOML description of one instrument: the algorithm, master
//! tuning, and the oscillator and envelope of each of the four slots, plus the
//! settings of the backing voice pool.
//!
//! # Features
//!
//! - **Patches**: Load, save and validate [`PatchConfig`] files
//! - **Application**: Push a patch into an [`AlgorithmRouter`](tablefm_synth::AlgorithmRouter)
//!   or build a [`VoiceManager`](tablefm_synth::VoiceManager) from it
//! - **Factory Patches**: Built-in patches that need no files
//!
//! # Example
//!
//! ```rust
//! use tablefm_config::{PatchConfig, get_factory_patch};
//!
//! let patch = PatchConfig::from_toml_str(r#"
//! name = "Simple"
//! [engine]
//! table_size = 1024
//! master_frequency = 8.0
//! [[slot]]
//! id = 1
//! [slot.envelope]
//! attack = 0.2
//! "#).unwrap();
//!
//! let mut router = patch.build_router().unwrap();
//! router.note_on(8.0, 100.0);
//! let mut block = [0.0_f32; 256];
//! router.process(&[], &mut block);
//!
//! assert!(get_factory_patch("bell").is_some());
//! ```

mod error;
mod patch;

/// Factory patches bundled with the library.
pub mod factory;

pub use error::ConfigError;
pub use factory::{
    FACTORY_PATCH_NAMES, factory_patch_names, factory_patches, get_factory_patch,
    is_factory_patch, load_factory_patch,
};
pub use patch::{
    EngineSection, EnvelopeConfig, ModeSetting, OscillatorConfig, PatchConfig, SlotConfig,
    VoicesConfig, Waveform,
};
