//! Patch definition and application.
//!
//! A patch describes the whole instrument in TOML:
//!
//! ```toml
//! name = "Bell"
//! description = "Inharmonic two-operator bell"
//!
//! [engine]
//! table_size = 44100
//! master_frequency = 440.0
//! master_amplitude = 0.8
//! algorithm = 1
//!
//! [[slot]]
//! id = 1
//! [slot.envelope]
//! attack = 0.9
//! release = 0.1
//!
//! [[slot]]
//! id = 2
//! [slot.oscillator]
//! frequency_factor = 3.5
//! amplitude = 0.6
//!
//! [voices]
//! mod_frequency = 110.0
//! mod_amplitude = 0.3
//! ```
//!
//! Every key has a default, so a patch only lists what it changes. Listing a
//! slot switches its oscillator on; giving it an `[slot.envelope]` table
//! switches its envelope on.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tablefm_core::{EnvelopeCapabilities, EnvelopeMode, table};
use tablefm_synth::{
    AlgorithmRouter, EngineConfig, SlotId, SlotTarget, VoiceAllocationMode, VoiceManager,
};

use crate::error::ConfigError;

/// A complete instrument definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Patch name.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Engine-wide settings.
    #[serde(default)]
    pub engine: EngineSection,

    /// Per-slot settings, at most one entry per slot id.
    #[serde(default, rename = "slot")]
    pub slots: Vec<SlotConfig>,

    /// Backing voice pool settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voices: Option<VoicesConfig>,
}

/// `[engine]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Length of every table.
    pub table_size: usize,
    /// Master per-sample increment.
    pub master_frequency: f32,
    /// Output gain in `[0, 1]`.
    pub master_amplitude: f32,
    /// Algorithm id in `1..=4`.
    pub algorithm: u8,
    /// Allow curve exponents other than 1.
    pub q_shaping: bool,
    /// Allow loop-mode envelopes.
    pub loop_mode: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            table_size: 44100,
            master_frequency: 440.0,
            master_amplitude: 1.0,
            algorithm: 1,
            q_shaping: true,
            loop_mode: true,
        }
    }
}

/// One `[[slot]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Slot id in `1..=4`.
    pub id: u8,
    /// Oscillator settings.
    #[serde(default)]
    pub oscillator: OscillatorConfig,
    /// Envelope settings; absent leaves the envelope switched off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<EnvelopeConfig>,
}

/// `[slot.oscillator]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    /// Run this oscillator.
    pub active: bool,
    /// Multiple of the master frequency, `> 0`.
    pub frequency_factor: f32,
    /// Gain in `[0, 1]`.
    pub amplitude: f32,
    /// Table shape.
    pub waveform: Waveform,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            active: true,
            frequency_factor: 1.0,
            amplitude: 1.0,
            waveform: Waveform::Sine,
        }
    }
}

/// Single-cycle waveform shapes a patch can ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    /// `sin(2πx)`, the engine default.
    #[default]
    Sine,
    /// Ramp from -1 to 1.
    Saw,
    /// 1 for the first half of the cycle, -1 for the second.
    Square,
    /// -1 to 1 and back.
    Triangle,
}

impl Waveform {
    /// Render `size` samples of this shape.
    pub fn samples(self, size: usize) -> Vec<f32> {
        match self {
            Waveform::Sine => table::sine_table(size),
            Waveform::Saw => table::build(size, |x| 2.0 * x - 1.0),
            Waveform::Square => table::build(size, |x| if x < 0.5 { 1.0 } else { -1.0 }),
            Waveform::Triangle => table::build(size, |x| 1.0 - 4.0 * (x - 0.5).abs()),
        }
    }
}

/// Envelope mode as written in a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    /// Hold at sustain until note-off.
    #[default]
    Trigger,
    /// Cycle while the note is held.
    Loop,
}

impl From<ModeSetting> for EnvelopeMode {
    fn from(mode: ModeSetting) -> Self {
        match mode {
            ModeSetting::Trigger => EnvelopeMode::Trigger,
            ModeSetting::Loop => EnvelopeMode::Loop,
        }
    }
}

/// `[slot.envelope]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Run this envelope.
    pub active: bool,
    /// Trigger or loop.
    pub mode: ModeSetting,
    /// Attack time in `(0, 1]`.
    pub attack: f32,
    /// Decay time in `(0, 1]`.
    pub decay: f32,
    /// Sustain level in `[0, 1]`.
    pub sustain: f32,
    /// Release time in `(0, 1]`.
    pub release: f32,
    /// Attack curve exponent, `> 0`.
    pub q_attack: f32,
    /// Decay curve exponent, `> 0`.
    pub q_decay: f32,
    /// Release curve exponent, `> 0`.
    pub q_release: f32,
    /// Loop-mode Silent time, `> 0`.
    pub silent_time: f32,
    /// Loop-mode Sustain time, `> 0`.
    pub sustain_time: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            active: true,
            mode: ModeSetting::Trigger,
            attack: 0.5,
            decay: 0.5,
            sustain: 0.5,
            release: 0.5,
            q_attack: 1.0,
            q_decay: 1.0,
            q_release: 1.0,
            silent_time: 0.5,
            sustain_time: 0.5,
        }
    }
}

/// `[voices]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicesConfig {
    /// Shared modulator increment, `> 0`.
    pub mod_frequency: f32,
    /// Modulation depth in `[0, 1)`.
    pub mod_amplitude: f32,
    /// Attack share in `(0, 1]`.
    pub attack: f32,
    /// Decay share in `(0, 1]`.
    pub decay: f32,
    /// Sustain level in `[0, 1]`.
    pub sustain: f32,
    /// Release share in `(0, 1]`.
    pub release: f32,
    /// Baked curve length in samples.
    pub curve_length: usize,
    /// Steal the oldest voice instead of dropping new notes.
    pub steal_oldest: bool,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            mod_frequency: 100.0,
            mod_amplitude: 0.0,
            attack: 0.5,
            decay: 0.5,
            sustain: 0.5,
            release: 0.5,
            curve_length: 44100,
            steal_oldest: false,
        }
    }
}

fn check(ok: bool, section: &str, param: &str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid_param(section, param, reason))
    }
}

fn is_time(t: f32) -> bool {
    t > 0.0 && t <= 1.0
}

fn is_unit(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl PatchConfig {
    /// An empty patch: engine defaults, slot 1 playing a plain sine.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineSection::default(),
            slots: Vec::new(),
            voices: None,
        }
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Save the patch as TOML, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Render the patch as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse a patch from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Check every value against the range the engine accepts.
    ///
    /// The engine itself silently ignores out-of-range values; validating up
    /// front turns a typo in a patch into an error instead of a no-op.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.engine;
        check(e.table_size > 0, "engine", "table_size", "must be at least 1")?;
        check(
            is_positive(e.master_frequency),
            "engine",
            "master_frequency",
            "must be > 0",
        )?;
        check(
            is_unit(e.master_amplitude),
            "engine",
            "master_amplitude",
            "must be in [0, 1]",
        )?;
        check(
            (1..=4).contains(&e.algorithm),
            "engine",
            "algorithm",
            "must be 1, 2, 3 or 4",
        )?;

        let mut seen = BTreeSet::new();
        for slot in &self.slots {
            let section = format!("slot {}", slot.id);
            check(SlotId::new(slot.id).is_some(), &section, "id", "must be 1, 2, 3 or 4")?;
            check(seen.insert(slot.id), &section, "id", "listed more than once")?;

            let osc = &slot.oscillator;
            let section = format!("slot {} oscillator", slot.id);
            check(
                is_positive(osc.frequency_factor),
                &section,
                "frequency_factor",
                "must be > 0",
            )?;
            check(is_unit(osc.amplitude), &section, "amplitude", "must be in [0, 1]")?;

            if let Some(env) = &slot.envelope {
                self.validate_envelope(slot.id, env)?;
            }
        }

        if let Some(v) = &self.voices {
            check(is_positive(v.mod_frequency), "voices", "mod_frequency", "must be > 0")?;
            check(
                (0.0..1.0).contains(&v.mod_amplitude),
                "voices",
                "mod_amplitude",
                "must be in [0, 1)",
            )?;
            check(is_time(v.attack), "voices", "attack", "must be in (0, 1]")?;
            check(is_time(v.decay), "voices", "decay", "must be in (0, 1]")?;
            check(is_unit(v.sustain), "voices", "sustain", "must be in [0, 1]")?;
            check(is_time(v.release), "voices", "release", "must be in (0, 1]")?;
            check(v.curve_length > 0, "voices", "curve_length", "must be at least 1")?;
        }
        Ok(())
    }

    fn validate_envelope(&self, id: u8, env: &EnvelopeConfig) -> Result<(), ConfigError> {
        let section = format!("slot {} envelope", id);
        check(is_time(env.attack), &section, "attack", "must be in (0, 1]")?;
        check(is_time(env.decay), &section, "decay", "must be in (0, 1]")?;
        check(is_unit(env.sustain), &section, "sustain", "must be in [0, 1]")?;
        check(is_time(env.release), &section, "release", "must be in (0, 1]")?;
        for (param, q) in [
            ("q_attack", env.q_attack),
            ("q_decay", env.q_decay),
            ("q_release", env.q_release),
        ] {
            check(is_positive(q), &section, param, "must be > 0")?;
            check(
                self.engine.q_shaping || q == 1.0,
                &section,
                param,
                "q shaping is disabled in [engine]",
            )?;
        }
        check(is_positive(env.silent_time), &section, "silent_time", "must be > 0")?;
        check(is_positive(env.sustain_time), &section, "sustain_time", "must be > 0")?;
        check(
            self.engine.loop_mode || env.mode == ModeSetting::Trigger,
            &section,
            "mode",
            "loop mode is disabled in [engine]",
        )?;
        Ok(())
    }

    /// Envelope features selected by `[engine]`.
    pub fn capabilities(&self) -> EnvelopeCapabilities {
        EnvelopeCapabilities {
            q_shaping: self.engine.q_shaping,
            loop_mode: self.engine.loop_mode,
        }
    }

    /// Engine construction parameters for this patch.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.engine.table_size, self.engine.master_frequency)
            .with_capabilities(self.capabilities())
    }

    /// Validate, then push every setting into `router`.
    ///
    /// Slots the patch does not list are left as they are. On error the
    /// router is untouched.
    pub fn apply(&self, router: &mut AlgorithmRouter) -> Result<(), ConfigError> {
        self.validate()?;
        if router.table_size() != self.engine.table_size {
            return Err(ConfigError::invalid_param(
                "engine",
                "table_size",
                format!(
                    "patch needs {} samples but the router's tables hold {}",
                    self.engine.table_size,
                    router.table_size()
                ),
            ));
        }

        router.set_algorithm(self.engine.algorithm);
        router.set_master_frequency(self.engine.master_frequency);
        router.set_master_amplitude(self.engine.master_amplitude);

        for slot in &self.slots {
            let Some(id) = SlotId::new(slot.id) else {
                continue;
            };
            let osc = &slot.oscillator;
            router.set_active(SlotTarget::Oscillator(id), osc.active);
            router.set_oscillator_frequency_factor(id, osc.frequency_factor);
            router.set_oscillator_amplitude(id, osc.amplitude);
            if osc.waveform == Waveform::Sine {
                router.reset_waveform(id);
            } else {
                let samples = osc.waveform.samples(router.table_size());
                router.load_wave_table(id, &samples)?;
            }

            if let Some(env) = &slot.envelope {
                router.set_active(SlotTarget::Envelope(id), env.active);
                router.set_envelope(id, env.attack, env.decay, env.sustain, env.release);
                router.set_envelope_q(id, env.q_attack, env.q_decay, env.q_release);
                router.set_envelope_mode(id, env.mode.into());
                router.set_silent_time(id, env.silent_time, env.sustain_time);
            }
        }
        Ok(())
    }

    /// Build a router configured by this patch.
    pub fn build_router(&self) -> Result<AlgorithmRouter, ConfigError> {
        let mut router = self.engine_config().router();
        self.apply(&mut router)?;
        Ok(router)
    }

    /// Build a backing voice pool from `[voices]`, or from defaults if the
    /// patch has none.
    pub fn build_voices<const N: usize>(&self) -> Result<VoiceManager<N>, ConfigError> {
        self.validate()?;
        let v = self.voices.clone().unwrap_or_default();
        let mut pool = VoiceManager::new(self.engine.table_size, v.curve_length);
        pool.set_mod_frequency(v.mod_frequency);
        pool.set_mod_amplitude(v.mod_amplitude);
        pool.update_adsr(v.attack, v.decay, v.sustain, v.release);
        pool.set_allocation_mode(if v.steal_oldest {
            VoiceAllocationMode::StealOldest
        } else {
            VoiceAllocationMode::Drop
        });
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablefm_core::EnvelopeStage;
    use tablefm_synth::Algorithm;

    const BELL: &str = r#"
name = "Bell"

[engine]
table_size = 1024
master_frequency = 10.0
master_amplitude = 0.8
algorithm = 2

[[slot]]
id = 1
[slot.envelope]
attack = 0.9
q_decay = 2.0

[[slot]]
id = 2
[slot.oscillator]
frequency_factor = 3.5
amplitude = 0.6
waveform = "triangle"

[voices]
mod_amplitude = 0.3
curve_length = 2048
"#;

    #[test]
    fn defaults_fill_missing_keys() {
        let patch = PatchConfig::from_toml_str("name = \"Bare\"").unwrap();
        assert_eq!(patch.engine, EngineSection::default());
        assert!(patch.slots.is_empty());
        assert!(patch.voices.is_none());
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn parses_nested_tables() {
        let patch = PatchConfig::from_toml_str(BELL).unwrap();
        assert_eq!(patch.slots.len(), 2);
        let env = patch.slots[0].envelope.as_ref().unwrap();
        assert_eq!(env.attack, 0.9);
        assert_eq!(env.decay, 0.5);
        assert_eq!(env.q_decay, 2.0);
        assert_eq!(patch.slots[1].oscillator.waveform, Waveform::Triangle);
        assert!(patch.slots[1].envelope.is_none());
        assert_eq!(patch.voices.as_ref().unwrap().curve_length, 2048);
    }

    #[test]
    fn apply_configures_router() {
        let patch = PatchConfig::from_toml_str(BELL).unwrap();
        let router = patch.build_router().unwrap();

        assert_eq!(router.algorithm(), Algorithm::SumThenCascade);
        assert_eq!(router.master_amplitude(), 0.8);
        assert!(router.is_active(SlotTarget::Oscillator(SlotId::TWO)));
        assert!(router.is_active(SlotTarget::Envelope(SlotId::ONE)));
        assert!(!router.is_active(SlotTarget::Envelope(SlotId::TWO)));
        assert_eq!(router.oscillator(SlotId::TWO).frequency(), 35.0);
        assert_eq!(router.oscillator(SlotId::TWO).amplitude(), 0.6);
        assert_eq!(router.envelope(SlotId::ONE).attack_time(), 0.9);
        assert_eq!(router.envelope(SlotId::ONE).q().decay, 2.0);
        assert_eq!(router.envelope(SlotId::ONE).stage(), EnvelopeStage::Silent);

        let tri = Waveform::Triangle.samples(1024);
        assert_eq!(router.oscillator(SlotId::TWO).table().as_slice(), tri.as_slice());
    }

    #[test]
    fn mismatched_table_size_changes_nothing() {
        let patch = PatchConfig::from_toml_str(BELL).unwrap();
        let mut router = AlgorithmRouter::new(512, 10.0);

        match patch.apply(&mut router) {
            Err(ConfigError::InvalidParameter { param, .. }) => assert_eq!(param, "table_size"),
            other => panic!("expected table_size error, got {:?}", other),
        }
        assert_eq!(router.algorithm(), Algorithm::Cascade);
        assert_eq!(router.master_amplitude(), 1.0);
        assert!(!router.is_active(SlotTarget::Oscillator(SlotId::TWO)));
        assert!(!router.is_active(SlotTarget::Envelope(SlotId::ONE)));
        assert_eq!(router.envelope(SlotId::ONE).q().decay, 1.0);
    }

    #[test]
    fn voices_section_builds_pool() {
        let patch = PatchConfig::from_toml_str(BELL).unwrap();
        let pool: VoiceManager<4> = patch.build_voices().unwrap();
        assert_eq!(pool.mod_amplitude(), 0.3);
        assert_eq!(pool.curve().len(), 2048);
        assert_eq!(pool.table_size(), 1024);
        assert_eq!(pool.allocation_mode(), VoiceAllocationMode::Drop);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ("[engine]\nalgorithm = 5", "algorithm"),
            ("[engine]\nmaster_amplitude = 1.5", "master_amplitude"),
            ("[[slot]]\nid = 0", "id"),
            ("[[slot]]\nid = 1\n[[slot]]\nid = 1", "id"),
            ("[[slot]]\nid = 3\n[slot.oscillator]\nfrequency_factor = 0.0", "frequency_factor"),
            ("[[slot]]\nid = 2\n[slot.envelope]\nattack = 0.0", "attack"),
            ("[[slot]]\nid = 2\n[slot.envelope]\nq_release = -1.0", "q_release"),
            ("[voices]\nmod_amplitude = 1.0", "mod_amplitude"),
        ];
        for (body, param) in cases {
            let patch = PatchConfig::from_toml_str(&format!("name = \"x\"\n{}", body)).unwrap();
            match patch.validate() {
                Err(ConfigError::InvalidParameter { param: p, .. }) => assert_eq!(p, param),
                other => panic!("{:?} should reject {}, got {:?}", body, param, other),
            }
        }
    }

    #[test]
    fn capability_switches_constrain_envelopes() {
        let body = r#"
name = "Basic"
[engine]
q_shaping = false
loop_mode = false
[[slot]]
id = 1
[slot.envelope]
mode = "loop"
"#;
        let patch = PatchConfig::from_toml_str(body).unwrap();
        let err = patch.validate().unwrap_err();
        assert!(err.to_string().contains("loop mode is disabled"));
        assert_eq!(patch.capabilities(), EnvelopeCapabilities::BASIC);
    }

    #[test]
    fn unknown_waveform_is_a_parse_error() {
        let body = "name = \"x\"\n[[slot]]\nid = 1\n[slot.oscillator]\nwaveform = \"noise\"";
        assert!(matches!(
            PatchConfig::from_toml_str(body),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn waveform_shapes() {
        let saw = Waveform::Saw.samples(4);
        assert_eq!(saw, vec![-1.0, -0.5, 0.0, 0.5]);
        let square = Waveform::Square.samples(4);
        assert_eq!(square, vec![1.0, 1.0, -1.0, -1.0]);
        let tri = Waveform::Triangle.samples(4);
        assert_eq!(tri, vec![-1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn toml_round_trip_preserves_patch() {
        let patch = PatchConfig::from_toml_str(BELL).unwrap();
        let text = patch.to_toml_string().unwrap();
        let back = PatchConfig::from_toml_str(&text).unwrap();
        assert_eq!(patch, back);
    }
}
