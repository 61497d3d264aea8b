//! Factory patches bundled with the library.
//!
//! Always available without any files on disk. Each one is a plain TOML patch
//! and doubles as an example of the format.

use crate::error::ConfigError;
use crate::patch::PatchConfig;

/// Names of the factory patches, in listing order.
pub static FACTORY_PATCH_NAMES: &[&str] = &["init", "bell", "organ", "pulse"];

static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("init", INIT_PATCH),
    ("bell", BELL_PATCH),
    ("organ", ORGAN_PATCH),
    ("pulse", PULSE_PATCH),
];

/// Slot 1 sine with a plain envelope.
const INIT_PATCH: &str = r#"
name = "Init"
description = "Single sine carrier with a linear envelope"

[[slot]]
id = 1
[slot.envelope]
attack = 0.1
decay = 0.3
sustain = 0.7
release = 0.4
"#;

/// Non-integer modulator ratio with a long curved decay.
const BELL_PATCH: &str = r#"
name = "Bell"
description = "Inharmonic cascade with a long exponential decay"

[engine]
master_amplitude = 0.8
algorithm = 1

[[slot]]
id = 1
[slot.envelope]
attack = 0.05
decay = 0.9
sustain = 0.0
release = 0.6
q_decay = 3.0
q_release = 2.0

[[slot]]
id = 2
[slot.oscillator]
frequency_factor = 3.5
amplitude = 0.6
[slot.envelope]
attack = 0.05
decay = 0.6
sustain = 0.1
release = 0.4
q_decay = 2.0

[voices]
mod_frequency = 350.0
mod_amplitude = 0.4
attack = 0.05
decay = 0.9
sustain = 0.0
release = 0.3
"#;

/// Harmonic partials summed in parallel.
const ORGAN_PATCH: &str = r#"
name = "Organ"
description = "Additive drawbar-style stack of four harmonics"

[engine]
master_amplitude = 0.25
algorithm = 4

[[slot]]
id = 1
[slot.envelope]
attack = 0.02
decay = 0.1
sustain = 1.0
release = 0.1

[[slot]]
id = 2
[slot.oscillator]
frequency_factor = 2.0
amplitude = 0.7

[[slot]]
id = 3
[slot.oscillator]
frequency_factor = 3.0
amplitude = 0.5

[[slot]]
id = 4
[slot.oscillator]
frequency_factor = 4.0
amplitude = 0.3
"#;

/// Loop-mode envelope gating a square modulator.
const PULSE_PATCH: &str = r#"
name = "Pulse"
description = "Rhythmic loop envelope over a square-modulated carrier"

[engine]
algorithm = 2
master_amplitude = 0.7

[[slot]]
id = 1
[slot.envelope]
mode = "loop"
attack = 0.1
decay = 0.2
sustain = 0.6
release = 0.2
silent_time = 0.3
sustain_time = 0.2
q_attack = 0.5

[[slot]]
id = 2
[slot.oscillator]
frequency_factor = 0.5
amplitude = 0.5
waveform = "square"

[[slot]]
id = 3
[slot.oscillator]
frequency_factor = 1.01
amplitude = 0.5
"#;

/// Every factory patch that parses.
pub fn factory_patches() -> Vec<PatchConfig> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml_str)| PatchConfig::from_toml_str(toml_str).ok())
        .collect()
}

/// Look up a factory patch by name, ignoring case.
pub fn get_factory_patch(name: &str) -> Option<PatchConfig> {
    let name_lower = name.to_lowercase();
    FACTORY_PATCHES_TOML
        .iter()
        .find(|(n, _)| *n == name_lower)
        .and_then(|(_, toml_str)| PatchConfig::from_toml_str(toml_str).ok())
}

/// Like [`get_factory_patch`], but an unknown name is an error.
pub fn load_factory_patch(name: &str) -> Result<PatchConfig, ConfigError> {
    get_factory_patch(name).ok_or_else(|| ConfigError::patch_not_found(name))
}

/// Names of all factory patches.
pub fn factory_patch_names() -> &'static [&'static str] {
    FACTORY_PATCH_NAMES
}

/// Whether `name` is a factory patch, ignoring case.
pub fn is_factory_patch(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    FACTORY_PATCH_NAMES.contains(&name_lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablefm_synth::{Algorithm, SlotId, SlotTarget};

    #[test]
    fn all_factory_patches_parse_and_validate() {
        let patches = factory_patches();
        assert_eq!(patches.len(), FACTORY_PATCH_NAMES.len());
        for patch in &patches {
            patch
                .validate()
                .unwrap_or_else(|e| panic!("{} failed validation: {}", patch.name, e));
        }
    }

    #[test]
    fn names_match_table() {
        let table: Vec<&str> = FACTORY_PATCHES_TOML.iter().map(|(n, _)| *n).collect();
        assert_eq!(table, FACTORY_PATCH_NAMES);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(get_factory_patch("BELL").unwrap().name, "Bell");
        assert!(get_factory_patch("nonexistent").is_none());
        assert!(is_factory_patch("Organ"));
        assert!(!is_factory_patch("piano"));
    }

    #[test]
    fn unknown_patch_is_an_error() {
        assert!(matches!(
            load_factory_patch("piano"),
            Err(ConfigError::PatchNotFound(name)) if name == "piano"
        ));
    }

    #[test]
    fn organ_is_additive() {
        let router = load_factory_patch("organ").unwrap().build_router().unwrap();
        assert_eq!(router.algorithm(), Algorithm::Additive);
        for id in SlotId::ALL {
            assert!(router.is_active(SlotTarget::Oscillator(id)));
        }
    }
}
