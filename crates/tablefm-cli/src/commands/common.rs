//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use hound::{SampleFormat, WavSpec, WavWriter};
use tablefm_config::{PatchConfig, get_factory_patch};

/// Load a patch by factory name or file path.
///
/// Factory names win over files of the same name.
pub fn load_patch(name: &str) -> anyhow::Result<PatchConfig> {
    if let Some(patch) = get_factory_patch(name) {
        return Ok(patch);
    }

    let path = PathBuf::from(name);
    if path.exists() {
        return PatchConfig::load(&path).map_err(|e| anyhow::anyhow!("{}", e));
    }

    anyhow::bail!(
        "Patch '{}' not found. Use 'tablefm patches list' to see available patches.",
        name
    )
}

/// Patch named on the command line, or the `init` factory patch.
pub fn patch_or_init(name: Option<&str>) -> anyhow::Result<PatchConfig> {
    load_patch(name.unwrap_or("init"))
}

/// Parse a comma-separated list, e.g. `"60,64,67"`.
pub fn parse_list<T: std::str::FromStr>(s: &str) -> anyhow::Result<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<T>()
                .map_err(|_| anyhow::anyhow!("invalid list entry '{}'", part))
        })
        .collect()
}

/// Write mono samples as a WAV file.
///
/// 32 bits writes IEEE float; 16 or 24 bits write clamped integers.
pub fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    bits_per_sample: u16,
) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("cannot create '{}'", path.display()))?;

    if bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Bit depths accepted by `--bits`.
pub fn parse_bits(s: &str) -> Result<u16, String> {
    match s {
        "16" => Ok(16),
        "24" => Ok(24),
        "32" => Ok(32),
        _ => Err(format!("unsupported bit depth '{}' (use 16, 24 or 32)", s)),
    }
}

/// Peak absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}
