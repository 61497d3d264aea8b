//! Chord rendering on the backing voice pool.

use clap::Args;
use std::path::PathBuf;
use tablefm_synth::{VoiceAllocationMode, VoiceManager, hz_to_increment, midi_to_freq};

use super::common::{parse_bits, parse_list, patch_or_init, peak, write_wav};

/// Voices in the CLI pool.
const POOL_SIZE: usize = 16;

#[derive(Args, Debug)]
pub struct ChordArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long)]
    notes: String,

    /// Factory patch name or patch file supplying the [voices] settings
    #[arg(short, long)]
    patch: Option<String>,

    /// Note velocity (0-128)
    #[arg(long, default_value = "100.0")]
    velocity: f32,

    /// Duration in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Override the shared modulator frequency in Hz
    #[arg(long)]
    mod_freq: Option<f32>,

    /// Override the modulation depth (0 to below 1)
    #[arg(long)]
    mod_amp: Option<f32>,

    /// Steal the oldest voice when the pool is full
    #[arg(long)]
    steal: bool,

    /// Output gain applied to the summed voices
    #[arg(long, default_value = "0.25")]
    gain: f32,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Bits per sample (16, 24 or 32 float)
    #[arg(long, default_value = "32", value_parser = parse_bits)]
    bits: u16,
}

pub fn run(args: ChordArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.sample_rate > 0, "sample rate must be at least 1");
    anyhow::ensure!(args.duration > 0.0, "duration must be positive");

    let notes: Vec<u8> = parse_list(&args.notes)?;
    anyhow::ensure!(!notes.is_empty(), "no notes given");

    let patch = patch_or_init(args.patch.as_deref())?;
    let table_size = patch.engine.table_size;
    let sample_rate = args.sample_rate as f32;

    let mut pool: VoiceManager<POOL_SIZE> = patch.build_voices()?;
    if args.steal {
        pool.set_allocation_mode(VoiceAllocationMode::StealOldest);
    }
    if let Some(hz) = args.mod_freq {
        pool.set_mod_frequency(hz_to_increment(hz, table_size, sample_rate));
    }
    if let Some(depth) = args.mod_amp {
        anyhow::ensure!((0.0..1.0).contains(&depth), "mod-amp must be in [0, 1)");
        pool.set_mod_amplitude(depth);
    }

    for &note in &notes {
        let increment = hz_to_increment(midi_to_freq(note), table_size, sample_rate);
        match pool.note_on(increment, args.velocity) {
            Some(index) => tracing::debug!(note, index, "note placed"),
            None => tracing::warn!(note, "note not placed"),
        }
    }

    let total = (args.duration * sample_rate) as usize;
    let mut samples = vec![0.0_f32; total];
    pool.process(&mut samples);
    for sample in &mut samples {
        *sample *= args.gain;
    }

    write_wav(&args.output, &samples, args.sample_rate, args.bits)?;

    println!(
        "Rendered {} note(s) with '{}': {} samples, peak {:.3}, {} dropped -> {}",
        notes.len(),
        patch.name,
        total,
        peak(&samples),
        pool.dropped_notes(),
        args.output.display()
    );
    Ok(())
}
