//! Single-note rendering through the control handoff.

use clap::Args;
use std::path::PathBuf;
use tablefm_synth::{FmEngine, hz_to_increment};

use super::common::{parse_bits, patch_or_init, peak, write_wav};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Factory patch name or patch file (defaults to "init")
    #[arg(short, long)]
    patch: Option<String>,

    /// Note frequency in Hz
    #[arg(long, default_value = "220.0")]
    freq: f32,

    /// Note velocity (0-128)
    #[arg(long, default_value = "100.0")]
    velocity: f32,

    /// Total duration in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Seconds after the start to release the note (defaults to 3/4 of the duration)
    #[arg(long)]
    release_at: Option<f32>,

    /// Override the patch's algorithm (1-4)
    #[arg(long)]
    algorithm: Option<u8>,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Samples per processing block
    #[arg(long, default_value = "256")]
    block_size: usize,

    /// Bits per sample (16, 24 or 32 float)
    #[arg(long, default_value = "32", value_parser = parse_bits)]
    bits: u16,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.block_size > 0, "block size must be at least 1");
    anyhow::ensure!(args.sample_rate > 0, "sample rate must be at least 1");
    anyhow::ensure!(args.duration > 0.0, "duration must be positive");
    if let Some(id) = args.algorithm {
        anyhow::ensure!((1..=4).contains(&id), "algorithm must be 1, 2, 3 or 4");
    }

    let patch = patch_or_init(args.patch.as_deref())?;
    patch.validate()?;

    let (mut engine, mut handle) = FmEngine::new(patch.engine_config());
    engine.configure(&mut handle, |router| patch.apply(router))?;

    if let Some(id) = args.algorithm {
        handle.set_algorithm(id)?;
    }

    let sample_rate = args.sample_rate as f32;
    let increment = hz_to_increment(args.freq, patch.engine.table_size, sample_rate);
    handle.note_on(increment, args.velocity)?;

    let total = (args.duration * sample_rate) as usize;
    let release_at = args.release_at.unwrap_or(args.duration * 0.75);
    let release_sample = (release_at.max(0.0) * sample_rate) as usize;

    tracing::info!(
        patch = %patch.name,
        algorithm = engine.router().algorithm().id(),
        increment,
        total,
        release_sample,
        "rendering note"
    );

    let mut samples = vec![0.0_f32; total];
    let mut position = 0;
    let mut released = false;
    for block in samples.chunks_mut(args.block_size) {
        // Commands land on block boundaries, so release is block-quantized.
        if !released && position >= release_sample {
            handle.note_off()?;
            released = true;
        }
        engine.process(&[], block);
        position += block.len();
    }
    handle.collect_garbage();

    write_wav(&args.output, &samples, args.sample_rate, args.bits)?;

    println!(
        "Rendered '{}' at {:.1} Hz: {} samples ({:.2}s), peak {:.3} -> {}",
        patch.name,
        args.freq,
        total,
        total as f32 / sample_rate,
        peak(&samples),
        args.output.display()
    );
    Ok(())
}
