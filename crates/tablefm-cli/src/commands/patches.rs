//! Patch listing and export.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tablefm_config::{PatchConfig, factory_patches};

use super::common::load_patch;

#[derive(Args, Debug)]
pub struct PatchesArgs {
    #[command(subcommand)]
    command: PatchesCommand,
}

#[derive(Subcommand, Debug)]
enum PatchesCommand {
    /// List factory patches
    List,

    /// Show details of a patch
    Show {
        /// Patch name or path
        name: String,
    },

    /// Write a patch to a TOML file for editing
    Export {
        /// Patch name or path
        name: String,

        /// Destination file
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a patch file without rendering it
    Check {
        /// Patch name or path
        name: String,
    },
}

pub fn run(args: PatchesArgs) -> anyhow::Result<()> {
    match args.command {
        PatchesCommand::List => {
            println!("Factory Patches");
            println!("===============\n");
            for patch in factory_patches() {
                println!(
                    "  {:<10} {}",
                    patch.name.to_lowercase(),
                    patch.description.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        PatchesCommand::Show { name } => {
            let patch = load_patch(&name)?;
            show(&patch);
            Ok(())
        }
        PatchesCommand::Export {
            name,
            output,
            force,
        } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "'{}' already exists. Use --force to overwrite.",
                    output.display()
                );
            }
            let patch = load_patch(&name)?;
            patch.save(&output)?;
            println!("Exported '{}' to {}", patch.name, output.display());
            Ok(())
        }
        PatchesCommand::Check { name } => {
            let patch = load_patch(&name)?;
            patch.validate()?;
            println!("'{}' is valid", patch.name);
            Ok(())
        }
    }
}

fn show(patch: &PatchConfig) {
    println!("{}", patch.name);
    if let Some(description) = &patch.description {
        println!("  {}", description);
    }
    let e = &patch.engine;
    println!(
        "\nEngine: algorithm {}, table {} samples, master frequency {}, master amplitude {}",
        e.algorithm, e.table_size, e.master_frequency, e.master_amplitude
    );

    if !patch.slots.is_empty() {
        println!("\nSlots:");
    }
    for slot in &patch.slots {
        let osc = &slot.oscillator;
        println!(
            "  {} oscillator: {:?} x{} amp {}{}",
            slot.id,
            osc.waveform,
            osc.frequency_factor,
            osc.amplitude,
            if osc.active { "" } else { " (off)" }
        );
        if let Some(env) = &slot.envelope {
            println!(
                "    envelope: {:?} A{} D{} S{} R{} q({}, {}, {}){}",
                env.mode,
                env.attack,
                env.decay,
                env.sustain,
                env.release,
                env.q_attack,
                env.q_decay,
                env.q_release,
                if env.active { "" } else { " (off)" }
            );
        }
    }

    if let Some(v) = &patch.voices {
        println!(
            "\nVoices: mod {} depth {}, curve A{} D{} S{} R{} over {} samples",
            v.mod_frequency, v.mod_amplitude, v.attack, v.decay, v.sustain, v.release, v.curve_length
        );
    }
}
