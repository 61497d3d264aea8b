//! Algorithm listing.

use tablefm_core::OscMode;
use tablefm_synth::{Algorithm, SlotId};

fn describe(mode: OscMode) -> &'static str {
    match mode {
        OscMode::ModulatorNoInput => "modulator",
        OscMode::ModulatorWithInput => "modulated modulator",
        OscMode::CarrierNoInput => "carrier",
        OscMode::CarrierWithInput => "modulated carrier",
        OscMode::SumWithInput => "sum",
    }
}

pub fn run() -> anyhow::Result<()> {
    println!("Algorithms");
    println!("==========\n");
    println!("Slots run 1 -> 4; each active slot reads the output of the one before.\n");

    for algorithm in Algorithm::ALL {
        println!("  {}  {}", algorithm.id(), algorithm.name());
        for (slot, mode) in SlotId::ALL.iter().zip(algorithm.modes()) {
            println!("       slot {}: {}", slot.get(), describe(mode));
        }
    }
    Ok(())
}
