//! Control-thread side of the engine handoff.
//!
//! A [`ControlHandle`] turns parameter calls into [`EngineCommand`]s on a
//! bounded lock-free queue. Anything that allocates happens here: curve
//! regeneration and waveform validation build complete tables before they are
//! sent, so the audio thread only ever swaps a pointer. Tables the engine
//! stops using travel back on a second queue and are dropped by
//! [`ControlHandle::collect_garbage`], keeping deallocation off the audio
//! thread too.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tablefm_core::{CurveQ, EnvelopeCapabilities, EnvelopeCurves, EnvelopeMode, WaveTable};

use crate::error::ControlError;
use crate::router::{Algorithm, AlgorithmRouter, SLOT_COUNT, SlotId, SlotTarget};

/// A control change waiting to be applied at the next block boundary.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Retune and start every envelope.
    NoteOn {
        /// Master per-sample increment.
        frequency: f32,
        /// Velocity in `[0, 128]`.
        velocity: f32,
    },
    /// Release every envelope.
    NoteOff,
    /// Set one slot's frequency factor.
    SetOscillatorFrequencyFactor {
        /// Target slot.
        slot: SlotId,
        /// Multiple of the master frequency.
        factor: f32,
    },
    /// Set one slot's oscillator gain.
    SetOscillatorAmplitude {
        /// Target slot.
        slot: SlotId,
        /// Gain in `[0, 1]`.
        amplitude: f32,
    },
    /// Set the master increment.
    SetMasterFrequency(f32),
    /// Set the output gain.
    SetMasterAmplitude(f32),
    /// Set one envelope's stage times and sustain level.
    SetEnvelope {
        /// Target slot.
        slot: SlotId,
        /// Attack time.
        attack: f32,
        /// Decay time.
        decay: f32,
        /// Sustain level.
        sustain: f32,
        /// Release time.
        release: f32,
    },
    /// Install pre-built envelope curves.
    InstallEnvelopeCurves {
        /// Target slot.
        slot: SlotId,
        /// Complete replacement curves.
        curves: Arc<EnvelopeCurves>,
    },
    /// Switch one envelope between trigger and loop.
    SetEnvelopeMode {
        /// Target slot.
        slot: SlotId,
        /// New mode.
        mode: EnvelopeMode,
    },
    /// Set one envelope's loop-mode Silent and Sustain times.
    SetSilentTime {
        /// Target slot.
        slot: SlotId,
        /// Silent time.
        silent: f32,
        /// Sustain time in loop mode.
        sustain_loop: f32,
    },
    /// Select the routing topology.
    SetAlgorithm(Algorithm),
    /// Install a pre-built waveform.
    InstallWaveTable {
        /// Target slot.
        slot: SlotId,
        /// Complete replacement waveform.
        table: WaveTable,
    },
    /// Switch an oscillator or envelope on or off.
    SetActive {
        /// Oscillator or envelope.
        target: SlotTarget,
        /// New state.
        active: bool,
    },
    /// Flip an oscillator or envelope.
    ToggleActive(SlotTarget),
}

/// A table the engine no longer uses, sent back so it is dropped here.
#[derive(Debug)]
pub(crate) enum Retired {
    WaveTable(WaveTable),
    Curves(Arc<EnvelopeCurves>),
}

/// Sends control changes to an [`FmEngine`](crate::FmEngine) on another
/// thread.
///
/// Every method either queues its command or reports why it could not.
/// Parameter values are not checked here beyond what is needed to build
/// tables; the engine ignores out-of-range values on arrival exactly as the
/// direct router calls do.
#[derive(Debug)]
pub struct ControlHandle {
    commands: Sender<EngineCommand>,
    retired: Receiver<Retired>,
    table_size: usize,
    capabilities: EnvelopeCapabilities,
    curve_q: [CurveQ; SLOT_COUNT],
}

impl ControlHandle {
    pub(crate) fn new(
        commands: Sender<EngineCommand>,
        retired: Receiver<Retired>,
        table_size: usize,
        capabilities: EnvelopeCapabilities,
    ) -> Self {
        Self {
            commands,
            retired,
            table_size,
            capabilities,
            curve_q: [CurveQ::LINEAR; SLOT_COUNT],
        }
    }

    /// Take each slot's curve exponents from `router`, so later
    /// [`set_envelope_q`](Self::set_envelope_q) calls keep components the
    /// router already has.
    pub(crate) fn sync_curve_q(&mut self, router: &AlgorithmRouter) {
        for slot in SlotId::ALL {
            self.curve_q[slot.index()] = router.envelope(slot).q();
        }
    }

    /// Queue a raw command.
    pub fn send(&self, command: EngineCommand) -> Result<(), ControlError> {
        self.collect_garbage();
        self.commands.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("control queue full, command not sent");
                ControlError::QueueFull
            }
            TrySendError::Disconnected(_) => ControlError::Disconnected,
        })
    }

    /// Retune and start every envelope.
    pub fn note_on(&self, frequency: f32, velocity: f32) -> Result<(), ControlError> {
        self.send(EngineCommand::NoteOn {
            frequency,
            velocity,
        })
    }

    /// Release every envelope.
    pub fn note_off(&self) -> Result<(), ControlError> {
        self.send(EngineCommand::NoteOff)
    }

    /// Set one slot's frequency to `factor` times the master frequency.
    pub fn set_oscillator_frequency_factor(
        &self,
        slot: SlotId,
        factor: f32,
    ) -> Result<(), ControlError> {
        self.send(EngineCommand::SetOscillatorFrequencyFactor { slot, factor })
    }

    /// Set one slot's oscillator gain.
    pub fn set_oscillator_amplitude(
        &self,
        slot: SlotId,
        amplitude: f32,
    ) -> Result<(), ControlError> {
        self.send(EngineCommand::SetOscillatorAmplitude { slot, amplitude })
    }

    /// Set the master increment.
    pub fn set_master_frequency(&self, frequency: f32) -> Result<(), ControlError> {
        self.send(EngineCommand::SetMasterFrequency(frequency))
    }

    /// Set the output gain.
    pub fn set_master_amplitude(&self, amplitude: f32) -> Result<(), ControlError> {
        self.send(EngineCommand::SetMasterAmplitude(amplitude))
    }

    /// Set one envelope's stage times and sustain level.
    pub fn set_envelope(
        &self,
        slot: SlotId,
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    ) -> Result<(), ControlError> {
        self.send(EngineCommand::SetEnvelope {
            slot,
            attack,
            decay,
            sustain,
            release,
        })
    }

    /// Rebuild one envelope's curves here and send them over.
    ///
    /// Components `<= 0` keep their previous exponent. Does nothing when the
    /// engine was built without Q shaping.
    pub fn set_envelope_q(
        &mut self,
        slot: SlotId,
        attack: f32,
        decay: f32,
        release: f32,
    ) -> Result<(), ControlError> {
        if !self.capabilities.q_shaping {
            return Ok(());
        }
        let q = self.curve_q[slot.index()].merged(attack, decay, release);
        let curves = Arc::new(EnvelopeCurves::generate(self.table_size, q));
        self.send(EngineCommand::InstallEnvelopeCurves { slot, curves })?;
        self.curve_q[slot.index()] = q;

        #[cfg(feature = "tracing")]
        tracing::debug!(slot = slot.get(), ?q, "envelope curves queued");
        Ok(())
    }

    /// Switch one envelope between trigger and loop.
    pub fn set_envelope_mode(
        &self,
        slot: SlotId,
        mode: EnvelopeMode,
    ) -> Result<(), ControlError> {
        self.send(EngineCommand::SetEnvelopeMode { slot, mode })
    }

    /// Set one envelope's loop-mode Silent and Sustain times.
    pub fn set_silent_time(
        &self,
        slot: SlotId,
        silent: f32,
        sustain_loop: f32,
    ) -> Result<(), ControlError> {
        self.send(EngineCommand::SetSilentTime {
            slot,
            silent,
            sustain_loop,
        })
    }

    /// Select the algorithm by id. Ids outside `1..=4` are ignored.
    pub fn set_algorithm(&self, id: u8) -> Result<(), ControlError> {
        match Algorithm::from_id(id) {
            Some(algorithm) => self.send(EngineCommand::SetAlgorithm(algorithm)),
            None => Ok(()),
        }
    }

    /// Validate host samples and send them as a slot's waveform.
    pub fn load_wave_table(&self, slot: SlotId, samples: &[f32]) -> Result<(), ControlError> {
        let table = WaveTable::from_samples(samples, self.table_size)?;
        self.send(EngineCommand::InstallWaveTable { slot, table })
    }

    /// Send a fresh sine waveform to a slot.
    pub fn reset_waveform(&self, slot: SlotId) -> Result<(), ControlError> {
        let table = WaveTable::sine(self.table_size);
        self.send(EngineCommand::InstallWaveTable { slot, table })
    }

    /// Flip an oscillator or envelope.
    pub fn toggle_active(&self, target: SlotTarget) -> Result<(), ControlError> {
        self.send(EngineCommand::ToggleActive(target))
    }

    /// Switch an oscillator or envelope on or off.
    pub fn set_active(&self, target: SlotTarget, active: bool) -> Result<(), ControlError> {
        self.send(EngineCommand::SetActive { target, active })
    }

    /// Drop every table the engine has handed back. Returns how many.
    pub fn collect_garbage(&self) -> usize {
        let mut freed = 0;
        for retired in self.retired.try_iter() {
            match retired {
                Retired::WaveTable(table) => drop(table),
                Retired::Curves(curves) => drop(curves),
            }
            freed += 1;
        }
        freed
    }

    /// Curve exponents the handle builds from for `slot`.
    pub fn curve_q(&self, slot: SlotId) -> CurveQ {
        self.curve_q[slot.index()]
    }

    /// Table length of the engine.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Envelope features of the engine.
    pub fn capabilities(&self) -> EnvelopeCapabilities {
        self.capabilities
    }
}
