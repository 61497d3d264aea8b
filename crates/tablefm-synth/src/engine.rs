//! Audio-thread side of the engine handoff.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::config::EngineConfig;
use crate::control::{ControlHandle, EngineCommand, Retired};
use crate::router::AlgorithmRouter;

/// An [`AlgorithmRouter`] fed by a [`ControlHandle`] on another thread.
///
/// Queued commands are applied at the start of each block, so a block never
/// sees a parameter change halfway through. Applying a command never
/// allocates or frees: tables arrive fully built and the ones they replace
/// are sent back to the handle.
///
/// # Example
///
/// ```rust
/// use tablefm_synth::{EngineConfig, FmEngine, SlotId};
///
/// let (mut engine, mut handle) = FmEngine::new(EngineConfig::new(1024, 10.0));
///
/// handle.set_envelope_q(SlotId::ONE, 2.0, 0.5, 0.5).unwrap();
/// handle.note_on(20.0, 100.0).unwrap();
///
/// let mut block = [0.0_f32; 64];
/// engine.process(&[], &mut block);
/// assert_eq!(engine.router().master_frequency(), 20.0);
/// assert_eq!(engine.router().envelope(SlotId::ONE).q().attack, 2.0);
/// ```
#[derive(Debug)]
pub struct FmEngine {
    router: AlgorithmRouter,
    commands: Receiver<EngineCommand>,
    retired: Sender<Retired>,
}

impl FmEngine {
    /// Build an engine and the handle that controls it.
    pub fn new(config: EngineConfig) -> (Self, ControlHandle) {
        let capacity = config.control_queue_capacity.max(1);
        let (command_tx, command_rx) = bounded(capacity);
        let (retired_tx, retired_rx) = bounded(capacity);

        let router = config.router();
        let mut handle = ControlHandle::new(
            command_tx,
            retired_rx,
            router.table_size(),
            config.envelope_capabilities,
        );
        handle.sync_curve_q(&router);

        #[cfg(feature = "tracing")]
        tracing::info!(
            table_size = router.table_size(),
            master_frequency = config.master_frequency,
            queue_capacity = capacity,
            "fm engine created"
        );

        let engine = Self {
            router,
            commands: command_rx,
            retired: retired_tx,
        };
        (engine, handle)
    }

    /// Apply pending commands, then process one block.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        self.drain_commands();
        self.router.process(input, output);
    }

    /// Apply pending commands, then process one block in place.
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        self.drain_commands();
        self.router.process_in_place(buffer);
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn drain_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, command: EngineCommand) {
        let router = &mut self.router;
        match command {
            EngineCommand::NoteOn {
                frequency,
                velocity,
            } => router.note_on(frequency, velocity),
            EngineCommand::NoteOff => router.note_off(),
            EngineCommand::SetOscillatorFrequencyFactor { slot, factor } => {
                router.set_oscillator_frequency_factor(slot, factor);
            }
            EngineCommand::SetOscillatorAmplitude { slot, amplitude } => {
                router.set_oscillator_amplitude(slot, amplitude);
            }
            EngineCommand::SetMasterFrequency(f) => router.set_master_frequency(f),
            EngineCommand::SetMasterAmplitude(a) => router.set_master_amplitude(a),
            EngineCommand::SetEnvelope {
                slot,
                attack,
                decay,
                sustain,
                release,
            } => router.set_envelope(slot, attack, decay, sustain, release),
            EngineCommand::InstallEnvelopeCurves { slot, curves } => {
                let old = router.swap_envelope_curves(slot, curves);
                self.retire(Retired::Curves(old));
            }
            EngineCommand::SetEnvelopeMode { slot, mode } => router.set_envelope_mode(slot, mode),
            EngineCommand::SetSilentTime {
                slot,
                silent,
                sustain_loop,
            } => router.set_silent_time(slot, silent, sustain_loop),
            EngineCommand::SetAlgorithm(algorithm) => router.set_algorithm_kind(algorithm),
            EngineCommand::InstallWaveTable { slot, table } => {
                let old = router.swap_wave_table(slot, table);
                self.retire(Retired::WaveTable(old));
            }
            EngineCommand::SetActive { target, active } => router.set_active(target, active),
            EngineCommand::ToggleActive(target) => router.toggle_active(target),
        }
    }

    fn retire(&self, table: Retired) {
        // Full or disconnected: the table drops here instead.
        let _ = self.retired.try_send(table);
    }

    /// The router, for readbacks.
    pub fn router(&self) -> &AlgorithmRouter {
        &self.router
    }

    /// Change the router directly while both halves are on one thread, e.g.
    /// to apply a patch before audio starts.
    ///
    /// Queued commands are applied first. Afterwards `handle` picks up the
    /// router's curve exponents, so its later Q updates keep what `setup`
    /// installed. `handle` must be the one returned with this engine.
    pub fn configure<R>(
        &mut self,
        handle: &mut ControlHandle,
        setup: impl FnOnce(&mut AlgorithmRouter) -> R,
    ) -> R {
        self.drain_commands();
        let result = setup(&mut self.router);
        handle.sync_curve_q(&self.router);
        result
    }
}
