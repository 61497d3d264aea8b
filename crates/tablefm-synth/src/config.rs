//! Engine construction parameters.

use tablefm_core::EnvelopeCapabilities;

use crate::router::AlgorithmRouter;

/// Everything fixed when an engine is built.
///
/// # Example
///
/// ```rust
/// use tablefm_core::EnvelopeCapabilities;
/// use tablefm_synth::EngineConfig;
///
/// let config = EngineConfig::new(4096, 40.0)
///     .with_queue_capacity(64)
///     .with_capabilities(EnvelopeCapabilities::BASIC);
/// let router = config.router();
/// assert_eq!(router.table_size(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Length of every waveform and curve table.
    pub table_size: usize,
    /// Initial master per-sample increment.
    pub master_frequency: f32,
    /// Pending control commands allowed before senders see `QueueFull`.
    pub control_queue_capacity: usize,
    /// Envelope features available to every slot.
    pub envelope_capabilities: EnvelopeCapabilities,
}

impl Default for EngineConfig {
    /// A 44100-sample table, so at 44.1 kHz increments read in Hz.
    fn default() -> Self {
        Self {
            table_size: 44100,
            master_frequency: 440.0,
            control_queue_capacity: 256,
            envelope_capabilities: EnvelopeCapabilities::FULL,
        }
    }
}

impl EngineConfig {
    /// Config with the given table size and master frequency, other fields
    /// at their defaults.
    pub fn new(table_size: usize, master_frequency: f32) -> Self {
        Self {
            table_size,
            master_frequency,
            ..Self::default()
        }
    }

    /// Set the control queue capacity (at least 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.control_queue_capacity = capacity.max(1);
        self
    }

    /// Set the envelope feature set.
    pub fn with_capabilities(mut self, capabilities: EnvelopeCapabilities) -> Self {
        self.envelope_capabilities = capabilities;
        self
    }

    /// Build a router from this config.
    pub fn router(&self) -> AlgorithmRouter {
        AlgorithmRouter::with_capabilities(
            self.table_size,
            self.master_frequency,
            self.envelope_capabilities,
        )
    }
}
