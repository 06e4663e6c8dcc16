//! InputSession builder.

use portamento_midi::OverflowPolicy;

use crate::config::{IgnoreTypes, SessionConfig};
use crate::transport::InputTransport;

#[cfg(feature = "midi-io")]
use crate::error::Result;
#[cfg(feature = "midi-io")]
use crate::io::MidirInput;

use super::InputSession;

#[derive(Debug, Clone, Default)]
pub struct InputSessionBuilder {
    config: SessionConfig,
}

impl InputSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client name registered with the MIDI driver.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue.capacity = capacity;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.config.queue.overflow = policy;
        self
    }

    pub fn ignore_types(mut self, sysex: bool, timing: bool, active_sensing: bool) -> Self {
        self.config.ignore = IgnoreTypes::new(sysex, timing, active_sensing);
        self
    }

    /// Replace the whole configuration, e.g. one loaded from a file.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build_with<T: InputTransport>(self, transport: T) -> InputSession<T> {
        InputSession::new(transport, self.config)
    }

    /// Build a session on the system MIDI driver.
    #[cfg(feature = "midi-io")]
    pub fn build(self) -> Result<InputSession<MidirInput>> {
        let transport = MidirInput::new(&self.config.client_name)?;
        Ok(self.build_with(transport))
    }
}
