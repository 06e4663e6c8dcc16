//! # Portamento - MIDI input decoding and delivery
//!
//! Decodes raw MIDI from a driver callback thread into typed messages and
//! hands them to application code, either directly on the callback thread
//! or in order through a queue drained from your own loop.
//!
//! ## Architecture
//!
//! Portamento is an umbrella crate that coordinates:
//! - **portamento-midi** - Status codes, messages, decoder, state buffers, message queue
//! - **portamento-midi-io** - Transports, input/output sessions, listener dispatch
//!
//! ## Quick Start
//!
//! ```ignore
//! use portamento::prelude::*;
//!
//! let mut input = InputSessionBuilder::new()
//!     .client_name("my-app")
//!     .build()?;
//! input.open(0)?;
//!
//! input.add_listener(DeliveryMode::Deferred, |msg| {
//!     if msg.is_note_on() {
//!         println!("note {} vel {}", msg.pitch(), msg.velocity());
//!     }
//! });
//!
//! // Once per frame / tick
//! input.poll();
//! let modwheel = input.state().control(1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Hardware MIDI I/O
//! - `midi-io` - midir-backed transports

/// Re-export of portamento-midi for direct access
pub use portamento_midi as midi;

/// Re-export of portamento-midi-io for direct access
pub use portamento_midi_io as midi_io;

mod error;
pub use error::{Error, Result};

// Core types
pub use portamento_midi::{
    decode, message_channel, ChannelStateBuffers, DecodeError, Message, MessageConsumer,
    MessageDecoder, MessageProducer, OverflowPolicy, QueueConfig, StatusCode,
    DEFAULT_QUEUE_CAPACITY, PITCH_BEND_CENTER, STATE_SLOTS,
};

// Sessions and transports
pub use portamento_midi_io::{
    DeliveryMode, DispatchRouter, IgnoreTypes, InputConnection, InputSession,
    InputSessionBuilder, InputTransport, ListenerId, LoopbackTransport, OutputConnection,
    OutputSession, OutputTransport, PortInfo, SessionConfig, SessionStats,
};

#[cfg(feature = "midi-io")]
pub use portamento_midi_io::{MidirInput, MidirOutput};

/// Convenience prelude for common imports
pub mod prelude {
    // Sessions
    pub use crate::{DeliveryMode, InputSession, InputSessionBuilder, OutputSession};

    // Essential types
    pub use crate::{ChannelStateBuffers, Message, StatusCode};

    // Configuration
    pub use crate::{OverflowPolicy, SessionConfig};

    // Transports
    pub use crate::{InputTransport, LoopbackTransport, OutputTransport};

    #[cfg(feature = "midi-io")]
    pub use crate::{MidirInput, MidirOutput};

    pub use crate::{Error, Result};
}
