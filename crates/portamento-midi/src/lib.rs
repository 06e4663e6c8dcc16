//! Transport-free MIDI core for Portamento.
//!
//! Decodes raw MIDI buffers into [`Message`]s, keeps per-port note and
//! controller state in lock-free [`ChannelStateBuffers`], and moves decoded
//! messages from the transport callback thread to the application thread
//! through a bounded [`message_channel`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use portamento_midi::{message_channel, ChannelStateBuffers, MessageDecoder, QueueConfig};
//!
//! let state = Arc::new(ChannelStateBuffers::new());
//! let decoder = MessageDecoder::new(Some(0), "Keyboard", Arc::clone(&state));
//! let (mut tx, mut rx) = message_channel(QueueConfig::default());
//!
//! // Transport callback thread
//! if let Ok(msg) = decoder.decode(0.0, &[0x90, 60, 100]) {
//!     tx.push(msg);
//! }
//!
//! // Application thread
//! for msg in rx.drain() {
//!     assert_eq!(msg.pitch(), 60);
//! }
//! assert_eq!(state.note(60), 100);
//! ```

// Error types
pub mod error;
pub use error::{DecodeError, Result};

mod decoder;
mod message;
mod queue;
mod state;
mod status;

pub use decoder::{decode, MessageDecoder};
pub use message::{Message, PITCH_BEND_CENTER};
pub use queue::{
    message_channel, Drain, MessageConsumer, MessageProducer, OverflowPolicy, QueueConfig,
    DEFAULT_QUEUE_CAPACITY,
};
pub use state::{ChannelStateBuffers, STATE_SLOTS};
pub use status::StatusCode;
