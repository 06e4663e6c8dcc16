//! MIDI I/O for Portamento.
//!
//! Connects [`portamento_midi`]'s decoder and queue to real ports.
//!
//! # Features
//!
//! - **Input sessions**: open a port, decode on the driver thread, receive
//!   messages directly on that thread or deferred to your own loop
//! - **Output sessions**: send raw 1-3 byte messages and sysex
//! - **Hardware I/O**: midir-backed transports (feature: `midi-io`)
//! - **Loopback**: in-process transport for tests and routing without a driver
//!
//! # Example
//!
//! ```ignore
//! use portamento_midi_io::{DeliveryMode, InputSessionBuilder};
//!
//! let mut input = InputSessionBuilder::new()
//!     .client_name("my-app")
//!     .ignore_types(true, true, true)
//!     .build()?;
//! println!("{:?}", input.list_ports());
//! input.open(0)?;
//!
//! input.add_listener(DeliveryMode::Deferred, |msg| {
//!     println!("{:?} ch{} {}", msg.status(), msg.channel(), msg.value());
//! });
//!
//! loop {
//!     input.poll();
//!     let held = input.state().held_notes().count();
//!     # break;
//! }
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

// Transports
mod loopback;
mod transport;
pub use loopback::{LoopbackInputConnection, LoopbackOutputConnection, LoopbackTransport, SentMessage};
pub use transport::{
    InputConnection, InputTransport, OutputConnection, OutputTransport, PortInfo, RawCallback,
};

#[cfg(feature = "midi-io")]
pub mod io;
#[cfg(feature = "midi-io")]
pub use io::{MidirInput, MidirOutput};

// Sessions
mod config;
mod dispatch;
mod session;
mod stats;
pub use config::{IgnoreTypes, SessionConfig, DEFAULT_CLIENT_NAME};
pub use dispatch::{DeliveryMode, DispatchRouter, ListenerId};
pub use session::{InputSession, InputSessionBuilder, OutputSession};
pub use stats::SessionStats;

// Re-export core types so users need only this crate
pub use portamento_midi::{
    ChannelStateBuffers, DecodeError, Message, OverflowPolicy, QueueConfig, StatusCode,
    PITCH_BEND_CENTER,
};
