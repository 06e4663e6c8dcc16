//! Error types for the MIDI I/O subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no MIDI ports available")]
    NoPortsAvailable,

    #[error("MIDI port index {index} out of range ({count} ports available)")]
    PortIndexOutOfRange { index: usize, count: usize },

    #[error("virtual MIDI ports are not supported by this transport")]
    VirtualPortsUnsupported,

    #[error("failed to initialize MIDI transport: {0}")]
    TransportInitFailure(String),

    #[error("failed to connect MIDI port: {0}")]
    Connect(String),

    #[error("failed to send MIDI message: {0}")]
    Send(String),

    #[error("MIDI port is not open")]
    NotOpen,

    #[error("invalid MIDI message ({len} bytes)")]
    InvalidMessage { len: usize },
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::TransportInitFailure(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::Connect(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::Connect(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::Send(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
