//! Centralized error type for the portamento umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI: {0}")]
    Midi(#[from] portamento_midi_io::Error),

    #[error("Decode: {0}")]
    Decode(#[from] portamento_midi::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
