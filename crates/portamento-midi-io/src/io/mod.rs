//! Hardware MIDI I/O.
//!
//! Transports backed by the system MIDI driver via midir. Virtual ports are
//! available on ALSA and CoreMIDI only. Requires the `midi-io` feature.

mod input;
mod output;

pub use input::{MidirInput, MidirInputConnection};
pub use output::{MidirOutput, MidirOutputConnection};
