//! MIDI status byte classification.

use serde::{Deserialize, Serialize};

/// Message type carried by a status byte.
///
/// Channel voice messages are identified by the high nibble of the status
/// byte; system messages (status >= 0xF0) by the full byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    // Channel voice
    NoteOff,
    NoteOn,
    /// Key pressure.
    PolyAftertouch,
    ControlChange,
    ProgramChange,
    /// Channel pressure.
    Aftertouch,
    PitchBend,

    // System common
    SysEx,
    TimeCode,
    SongPosition,
    SongSelect,
    TuneRequest,
    SysExEnd,

    // System real-time
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,

    /// Data byte in status position, or an undefined system byte.
    Unknown,
}

impl StatusCode {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const SYSEX: u8 = 0xF0;

    /// Classify a status byte. Channel bits are ignored for voice messages.
    pub fn from_status_byte(byte: u8) -> Self {
        if byte >= Self::SYSEX {
            return match byte {
                0xF0 => StatusCode::SysEx,
                0xF1 => StatusCode::TimeCode,
                0xF2 => StatusCode::SongPosition,
                0xF3 => StatusCode::SongSelect,
                0xF6 => StatusCode::TuneRequest,
                0xF7 => StatusCode::SysExEnd,
                0xF8 => StatusCode::TimingClock,
                0xFA => StatusCode::Start,
                0xFB => StatusCode::Continue,
                0xFC => StatusCode::Stop,
                0xFE => StatusCode::ActiveSensing,
                0xFF => StatusCode::SystemReset,
                // 0xF4, 0xF5, 0xF9, 0xFD are undefined
                _ => StatusCode::Unknown,
            };
        }

        match byte & 0xF0 {
            Self::NOTE_OFF => StatusCode::NoteOff,
            Self::NOTE_ON => StatusCode::NoteOn,
            Self::POLY_AFTERTOUCH => StatusCode::PolyAftertouch,
            Self::CONTROL_CHANGE => StatusCode::ControlChange,
            Self::PROGRAM_CHANGE => StatusCode::ProgramChange,
            Self::AFTERTOUCH => StatusCode::Aftertouch,
            Self::PITCH_BEND => StatusCode::PitchBend,
            _ => StatusCode::Unknown,
        }
    }

    /// Representative status byte (channel nibble 0 for voice messages).
    pub fn to_byte(self) -> Option<u8> {
        let byte = match self {
            StatusCode::NoteOff => Self::NOTE_OFF,
            StatusCode::NoteOn => Self::NOTE_ON,
            StatusCode::PolyAftertouch => Self::POLY_AFTERTOUCH,
            StatusCode::ControlChange => Self::CONTROL_CHANGE,
            StatusCode::ProgramChange => Self::PROGRAM_CHANGE,
            StatusCode::Aftertouch => Self::AFTERTOUCH,
            StatusCode::PitchBend => Self::PITCH_BEND,
            StatusCode::SysEx => 0xF0,
            StatusCode::TimeCode => 0xF1,
            StatusCode::SongPosition => 0xF2,
            StatusCode::SongSelect => 0xF3,
            StatusCode::TuneRequest => 0xF6,
            StatusCode::SysExEnd => 0xF7,
            StatusCode::TimingClock => 0xF8,
            StatusCode::Start => 0xFA,
            StatusCode::Continue => 0xFB,
            StatusCode::Stop => 0xFC,
            StatusCode::ActiveSensing => 0xFE,
            StatusCode::SystemReset => 0xFF,
            StatusCode::Unknown => return None,
        };
        Some(byte)
    }

    /// Number of data bytes following the status byte.
    ///
    /// `None` for sysex (variable length) and unknown statuses.
    pub fn data_len(self) -> Option<usize> {
        match self {
            StatusCode::NoteOff
            | StatusCode::NoteOn
            | StatusCode::PolyAftertouch
            | StatusCode::ControlChange
            | StatusCode::PitchBend
            | StatusCode::SongPosition => Some(2),
            StatusCode::ProgramChange
            | StatusCode::Aftertouch
            | StatusCode::TimeCode
            | StatusCode::SongSelect => Some(1),
            StatusCode::TuneRequest
            | StatusCode::SysExEnd
            | StatusCode::TimingClock
            | StatusCode::Start
            | StatusCode::Continue
            | StatusCode::Stop
            | StatusCode::ActiveSensing
            | StatusCode::SystemReset => Some(0),
            StatusCode::SysEx | StatusCode::Unknown => None,
        }
    }

    #[inline]
    pub fn is_channel(self) -> bool {
        matches!(
            self,
            StatusCode::NoteOff
                | StatusCode::NoteOn
                | StatusCode::PolyAftertouch
                | StatusCode::ControlChange
                | StatusCode::ProgramChange
                | StatusCode::Aftertouch
                | StatusCode::PitchBend
        )
    }

    #[inline]
    pub fn is_system(self) -> bool {
        !self.is_channel() && self != StatusCode::Unknown
    }

    /// Single-byte real-time messages (0xF8..=0xFF).
    #[inline]
    pub fn is_realtime(self) -> bool {
        matches!(
            self,
            StatusCode::TimingClock
                | StatusCode::Start
                | StatusCode::Continue
                | StatusCode::Stop
                | StatusCode::ActiveSensing
                | StatusCode::SystemReset
        )
    }
}
