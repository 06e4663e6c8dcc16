//! Decoded MIDI message.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::StatusCode;

/// Pitch bend value with no bend applied.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// A decoded MIDI event.
///
/// Only the fields relevant to `status` carry data; the rest are zero:
///
/// | status | populated |
/// |---|---|
/// | NoteOn, NoteOff | `pitch`, `velocity` |
/// | PolyAftertouch | `pitch`, `value` |
/// | ControlChange | `control`, `value` |
/// | ProgramChange, Aftertouch, PitchBend | `value` |
/// | system, Unknown | none |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub(crate) port: Option<usize>,
    pub(crate) status: StatusCode,
    pub(crate) channel: u8,
    pub(crate) pitch: u8,
    pub(crate) velocity: u8,
    pub(crate) control: u8,
    pub(crate) value: u16,
    pub(crate) timestamp: f64,
    pub(crate) source_name: Arc<str>,
}

impl Message {
    pub(crate) fn empty(
        status: StatusCode,
        channel: u8,
        timestamp: f64,
        port: Option<usize>,
        source_name: Arc<str>,
    ) -> Self {
        Self {
            port,
            status,
            channel,
            pitch: 0,
            velocity: 0,
            control: 0,
            value: 0,
            timestamp,
            source_name,
        }
    }

    /// Index of the originating port; `None` for virtual ports.
    #[inline]
    pub fn port(&self) -> Option<usize> {
        self.port
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// MIDI channel 1-16, or 0 for system messages.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    #[inline]
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[inline]
    pub fn control(&self) -> u8 {
        self.control
    }

    /// Controller value, program, pressure, or 14-bit pitch bend.
    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Seconds since the previous message on the same port.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Port name at decode time.
    #[inline]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    #[inline]
    pub fn is_virtual_source(&self) -> bool {
        self.port.is_none()
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.status == StatusCode::NoteOn && self.velocity > 0
    }

    /// Note Off, or Note On with velocity 0.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        match self.status {
            StatusCode::NoteOff => true,
            StatusCode::NoteOn => self.velocity == 0,
            _ => false,
        }
    }

    /// Signed bend offset from center (-8192..=8191).
    pub fn bend(&self) -> Option<i16> {
        (self.status == StatusCode::PitchBend)
            .then(|| (self.value as i32 - PITCH_BEND_CENTER as i32) as i16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, ChannelStateBuffers};

    fn decode_one(bytes: &[u8]) -> Message {
        let state = ChannelStateBuffers::new();
        decode(bytes, 0.0, Some(0), &Arc::from("Test"), &state).unwrap()
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let msg = decode_one(&[0x90, 60, 0]);
        assert_eq!(msg.status(), StatusCode::NoteOn);
        assert!(!msg.is_note_on());
        assert!(msg.is_note_off());
    }

    #[test]
    fn test_note_off() {
        let msg = decode_one(&[0x80, 60, 64]);
        assert!(msg.is_note_off());
        assert!(!msg.is_note_on());
        assert_eq!(msg.velocity(), 64);
    }

    #[test]
    fn test_bend_offset() {
        assert_eq!(decode_one(&[0xE0, 0x00, 0x40]).bend(), Some(0));
        assert_eq!(decode_one(&[0xE0, 0x00, 0x00]).bend(), Some(-8192));
        assert_eq!(decode_one(&[0xE0, 0x7F, 0x7F]).bend(), Some(8191));
        assert_eq!(decode_one(&[0xB0, 1, 2]).bend(), None);
    }

    #[test]
    fn test_source_accessors() {
        let state = ChannelStateBuffers::new();
        let msg = decode(&[0xF8], 0.25, None, &Arc::from("Virtual In"), &state).unwrap();
        assert!(msg.is_virtual_source());
        assert_eq!(msg.source_name(), "Virtual In");
        assert_eq!(msg.timestamp(), 0.25);
    }
}
