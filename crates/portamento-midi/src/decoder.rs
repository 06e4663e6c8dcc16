//! MIDI byte decoder.
//!
//! Turns one raw buffer from the transport into a [`Message`], updating the
//! session's [`ChannelStateBuffers`] for notes and controllers. The buffer is
//! validated before anything is written, so a failed decode never touches
//! the state buffers.

use std::sync::Arc;

use crate::error::{DecodeError, Result};
use crate::{ChannelStateBuffers, Message, StatusCode};

/// Decode a single MIDI message.
///
/// * `bytes` - status byte followed by its data bytes
/// * `timestamp` - seconds since the previous message on this port
/// * `port` - originating port index, `None` for virtual ports
/// * `source_name` - port name stamped onto the message
/// * `state` - note/controller buffers updated by Note and CC messages
pub fn decode(
    bytes: &[u8],
    timestamp: f64,
    port: Option<usize>,
    source_name: &Arc<str>,
    state: &ChannelStateBuffers,
) -> Result<Message> {
    let first = *bytes.first().ok_or(DecodeError::Empty)?;
    let status = StatusCode::from_status_byte(first);

    let channel = if first < 0xF0 { (first & 0x0F) + 1 } else { 0 };

    let mut msg = Message::empty(status, channel, timestamp, port, Arc::clone(source_name));

    if !status.is_channel() {
        return Ok(msg);
    }

    let expected = 1 + status.data_len().unwrap_or(0);
    if bytes.len() < expected {
        return Err(DecodeError::TruncatedMessage {
            status: first,
            expected,
            actual: bytes.len(),
        });
    }

    // Transports deliver 7-bit data bytes; masking keeps buffer indices in range.
    let data1 = bytes[1] & 0x7F;
    let data2 = bytes.get(2).map_or(0, |b| b & 0x7F);

    match status {
        StatusCode::NoteOn | StatusCode::NoteOff => {
            msg.pitch = data1;
            msg.velocity = data2;
            state.set_note(data1, data2);
        }
        StatusCode::PolyAftertouch => {
            msg.pitch = data1;
            msg.value = data2 as u16;
            state.set_note(data1, data2);
        }
        StatusCode::ControlChange => {
            msg.control = data1;
            msg.value = data2 as u16;
            state.set_control(data1, data2);
        }
        StatusCode::ProgramChange | StatusCode::Aftertouch => {
            msg.value = data1 as u16;
        }
        StatusCode::PitchBend => {
            msg.value = ((data2 as u16) << 7) | data1 as u16;
        }
        _ => {}
    }

    Ok(msg)
}

/// Decoding context for one port: its identity and its state buffers.
#[derive(Debug, Clone)]
pub struct MessageDecoder {
    port: Option<usize>,
    source_name: Arc<str>,
    state: Arc<ChannelStateBuffers>,
}

impl MessageDecoder {
    pub fn new(
        port: Option<usize>,
        source_name: impl Into<Arc<str>>,
        state: Arc<ChannelStateBuffers>,
    ) -> Self {
        Self {
            port,
            source_name: source_name.into(),
            state,
        }
    }

    #[inline]
    pub fn decode(&self, timestamp: f64, bytes: &[u8]) -> Result<Message> {
        decode(bytes, timestamp, self.port, &self.source_name, &self.state)
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}
