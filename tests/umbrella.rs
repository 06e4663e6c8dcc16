//! Umbrella crate tests: prelude imports and error conversion.

use std::sync::Arc;

use parking_lot::Mutex;
use portamento::prelude::*;

fn open_keyboard() -> Result<(InputSession<LoopbackTransport>, LoopbackTransport)> {
    let transport = LoopbackTransport::new(["Keyboard"]);
    let mut session = InputSessionBuilder::new().build_with(transport.clone());
    session.open(0)?;
    Ok((session, transport))
}

#[test]
fn test_prelude_pipeline() {
    let (mut session, transport) = open_keyboard().unwrap();
    let notes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notes);
    session.add_listener(DeliveryMode::Deferred, move |msg: &Message| {
        if msg.is_note_on() {
            sink.lock().push(msg.pitch());
        }
    });

    transport.inject(0, 0.0, &[0x90, 60, 100]);
    transport.inject(0, 0.0, &[0x90, 64, 0]);
    transport.inject(0, 0.0, &[0x90, 67, 90]);
    session.poll();

    assert_eq!(*notes.lock(), vec![60, 67]);
    assert_eq!(session.state().note(64), 0);
}

#[test]
fn test_errors_convert_with_question_mark() {
    fn open_missing() -> Result<()> {
        let mut session = InputSessionBuilder::new().build_with(LoopbackTransport::default());
        session.open(0)?;
        Ok(())
    }

    fn decode_truncated() -> Result<Message> {
        let state = ChannelStateBuffers::new();
        Ok(portamento::decode(&[0xB0, 1], 0.0, None, &Arc::from("x"), &state)?)
    }

    assert!(matches!(
        open_missing(),
        Err(Error::Midi(portamento::midi_io::Error::NoPortsAvailable))
    ));
    assert!(matches!(
        decode_truncated(),
        Err(Error::Decode(portamento::DecodeError::TruncatedMessage { .. }))
    ));
}
