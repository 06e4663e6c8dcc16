//! Print incoming MIDI messages from one input port.
//!
//! Run with: cargo run -p portamento-midi-io --example monitor -- [port index]

use std::thread;
use std::time::Duration;

use portamento_midi_io::{DeliveryMode, InputSessionBuilder, StatusCode};

fn main() -> portamento_midi_io::Result<()> {
    tracing_subscriber::fmt::init();

    let index = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let mut input = InputSessionBuilder::new()
        .client_name("portamento-monitor")
        .ignore_types(false, true, true)
        .build()?;

    for port in input.ports() {
        println!("{}: {}", port.index, port.name);
    }
    input.open(index)?;
    println!("Listening on {}", input.port_name().unwrap_or("?"));

    input.add_listener(DeliveryMode::Deferred, |msg| match msg.status() {
        StatusCode::NoteOn | StatusCode::NoteOff => println!(
            "{:>8.4}s ch{:<2} {:?} pitch {} vel {}",
            msg.timestamp(),
            msg.channel(),
            msg.status(),
            msg.pitch(),
            msg.velocity()
        ),
        StatusCode::ControlChange => println!(
            "{:>8.4}s ch{:<2} CC {} = {}",
            msg.timestamp(),
            msg.channel(),
            msg.control(),
            msg.value()
        ),
        status => println!(
            "{:>8.4}s ch{:<2} {:?} {}",
            msg.timestamp(),
            msg.channel(),
            status,
            msg.value()
        ),
    });

    loop {
        input.poll();
        thread::sleep(Duration::from_millis(5));
    }
}
