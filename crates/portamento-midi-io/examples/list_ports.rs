//! Print every MIDI input and output port.
//!
//! Run with: cargo run -p portamento-midi-io --example list_ports

use portamento_midi_io::{InputTransport, MidirInput, MidirOutput, OutputTransport};

fn main() -> portamento_midi_io::Result<()> {
    tracing_subscriber::fmt::init();

    let input = MidirInput::new("portamento-list")?;
    println!("Inputs:");
    for (index, name) in input.port_names().iter().enumerate() {
        println!("  {index}: {name}");
    }

    let output = MidirOutput::new("portamento-list")?;
    println!("Outputs:");
    for (index, name) in output.port_names().iter().enumerate() {
        println!("  {index}: {name}");
    }
    Ok(())
}
