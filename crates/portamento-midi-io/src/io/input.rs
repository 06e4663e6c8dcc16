//! MIDI input via midir.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::{InputConnection, InputTransport, RawCallback};

/// System MIDI input driver.
///
/// Holds one midir client for enumeration and creates a fresh one per
/// connection, since midir consumes the client when connecting.
pub struct MidirInput {
    client_name: String,
    lister: MidiInput,
}

impl MidirInput {
    pub fn new(client_name: &str) -> Result<Self> {
        Ok(Self {
            client_name: client_name.to_string(),
            lister: MidiInput::new(client_name)?,
        })
    }

    fn client(&self) -> Result<MidiInput> {
        let mut input = MidiInput::new(&self.client_name)?;
        input.ignore(Ignore::None);
        Ok(input)
    }
}

impl InputTransport for MidirInput {
    type Connection = MidirInputConnection;

    fn port_names(&self) -> Vec<String> {
        self.lister
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| {
                self.lister
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index))
            })
            .collect()
    }

    fn port_count(&self) -> usize {
        self.lister.port_count()
    }

    fn open_port(
        &mut self,
        index: usize,
        client_port_name: &str,
        callback: RawCallback,
    ) -> Result<Self::Connection> {
        let input = self.client()?;
        let ports = input.ports();
        let port = ports.get(index).ok_or(Error::PortIndexOutOfRange {
            index,
            count: ports.len(),
        })?;

        let gate = Arc::new(AtomicBool::new(true));
        let connection = input.connect(
            port,
            client_port_name,
            gated(callback, Arc::clone(&gate)),
            (),
        )?;
        debug!(index, "midir input connected");
        Ok(MidirInputConnection { connection, gate })
    }

    fn supports_virtual_ports(&self) -> bool {
        cfg!(unix)
    }

    #[cfg(unix)]
    fn open_virtual_port(&mut self, name: &str, callback: RawCallback) -> Result<Self::Connection> {
        use midir::os::unix::VirtualInput;

        let gate = Arc::new(AtomicBool::new(true));
        let connection = self
            .client()?
            .create_virtual(name, gated(callback, Arc::clone(&gate)), ())?;
        debug!(port = name, "midir virtual input created");
        Ok(MidirInputConnection { connection, gate })
    }
}

/// Wrap `callback` so it stops once `gate` closes and receives the time since
/// the previous message in seconds instead of midir's absolute microseconds.
fn gated(
    mut callback: RawCallback,
    gate: Arc<AtomicBool>,
) -> impl FnMut(u64, &[u8], &mut ()) + Send + 'static {
    let mut last: Option<u64> = None;
    move |stamp, bytes, _| {
        if !gate.load(Ordering::Acquire) {
            return;
        }
        callback(delta_seconds(&mut last, stamp), bytes);
    }
}

fn delta_seconds(last: &mut Option<u64>, stamp: u64) -> f64 {
    let delta = last.map_or(0.0, |prev| stamp.saturating_sub(prev) as f64 / 1_000_000.0);
    *last = Some(stamp);
    delta
}

pub struct MidirInputConnection {
    connection: MidiInputConnection<()>,
    gate: Arc<AtomicBool>,
}

impl InputConnection for MidirInputConnection {
    fn cancel_callback(&mut self) {
        self.gate.store(false, Ordering::Release);
    }

    fn close(self) {
        self.gate.store(false, Ordering::Release);
        // midir waits for its callback thread while closing.
        let _ = self.connection.close();
    }
}
