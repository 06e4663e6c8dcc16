//! MIDI output via midir.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::{OutputConnection, OutputTransport};

/// System MIDI output driver.
pub struct MidirOutput {
    client_name: String,
    lister: MidiOutput,
}

impl MidirOutput {
    pub fn new(client_name: &str) -> Result<Self> {
        Ok(Self {
            client_name: client_name.to_string(),
            lister: MidiOutput::new(client_name)?,
        })
    }
}

impl OutputTransport for MidirOutput {
    type Connection = MidirOutputConnection;

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

    fn open_port(&mut self, index: usize, client_port_name: &str) -> Result<Self::Connection> {
        let output = MidiOutput::new(&self.client_name)?;
        let ports = output.ports();
        let port = ports.get(index).ok_or(Error::PortIndexOutOfRange {
            index,
            count: ports.len(),
        })?;

        let connection = output.connect(port, client_port_name)?;
        debug!(index, "midir output connected");
        Ok(MidirOutputConnection(connection))
    }

    fn supports_virtual_ports(&self) -> bool {
        cfg!(unix)
    }

    #[cfg(unix)]
    fn open_virtual_port(&mut self, name: &str) -> Result<Self::Connection> {
        use midir::os::unix::VirtualOutput;

        let connection = MidiOutput::new(&self.client_name)?.create_virtual(name)?;
        debug!(port = name, "midir virtual output created");
        Ok(MidirOutputConnection(connection))
    }
}

pub struct MidirOutputConnection(MidiOutputConnection);

impl OutputConnection for MidirOutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.0.send(bytes)?;
        Ok(())
    }

    fn close(self) {
        let _ = self.0.close();
    }
}
