//! Output port session: raw byte sending.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DEFAULT_CLIENT_NAME;
use crate::error::{Error, Result};
use crate::transport::{port_infos, resolve_port, OutputConnection, OutputTransport, PortInfo};

#[cfg(feature = "midi-io")]
use crate::io::MidirOutput;

use super::OpenPort;

pub struct OutputSession<T: OutputTransport> {
    transport: T,
    client_name: String,
    connection: Option<T::Connection>,
    port: Option<OpenPort>,
}

#[cfg(feature = "midi-io")]
impl OutputSession<MidirOutput> {
    /// Session on the system MIDI driver.
    pub fn system(client_name: &str) -> Result<Self> {
        Ok(Self::with_client_name(MidirOutput::new(client_name)?, client_name))
    }
}

impl<T: OutputTransport> OutputSession<T> {
    pub fn new(transport: T) -> Self {
        Self::with_client_name(transport, DEFAULT_CLIENT_NAME)
    }

    pub fn with_client_name(transport: T, client_name: impl Into<String>) -> Self {
        Self {
            transport,
            client_name: client_name.into(),
            connection: None,
            port: None,
        }
    }

    pub fn list_ports(&self) -> Vec<String> {
        self.transport.port_names()
    }

    pub fn port_count(&self) -> usize {
        self.transport.port_count()
    }

    pub fn ports(&self) -> Vec<PortInfo> {
        port_infos(self.transport.port_names())
    }

    /// Connect to port `index`, replacing any current connection. An index
    /// that does not resolve leaves the current connection open.
    pub fn open(&mut self, index: usize) -> Result<()> {
        let names = self.transport.port_names();
        let name: Arc<str> = Arc::from(resolve_port(&names, index)?);
        self.close();

        let connection = self
            .transport
            .open_port(index, &self.client_name)
            .inspect_err(|e| warn!(port = %name, index, "failed to open MIDI output: {}", e))?;

        info!(port = %name, index, "opened MIDI output");
        self.connection = Some(connection);
        self.port = Some(OpenPort {
            index: Some(index),
            name,
        });
        Ok(())
    }

    pub fn open_virtual(&mut self, name: &str) -> Result<()> {
        if !self.transport.supports_virtual_ports() {
            return Err(Error::VirtualPortsUnsupported);
        }
        self.close();

        let connection = self
            .transport
            .open_virtual_port(name)
            .inspect_err(|e| warn!(port = name, "failed to open virtual MIDI output: {}", e))?;

        info!(port = name, "opened virtual MIDI output");
        self.connection = Some(connection);
        self.port = Some(OpenPort {
            index: None,
            name: Arc::from(name),
        });
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        if let Some(port) = self.port.take() {
            info!(port = %port.name, "closed MIDI output");
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        self.port.as_ref().is_some_and(|p| p.index.is_none())
    }

    pub fn port_index(&self) -> Option<usize> {
        self.port.as_ref().and_then(|p| p.index)
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port.as_ref().map(|p| &*p.name)
    }

    /// Send one complete message: a status byte and at most two data bytes,
    /// or a sysex buffer of any length.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let connection = self.connection.as_mut().ok_or(Error::NotOpen)?;
        validate(bytes)?;
        debug!(len = bytes.len(), "sending MIDI message");
        connection.send(bytes)
    }
}

impl<T: OutputTransport> Drop for OutputSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: OutputTransport> std::fmt::Debug for OutputSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSession")
            .field("client_name", &self.client_name)
            .field("port", &self.port)
            .finish()
    }
}

fn validate(bytes: &[u8]) -> Result<()> {
    let invalid = Error::InvalidMessage { len: bytes.len() };
    match bytes.first() {
        None => Err(invalid),
        Some(&status) if status & 0x80 == 0 => Err(invalid),
        Some(&0xF0) => Ok(()),
        Some(_) if bytes.len() > 3 => Err(invalid),
        Some(_) => Ok(()),
    }
}
