//! Transport capability surface.
//!
//! A transport enumerates ports, opens connections and delivers raw
//! `(timestamp, bytes)` pairs to a registered callback on its own thread.
//! Sessions are generic over these traits so the midir backend and the
//! in-process [`LoopbackTransport`](crate::LoopbackTransport) are
//! interchangeable.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw input callback: seconds since the previous message on the port, and
/// the message bytes. Invoked on the transport's thread.
pub type RawCallback = Box<dyn FnMut(f64, &[u8]) + Send + 'static>;

/// A port as currently enumerated by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Current index. Not stable across hotplug.
    pub index: usize,
    pub name: String,
}

pub(crate) fn port_infos(names: Vec<String>) -> Vec<PortInfo> {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| PortInfo { index, name })
        .collect()
}

pub trait InputTransport {
    type Connection: InputConnection;

    /// Port names in index order.
    fn port_names(&self) -> Vec<String>;

    fn port_count(&self) -> usize {
        self.port_names().len()
    }

    /// Connect to port `index` and start delivering to `callback`.
    fn open_port(
        &mut self,
        index: usize,
        client_port_name: &str,
        callback: RawCallback,
    ) -> Result<Self::Connection>;

    /// Whether [`open_virtual_port`](Self::open_virtual_port) can succeed.
    fn supports_virtual_ports(&self) -> bool {
        false
    }

    /// Create a software endpoint other clients can connect to.
    fn open_virtual_port(&mut self, name: &str, callback: RawCallback) -> Result<Self::Connection> {
        let _ = (name, callback);
        Err(Error::VirtualPortsUnsupported)
    }
}

pub trait InputConnection {
    /// Stop invoking the callback. No invocation starts after this returns.
    fn cancel_callback(&mut self);

    /// Release the native connection.
    fn close(self);
}

pub trait OutputTransport {
    type Connection: OutputConnection;

    fn port_names(&self) -> Vec<String>;

    fn port_count(&self) -> usize {
        self.port_names().len()
    }

    fn open_port(&mut self, index: usize, client_port_name: &str) -> Result<Self::Connection>;

    fn supports_virtual_ports(&self) -> bool {
        false
    }

    fn open_virtual_port(&mut self, name: &str) -> Result<Self::Connection> {
        let _ = name;
        Err(Error::VirtualPortsUnsupported)
    }
}

pub trait OutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    fn close(self);
}

/// Check `index` against the current port list and return the port's name.
pub(crate) fn resolve_port(names: &[String], index: usize) -> Result<&str> {
    if names.is_empty() {
        return Err(Error::NoPortsAvailable);
    }
    names
        .get(index)
        .map(String::as_str)
        .ok_or(Error::PortIndexOutOfRange {
            index,
            count: names.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_port() {
        let names = vec!["Keyboard".to_string(), "Pad".to_string()];
        assert_eq!(resolve_port(&names, 1).unwrap(), "Pad");
        assert!(matches!(
            resolve_port(&names, 2),
            Err(Error::PortIndexOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(resolve_port(&[], 0), Err(Error::NoPortsAvailable)));
    }

    #[test]
    fn test_port_infos_keep_order() {
        let infos = port_infos(vec!["A".into(), "B".into()]);
        assert_eq!(
            infos,
            vec![
                PortInfo {
                    index: 0,
                    name: "A".into()
                },
                PortInfo {
                    index: 1,
                    name: "B".into()
                },
            ]
        );
    }
}
