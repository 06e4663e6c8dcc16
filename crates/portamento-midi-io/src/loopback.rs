//! In-process transport.
//!
//! Implements both transport traits without touching any driver. Bytes reach
//! input callbacks through [`LoopbackTransport::inject`] or by sending on an
//! output connection to the same port, and run on the calling thread. Clones
//! share the same ports and connections, so a test can keep one handle while
//! a session owns another.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::transport::{
    resolve_port, InputConnection, InputTransport, OutputConnection, OutputTransport, RawCallback,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Port(usize),
    Virtual(String),
}

type SharedCallback = Arc<Mutex<Option<RawCallback>>>;

struct Slot {
    id: u64,
    endpoint: Endpoint,
    callback: SharedCallback,
}

/// Bytes written to a loopback output connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Port index, `None` for a virtual port.
    pub port: Option<usize>,
    pub port_name: String,
    pub bytes: Vec<u8>,
}

struct Shared {
    ports: Mutex<Vec<String>>,
    virtual_ports: AtomicBool,
    inputs: Mutex<Vec<Slot>>,
    sent: Mutex<Vec<SentMessage>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct LoopbackTransport {
    shared: Arc<Shared>,
}

impl LoopbackTransport {
    /// A transport exposing `ports` for both input and output.
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shared: Arc::new(Shared {
                ports: Mutex::new(ports.into_iter().map(Into::into).collect()),
                virtual_ports: AtomicBool::new(true),
                inputs: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Enable or disable virtual port support (enabled by default).
    pub fn with_virtual_ports(self, enabled: bool) -> Self {
        self.shared.virtual_ports.store(enabled, Ordering::Relaxed);
        self
    }

    /// Replace the port list, as a device being plugged in or removed would.
    /// Open connections keep their original index.
    pub fn set_ports<I, S>(&self, ports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.shared.ports.lock() = ports.into_iter().map(Into::into).collect();
    }

    /// Deliver `bytes` to every live callback on port `index`.
    /// Returns the number of callbacks invoked.
    pub fn inject(&self, index: usize, timestamp: f64, bytes: &[u8]) -> usize {
        self.shared.deliver(&Endpoint::Port(index), timestamp, bytes)
    }

    /// Deliver `bytes` to every live callback on the virtual port `name`.
    pub fn inject_virtual(&self, name: &str, timestamp: f64, bytes: &[u8]) -> usize {
        self.shared
            .deliver(&Endpoint::Virtual(name.to_string()), timestamp, bytes)
    }

    /// Number of registered, non-cancelled input callbacks.
    pub fn callback_count(&self) -> usize {
        self.shared
            .inputs
            .lock()
            .iter()
            .filter(|slot| slot.callback.lock().is_some())
            .count()
    }

    /// Everything sent through output connections, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.shared.sent.lock().clone()
    }

    fn register(&self, endpoint: Endpoint, callback: RawCallback) -> LoopbackInputConnection {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let callback = Arc::new(Mutex::new(Some(callback)));
        self.shared.inputs.lock().push(Slot {
            id,
            endpoint,
            callback: Arc::clone(&callback),
        });
        LoopbackInputConnection {
            id,
            callback,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("ports", &*self.shared.ports.lock())
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl Shared {
    fn deliver(&self, endpoint: &Endpoint, timestamp: f64, bytes: &[u8]) -> usize {
        // Collect first so the slot list is not locked while callbacks run.
        let targets: Vec<SharedCallback> = self
            .inputs
            .lock()
            .iter()
            .filter(|slot| slot.endpoint == *endpoint)
            .map(|slot| Arc::clone(&slot.callback))
            .collect();

        let mut fired = 0;
        for target in targets {
            if let Some(callback) = target.lock().as_mut() {
                callback(timestamp, bytes);
                fired += 1;
            }
        }
        trace!(?endpoint, fired, "loopback delivered");
        fired
    }

    fn port_name(&self, index: usize) -> Result<String> {
        let ports = self.ports.lock();
        resolve_port(&ports, index).map(str::to_string)
    }
}

impl InputTransport for LoopbackTransport {
    type Connection = LoopbackInputConnection;

    fn port_names(&self) -> Vec<String> {
        self.shared.ports.lock().clone()
    }

    fn open_port(
        &mut self,
        index: usize,
        _client_port_name: &str,
        callback: RawCallback,
    ) -> Result<Self::Connection> {
        self.shared.port_name(index)?;
        Ok(self.register(Endpoint::Port(index), callback))
    }

    fn supports_virtual_ports(&self) -> bool {
        self.shared.virtual_ports.load(Ordering::Relaxed)
    }

    fn open_virtual_port(&mut self, name: &str, callback: RawCallback) -> Result<Self::Connection> {
        if !InputTransport::supports_virtual_ports(self) {
            return Err(Error::VirtualPortsUnsupported);
        }
        Ok(self.register(Endpoint::Virtual(name.to_string()), callback))
    }
}

pub struct LoopbackInputConnection {
    id: u64,
    callback: SharedCallback,
    shared: Arc<Shared>,
}

impl InputConnection for LoopbackInputConnection {
    fn cancel_callback(&mut self) {
        // Blocks until an in-flight invocation returns.
        self.callback.lock().take();
    }

    fn close(mut self) {
        self.cancel_callback();
        self.shared.inputs.lock().retain(|slot| slot.id != self.id);
    }
}

impl OutputTransport for LoopbackTransport {
    type Connection = LoopbackOutputConnection;

    fn port_names(&self) -> Vec<String> {
        self.shared.ports.lock().clone()
    }

    fn open_port(&mut self, index: usize, _client_port_name: &str) -> Result<Self::Connection> {
        let port_name = self.shared.port_name(index)?;
        Ok(LoopbackOutputConnection {
            endpoint: Endpoint::Port(index),
            port_name,
            shared: Arc::clone(&self.shared),
        })
    }

    fn supports_virtual_ports(&self) -> bool {
        self.shared.virtual_ports.load(Ordering::Relaxed)
    }

    fn open_virtual_port(&mut self, name: &str) -> Result<Self::Connection> {
        if !OutputTransport::supports_virtual_ports(self) {
            return Err(Error::VirtualPortsUnsupported);
        }
        Ok(LoopbackOutputConnection {
            endpoint: Endpoint::Virtual(name.to_string()),
            port_name: name.to_string(),
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Output connection that records every message and feeds it back to
/// input callbacks on the same port.
pub struct LoopbackOutputConnection {
    endpoint: Endpoint,
    port_name: String,
    shared: Arc<Shared>,
}

impl OutputConnection for LoopbackOutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let port = match self.endpoint {
            Endpoint::Port(index) => Some(index),
            Endpoint::Virtual(_) => None,
        };
        self.shared.sent.lock().push(SentMessage {
            port,
            port_name: self.port_name.clone(),
            bytes: bytes.to_vec(),
        });
        self.shared.deliver(&self.endpoint, 0.0, bytes);
        Ok(())
    }

    fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn recorder() -> (RawCallback, Arc<Mutex<Vec<(f64, Vec<u8>)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let callback: RawCallback = Box::new(move |ts, bytes| {
            sink.lock().push((ts, bytes.to_vec()));
        });
        (callback, log)
    }

    #[test]
    fn test_inject_reaches_only_matching_port() {
        let mut transport = LoopbackTransport::new(["Keyboard", "Pad"]);
        let (callback, log) = recorder();
        let _conn = InputTransport::open_port(&mut transport, 1, "test", callback).unwrap();

        assert_eq!(transport.inject(0, 0.0, &[0x90, 60, 100]), 0);
        assert_eq!(transport.inject(1, 0.5, &[0x90, 61, 100]), 1);
        assert_eq!(*log.lock(), vec![(0.5, vec![0x90, 61, 100])]);
    }

    #[test]
    fn test_open_out_of_range() {
        let mut transport = LoopbackTransport::new(["Keyboard"]);
        let (callback, _) = recorder();
        assert!(matches!(
            InputTransport::open_port(&mut transport, 3, "test", callback),
            Err(Error::PortIndexOutOfRange { index: 3, count: 1 })
        ));
        assert_eq!(transport.callback_count(), 0);
    }

    #[test]
    fn test_cancel_stops_delivery() {
        let mut transport = LoopbackTransport::new(["Keyboard"]);
        let (callback, log) = recorder();
        let mut conn = InputTransport::open_port(&mut transport, 0, "test", callback).unwrap();
        assert_eq!(transport.callback_count(), 1);

        conn.cancel_callback();
        assert_eq!(transport.callback_count(), 0);
        assert_eq!(transport.inject(0, 0.0, &[0xF8]), 0);
        assert!(log.lock().is_empty());

        conn.close();
        assert_eq!(transport.shared.inputs.lock().len(), 0);
    }

    #[test]
    fn test_cancel_waits_for_in_flight_callback() {
        let mut transport = LoopbackTransport::new(["Keyboard"]);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let callback: RawCallback = Box::new(move |_, _| {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });
        let mut conn = InputTransport::open_port(&mut transport, 0, "test", callback).unwrap();

        let injector = transport.clone();
        let handle = thread::spawn(move || injector.inject(0, 0.0, &[0xF8]));
        thread::sleep(Duration::from_millis(10));

        conn.cancel_callback();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn test_virtual_ports_toggle() {
        let mut transport = LoopbackTransport::default().with_virtual_ports(false);
        let (callback, _) = recorder();
        assert!(!InputTransport::supports_virtual_ports(&transport));
        assert!(!OutputTransport::supports_virtual_ports(&transport));
        assert!(matches!(
            InputTransport::open_virtual_port(&mut transport, "Virtual", callback),
            Err(Error::VirtualPortsUnsupported)
        ));
        assert!(matches!(
            OutputTransport::open_virtual_port(&mut transport, "Virtual"),
            Err(Error::VirtualPortsUnsupported)
        ));
    }

    #[test]
    fn test_output_loops_back_to_input() {
        let mut transport = LoopbackTransport::new(["Bus"]);
        let (callback, log) = recorder();
        let _input = InputTransport::open_port(&mut transport, 0, "in", callback).unwrap();
        let mut output = OutputTransport::open_port(&mut transport, 0, "out").unwrap();

        output.send(&[0xB0, 7, 100]).unwrap();

        assert_eq!(*log.lock(), vec![(0.0, vec![0xB0, 7, 100])]);
        assert_eq!(
            transport.sent(),
            vec![SentMessage {
                port: Some(0),
                port_name: "Bus".into(),
                bytes: vec![0xB0, 7, 100],
            }]
        );
    }

    #[test]
    fn test_hotplug_changes_port_list() {
        let transport = LoopbackTransport::new(["Keyboard"]);
        transport.set_ports(["Keyboard", "Pad"]);
        assert_eq!(InputTransport::port_count(&transport), 2);
        transport.set_ports(Vec::<String>::new());
        assert_eq!(OutputTransport::port_names(&transport), Vec::<String>::new());
    }
}
