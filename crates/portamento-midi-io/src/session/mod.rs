//! Input and output port sessions.
//!
//! An [`InputSession`] owns one transport connection at a time together with
//! the decoder, state buffers, message queue and listeners for it. The
//! transport callback decodes, runs direct listeners and queues the message;
//! the application thread drains the queue with [`InputSession::poll`].

mod builder;
mod inlet;
mod output;

pub use builder::InputSessionBuilder;
pub use output::OutputSession;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use portamento_midi::{
    message_channel, ChannelStateBuffers, Message, MessageConsumer, MessageDecoder,
    MessageProducer,
};
use tracing::{info, warn};

use crate::config::{IgnoreTypes, SessionConfig};
use crate::dispatch::{DeliveryMode, DispatchRouter, ListenerId};
use crate::error::{Error, Result};
use crate::stats::{SessionStats, StatsCounters};
use crate::transport::{
    port_infos, resolve_port, InputConnection, InputTransport, PortInfo, RawCallback,
};
use inlet::{Envelope, Inlet};

/// The port a session is connected to.
#[derive(Debug, Clone)]
pub(crate) struct OpenPort {
    /// `None` for virtual ports.
    pub(crate) index: Option<usize>,
    pub(crate) name: Arc<str>,
}

pub struct InputSession<T: InputTransport> {
    transport: T,
    config: SessionConfig,
    ignore: Arc<ArcSwap<IgnoreTypes>>,
    connection: Option<T::Connection>,
    port: Option<OpenPort>,
    armed: Arc<AtomicBool>,
    state: Arc<ChannelStateBuffers>,
    stats: Arc<StatsCounters>,
    producer: Arc<Mutex<MessageProducer<Envelope>>>,
    consumer: MessageConsumer<Envelope>,
    router: DispatchRouter,
}

impl<T: InputTransport> InputSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let (producer, consumer) = message_channel(config.queue);
        Self {
            transport,
            ignore: Arc::new(ArcSwap::from_pointee(config.ignore)),
            config,
            connection: None,
            port: None,
            armed: Arc::new(AtomicBool::new(false)),
            state: Arc::new(ChannelStateBuffers::new()),
            stats: Arc::new(StatsCounters::default()),
            producer: Arc::new(Mutex::new(producer)),
            consumer,
            router: DispatchRouter::new(),
        }
    }

    // Port enumeration

    /// Port names in index order.
    pub fn list_ports(&self) -> Vec<String> {
        self.transport.port_names()
    }

    pub fn port_count(&self) -> usize {
        self.transport.port_count()
    }

    pub fn port_name_at(&self, index: usize) -> Option<String> {
        self.transport.port_names().into_iter().nth(index)
    }

    pub fn ports(&self) -> Vec<PortInfo> {
        port_infos(self.transport.port_names())
    }

    // Lifecycle

    /// Connect to port `index`, replacing any current connection. An index
    /// that does not resolve leaves the current connection open.
    pub fn open(&mut self, index: usize) -> Result<()> {
        let names = self.transport.port_names();
        let name: Arc<str> = Arc::from(resolve_port(&names, index)?);
        self.close();

        let callback = self.arm(Some(index), Arc::clone(&name));

        match self
            .transport
            .open_port(index, &self.config.client_name, callback)
        {
            Ok(connection) => {
                info!(port = %name, index, "opened MIDI input");
                self.connection = Some(connection);
                self.port = Some(OpenPort {
                    index: Some(index),
                    name,
                });
                Ok(())
            }
            Err(e) => {
                self.armed.store(false, Ordering::Release);
                warn!(port = %name, index, "failed to open MIDI input: {}", e);
                Err(e)
            }
        }
    }

    /// Create a virtual input other applications can send to.
    pub fn open_virtual(&mut self, name: &str) -> Result<()> {
        if !self.transport.supports_virtual_ports() {
            return Err(Error::VirtualPortsUnsupported);
        }
        self.close();

        let port_name: Arc<str> = Arc::from(name);
        let callback = self.arm(None, Arc::clone(&port_name));

        match self.transport.open_virtual_port(name, callback) {
            Ok(connection) => {
                info!(port = %port_name, "opened virtual MIDI input");
                self.connection = Some(connection);
                self.port = Some(OpenPort {
                    index: None,
                    name: port_name,
                });
                Ok(())
            }
            Err(e) => {
                self.armed.store(false, Ordering::Release);
                warn!(port = %port_name, "failed to open virtual MIDI input: {}", e);
                Err(e)
            }
        }
    }

    /// Disconnect. Messages already queued stay available to `poll`.
    pub fn close(&mut self) {
        self.armed.store(false, Ordering::Release);
        if let Some(mut connection) = self.connection.take() {
            connection.cancel_callback();
            connection.close();
        }
        if let Some(port) = self.port.take() {
            info!(port = %port.name, "closed MIDI input");
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        self.port.as_ref().is_some_and(|p| p.index.is_none())
    }

    /// Index of the open port; `None` when closed or virtual.
    pub fn port_index(&self) -> Option<usize> {
        self.port.as_ref().and_then(|p| p.index)
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port.as_ref().map(|p| &*p.name)
    }

    // Listeners

    pub fn add_listener<F>(&mut self, mode: DeliveryMode, listener: F) -> ListenerId
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.router.add(mode, listener)
    }

    pub fn add_raw_listener<F>(&mut self, mode: DeliveryMode, listener: F) -> ListenerId
    where
        F: Fn(&Message, &[u8]) + Send + Sync + 'static,
    {
        self.router.add_raw(mode, listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.router.remove(id)
    }

    // Consumer side

    /// Drain queued messages, running deferred listeners on each.
    /// Returns the number of messages processed.
    pub fn poll(&mut self) -> usize {
        let mut count = 0;
        for envelope in self.consumer.drain() {
            self.router.dispatch_deferred(&envelope.message, &envelope.raw);
            count += 1;
        }
        count
    }

    /// Pop one queued message without running listeners.
    pub fn try_pop(&mut self) -> Option<Message> {
        self.consumer.try_pop().map(|envelope| envelope.message)
    }

    /// Take every queued message without running listeners.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.consumer.drain().map(|envelope| envelope.message)
    }

    pub fn pending(&self) -> usize {
        self.consumer.len()
    }

    // State

    pub fn state(&self) -> &Arc<ChannelStateBuffers> {
        &self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot(self.consumer.dropped())
    }

    /// Set the message types dropped after decoding. Applies immediately,
    /// including to an open connection.
    pub fn ignore_types(&mut self, sysex: bool, timing: bool, active_sensing: bool) {
        let ignore = IgnoreTypes::new(sysex, timing, active_sensing);
        self.config.ignore = ignore;
        self.ignore.store(Arc::new(ignore));
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the callback for a new connection. A fresh gate per connection
    /// keeps a stale callback from ever being re-armed.
    fn arm(&mut self, port: Option<usize>, name: Arc<str>) -> RawCallback {
        self.armed = Arc::new(AtomicBool::new(true));
        let inlet = Inlet {
            decoder: MessageDecoder::new(port, name, Arc::clone(&self.state)),
            armed: Arc::clone(&self.armed),
            ignore: Arc::clone(&self.ignore),
            producer: Arc::clone(&self.producer),
            direct: self.router.direct_listeners(),
            stats: Arc::clone(&self.stats),
        };
        Box::new(move |timestamp, bytes| inlet.handle(timestamp, bytes))
    }
}

impl<T: InputTransport> Drop for InputSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: InputTransport> std::fmt::Debug for InputSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSession")
            .field("port", &self.port)
            .field("pending", &self.consumer.len())
            .field("router", &self.router)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::LoopbackTransport;
    use portamento_midi::StatusCode;

    fn session(ports: &[&str]) -> (InputSession<LoopbackTransport>, LoopbackTransport) {
        let transport = LoopbackTransport::new(ports.iter().copied());
        let session = InputSession::new(transport.clone(), SessionConfig::default());
        (session, transport)
    }

    #[test]
    fn test_open_records_port() {
        let (mut session, transport) = session(&["Keyboard", "Pad"]);
        assert_eq!(session.list_ports(), vec!["Keyboard", "Pad"]);

        session.open(1).unwrap();
        assert!(session.is_open());
        assert!(!session.is_virtual());
        assert_eq!(session.port_index(), Some(1));
        assert_eq!(session.port_name(), Some("Pad"));
        assert_eq!(transport.callback_count(), 1);
    }

    #[test]
    fn test_open_without_ports() {
        let (mut session, transport) = session(&[]);
        assert!(matches!(session.open(0), Err(Error::NoPortsAvailable)));
        assert!(!session.is_open());
        assert_eq!(transport.callback_count(), 0);
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_reopen_replaces_connection() {
        let (mut session, transport) = session(&["Keyboard", "Pad"]);
        session.open(0).unwrap();
        session.open(1).unwrap();
        assert_eq!(transport.callback_count(), 1);
        assert_eq!(transport.inject(0, 0.0, &[0xF8]), 0);
        assert_eq!(transport.inject(1, 0.0, &[0xF8]), 1);
    }

    #[test]
    fn test_failed_reopen_keeps_connection() {
        let (mut session, transport) = session(&["Keyboard"]);
        session.open(0).unwrap();

        assert!(matches!(
            session.open(5),
            Err(Error::PortIndexOutOfRange { index: 5, count: 1 })
        ));
        assert!(session.is_open());
        assert_eq!(session.port_index(), Some(0));
        assert_eq!(transport.callback_count(), 1);
        assert_eq!(transport.inject(0, 0.0, &[0x90, 60, 100]), 1);
        assert_eq!(session.try_pop().unwrap().pitch(), 60);
    }

    #[test]
    fn test_unsupported_virtual_keeps_connection() {
        let transport = LoopbackTransport::new(["Keyboard"]).with_virtual_ports(false);
        let mut session = InputSession::new(transport.clone(), SessionConfig::default());
        session.open(0).unwrap();

        assert!(matches!(
            session.open_virtual("Portamento In"),
            Err(Error::VirtualPortsUnsupported)
        ));
        assert_eq!(session.port_name(), Some("Keyboard"));
        assert_eq!(transport.inject(0, 0.0, &[0xF8]), 1);
    }

    #[test]
    fn test_close_is_idempotent_and_keeps_queue() {
        let (mut session, transport) = session(&["Keyboard"]);
        session.open(0).unwrap();
        transport.inject(0, 0.0, &[0x90, 60, 100]);

        session.close();
        session.close();
        assert_eq!(transport.callback_count(), 0);
        assert_eq!(transport.inject(0, 0.0, &[0x90, 61, 100]), 0);

        let msg = session.try_pop().unwrap();
        assert_eq!(msg.pitch(), 60);
        assert!(session.try_pop().is_none());
    }

    #[test]
    fn test_ignore_types_applied_after_decode() {
        let (mut session, transport) = session(&["Clock"]);
        session.ignore_types(false, true, true);
        session.open(0).unwrap();

        transport.inject(0, 0.0, &[0xF8]);
        transport.inject(0, 0.0, &[0xFE]);
        transport.inject(0, 0.0, &[0xFA]);

        let statuses: Vec<StatusCode> = session.drain().map(|m| m.status()).collect();
        assert_eq!(statuses, vec![StatusCode::Start]);
        assert_eq!(session.stats().filtered, 2);
        assert_eq!(session.stats().decoded, 1);
    }

    #[test]
    fn test_ignore_types_change_while_open() {
        let (mut session, transport) = session(&["Clock"]);
        session.open(0).unwrap();
        transport.inject(0, 0.0, &[0xF8]);
        session.ignore_types(false, true, false);
        transport.inject(0, 0.0, &[0xF8]);

        assert_eq!(session.drain().count(), 1);
        assert_eq!(session.stats().filtered, 1);
    }

    #[test]
    fn test_truncated_buffers_counted() {
        let (mut session, transport) = session(&["Keyboard"]);
        session.open(0).unwrap();
        transport.inject(0, 0.0, &[0x90]);
        transport.inject(0, 0.0, &[]);
        assert_eq!(session.stats().truncated, 2);
        assert_eq!(session.pending(), 0);
        assert_eq!(session.state().notes(), [0; 128]);
    }

    #[test]
    fn test_drop_releases_callback() {
        let (mut session, transport) = session(&["Keyboard"]);
        session.open(0).unwrap();
        drop(session);
        assert_eq!(transport.callback_count(), 0);
    }
}
