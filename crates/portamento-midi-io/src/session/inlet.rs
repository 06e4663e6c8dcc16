//! Callback-thread half of an input session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use portamento_midi::{Message, MessageDecoder, MessageProducer};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::IgnoreTypes;
use crate::dispatch::DirectListeners;
use crate::stats::StatsCounters;

/// A decoded message queued together with its raw bytes.
pub(crate) struct Envelope {
    pub(crate) message: Message,
    pub(crate) raw: SmallVec<[u8; 4]>,
}

/// Everything the transport callback touches. Owned by the callback, so
/// nothing it uses is freed while the transport still holds it.
pub(crate) struct Inlet {
    pub(crate) decoder: MessageDecoder,
    pub(crate) armed: Arc<AtomicBool>,
    pub(crate) ignore: Arc<ArcSwap<IgnoreTypes>>,
    pub(crate) producer: Arc<Mutex<MessageProducer<Envelope>>>,
    pub(crate) direct: DirectListeners,
    pub(crate) stats: Arc<StatsCounters>,
}

impl Inlet {
    pub(crate) fn handle(&self, timestamp: f64, bytes: &[u8]) {
        if !self.armed.load(Ordering::Acquire) {
            return;
        }

        let message = match self.decoder.decode(timestamp, bytes) {
            Ok(message) => message,
            Err(e) => {
                self.stats.record_truncated();
                debug!(port = self.decoder.source_name(), "dropping MIDI buffer: {}", e);
                return;
            }
        };

        if self.ignore.load().ignores(message.status()) {
            self.stats.record_filtered();
            trace!(status = ?message.status(), "ignored MIDI message");
            return;
        }

        self.stats.record_decoded();
        self.direct.dispatch(&message, bytes);

        let envelope = Envelope {
            message,
            raw: SmallVec::from_slice(bytes),
        };
        if !self.producer.lock().push(envelope) {
            debug!(port = self.decoder.source_name(), "MIDI input queue full, dropping message");
        }
    }
}
