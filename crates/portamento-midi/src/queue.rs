//! Single-producer / single-consumer message queue between the transport
//! callback thread and the application thread.
//!
//! The producer never blocks indefinitely: depending on [`OverflowPolicy`] a
//! full queue grows, evicts its oldest entry, rejects the new entry, or waits
//! up to a bounded timeout before rejecting. Every lost entry is counted.
//! Retained entries always come out in push order.
//!
//! `DropNewest` runs on a lock-free SPSC ring buffer; the other policies use a
//! crossbeam channel, whose receiver the producer may also hold to evict the
//! oldest entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// What the producer does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Never full; memory grows with the backlog.
    Unbounded,
    /// Evict the oldest queued entry to make room.
    #[default]
    DropOldest,
    /// Reject the incoming entry. Lock-free.
    DropNewest,
    /// Wait up to `timeout` for room, then reject the incoming entry.
    Block { timeout: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued entries. Ignored by [`OverflowPolicy::Unbounded`].
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self { capacity, overflow }
    }
}

enum Tx<T> {
    Ring(HeapProd<T>),
    Unbounded(Sender<T>),
    DropOldest { tx: Sender<T>, evict: Receiver<T> },
    Block { tx: Sender<T>, timeout: Duration },
}

enum Rx<T> {
    Ring(HeapCons<T>),
    Channel(Receiver<T>),
}

/// Producer half. Owned by the transport callback.
pub struct MessageProducer<T> {
    tx: Tx<T>,
    dropped: Arc<AtomicU64>,
}

/// Consumer half. Owned by the application thread.
pub struct MessageConsumer<T> {
    rx: Rx<T>,
    dropped: Arc<AtomicU64>,
}

/// Create a connected producer/consumer pair.
pub fn message_channel<T: Send>(config: QueueConfig) -> (MessageProducer<T>, MessageConsumer<T>) {
    let capacity = config.capacity.max(1);
    let dropped = Arc::new(AtomicU64::new(0));

    let (tx, rx) = match config.overflow {
        OverflowPolicy::DropNewest => {
            let (producer, consumer) = HeapRb::<T>::new(capacity).split();
            (Tx::Ring(producer), Rx::Ring(consumer))
        }
        OverflowPolicy::Unbounded => {
            let (tx, rx) = crossbeam_channel::unbounded();
            (Tx::Unbounded(tx), Rx::Channel(rx))
        }
        OverflowPolicy::DropOldest => {
            let (tx, rx) = crossbeam_channel::bounded(capacity);
            let evict = rx.clone();
            (Tx::DropOldest { tx, evict }, Rx::Channel(rx))
        }
        OverflowPolicy::Block { timeout } => {
            let (tx, rx) = crossbeam_channel::bounded(capacity);
            (Tx::Block { tx, timeout }, Rx::Channel(rx))
        }
    };

    (
        MessageProducer {
            tx,
            dropped: Arc::clone(&dropped),
        },
        MessageConsumer { rx, dropped },
    )
}

impl<T> MessageProducer<T> {
    /// Queue `item`. Returns `false` if `item` itself was not queued.
    ///
    /// With `DropOldest` this returns `true` even when an older entry had to
    /// be evicted; the eviction is still counted in [`dropped`](Self::dropped).
    pub fn push(&mut self, item: T) -> bool {
        let dropped = &self.dropped;
        match &mut self.tx {
            Tx::Ring(producer) => match producer.try_push(item) {
                Ok(()) => true,
                Err(_) => reject(dropped, "ring full"),
            },
            Tx::Unbounded(tx) => match tx.send(item) {
                Ok(()) => true,
                Err(_) => reject(dropped, "consumer gone"),
            },
            Tx::DropOldest { tx, evict } => {
                let mut item = item;
                loop {
                    match tx.try_send(item) {
                        Ok(()) => return true,
                        Err(TrySendError::Full(returned)) => {
                            item = returned;
                            // The consumer may empty the slot first; then just retry.
                            if evict.try_recv().is_ok() {
                                dropped.fetch_add(1, Ordering::Relaxed);
                                trace!("queue full, evicted oldest entry");
                            }
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            return reject(dropped, "consumer gone");
                        }
                    }
                }
            }
            Tx::Block { tx, timeout } => match tx.send_timeout(item, *timeout) {
                Ok(()) => true,
                Err(SendTimeoutError::Timeout(_)) => reject(dropped, "timed out waiting for room"),
                Err(SendTimeoutError::Disconnected(_)) => reject(dropped, "consumer gone"),
            },
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn reject(dropped: &AtomicU64, reason: &'static str) -> bool {
    dropped.fetch_add(1, Ordering::Relaxed);
    trace!(reason, "queue rejected entry");
    false
}

impl<T> MessageConsumer<T> {
    /// Pop the oldest entry without blocking.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        match &mut self.rx {
            Rx::Ring(consumer) => consumer.try_pop(),
            Rx::Channel(rx) => rx.try_recv().ok(),
        }
    }

    /// Iterate over the entries queued at the time of the call.
    ///
    /// Entries pushed while draining are left for the next call, so the
    /// iterator always terminates.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let remaining = self.len();
        Drain {
            consumer: self,
            remaining,
        }
    }

    pub fn len(&self) -> usize {
        match &self.rx {
            Rx::Ring(consumer) => consumer.occupied_len(),
            Rx::Channel(rx) => rx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries lost to overflow since the queue was created.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Draining iterator returned by [`MessageConsumer::drain`].
pub struct Drain<'a, T> {
    consumer: &'a mut MessageConsumer<T>,
    remaining: usize,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.consumer.try_pop();
        if item.is_none() {
            // Evicted by a DropOldest producer in the meantime.
            self.remaining = 0;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<T> std::fmt::Debug for MessageProducer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageProducer")
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl<T> std::fmt::Debug for MessageConsumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageConsumer")
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const ALL_POLICIES: [OverflowPolicy; 4] = [
        OverflowPolicy::Unbounded,
        OverflowPolicy::DropOldest,
        OverflowPolicy::DropNewest,
        OverflowPolicy::Block {
            timeout: Duration::from_millis(50),
        },
    ];

    #[test]
    fn test_push_and_drain_in_order() {
        for policy in ALL_POLICIES {
            let (mut tx, mut rx) = message_channel(QueueConfig::new(16, policy));
            assert!(tx.push(1));
            assert!(tx.push(2));
            assert!(tx.push(3));
            assert_eq!(rx.len(), 3);
            assert_eq!(rx.drain().collect::<Vec<_>>(), vec![1, 2, 3], "{policy:?}");
            assert!(rx.is_empty());
            assert_eq!(rx.try_pop(), None);
        }
    }

    #[test]
    fn test_drop_newest_rejects_when_full() {
        let (mut tx, mut rx) = message_channel(QueueConfig::new(4, OverflowPolicy::DropNewest));
        for i in 0..4 {
            assert!(tx.push(i), "Failed to push {}", i);
        }
        assert!(!tx.push(4), "Queue should be full");
        assert_eq!(rx.dropped(), 1);
        assert_eq!(rx.drain().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_drop_oldest_evicts() {
        let (mut tx, mut rx) = message_channel(QueueConfig::new(3, OverflowPolicy::DropOldest));
        for i in 0..5 {
            assert!(tx.push(i));
        }
        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.drain().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_block_times_out_then_drops() {
        let timeout = Duration::from_millis(10);
        let (mut tx, mut rx) =
            message_channel(QueueConfig::new(1, OverflowPolicy::Block { timeout }));
        assert!(tx.push('a'));
        assert!(!tx.push('b'));
        assert_eq!(rx.dropped(), 1);
        assert_eq!(rx.try_pop(), Some('a'));
    }

    #[test]
    fn test_unbounded_never_drops() {
        let (mut tx, mut rx) = message_channel(QueueConfig::new(1, OverflowPolicy::Unbounded));
        for i in 0..10_000 {
            assert!(tx.push(i));
        }
        assert_eq!(rx.drain().count(), 10_000);
        assert_eq!(rx.dropped(), 0);
    }

    #[test]
    fn test_drain_is_bounded_by_snapshot() {
        let (mut tx, mut rx) = message_channel(QueueConfig::new(8, OverflowPolicy::Unbounded));
        tx.push(1);
        tx.push(2);
        let mut drain = rx.drain();
        assert_eq!(drain.next(), Some(1));
        // Pushed mid-drain: left for the next drain.
        tx.push(3);
        assert_eq!(drain.next(), Some(2));
        assert_eq!(drain.next(), None);
        assert_eq!(rx.try_pop(), Some(3));
    }

    #[test]
    fn test_push_after_consumer_dropped() {
        let (mut tx, rx) = message_channel::<u8>(QueueConfig::new(4, OverflowPolicy::Unbounded));
        drop(rx);
        assert!(!tx.push(1));
        assert_eq!(tx.dropped(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (mut tx, mut rx) = message_channel(QueueConfig::new(0, OverflowPolicy::DropNewest));
        assert!(tx.push(7));
        assert_eq!(rx.try_pop(), Some(7));
    }

    #[test]
    fn test_cross_thread_order_preserved() {
        const COUNT: u32 = 20_000;

        for policy in ALL_POLICIES {
            let (mut tx, mut rx) = message_channel(QueueConfig::new(64, policy));
            let producer = thread::spawn(move || {
                for i in 0..COUNT {
                    tx.push(i);
                }
                tx
            });

            let mut received = Vec::new();
            loop {
                received.extend(rx.drain());
                if producer.is_finished() {
                    let tx = producer.join().unwrap();
                    received.extend(rx.drain());
                    assert_eq!(received.len() as u64 + tx.dropped(), COUNT as u64);
                    break;
                }
                thread::yield_now();
            }

            assert!(
                received.windows(2).all(|w| w[0] < w[1]),
                "{policy:?} reordered entries"
            );
        }
    }
}
