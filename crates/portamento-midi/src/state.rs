//! Last-seen note velocities and controller values.
//!
//! Written by the decoder on the transport callback thread and read from any
//! other thread. Every slot is a single atomic byte, so a reader sees either
//! the previous or the new value, never a partial write. Reads are not
//! synchronized with decoding as a whole: a snapshot may mix values from
//! before and after a concurrent message.

use std::sync::atomic::{AtomicU8, Ordering};

/// Number of slots in each buffer (one per note / controller number).
pub const STATE_SLOTS: usize = 128;

pub struct ChannelStateBuffers {
    notes: [AtomicU8; STATE_SLOTS],
    controls: [AtomicU8; STATE_SLOTS],
}

impl ChannelStateBuffers {
    pub fn new() -> Self {
        Self {
            notes: std::array::from_fn(|_| AtomicU8::new(0)),
            controls: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }

    /// Last velocity seen for `pitch` (0 = off or never played).
    #[inline]
    pub fn note(&self, pitch: u8) -> u8 {
        self.notes[(pitch & 0x7F) as usize].load(Ordering::Relaxed)
    }

    /// Last value seen for controller `control` (0 = unset).
    #[inline]
    pub fn control(&self, control: u8) -> u8 {
        self.controls[(control & 0x7F) as usize].load(Ordering::Relaxed)
    }

    pub fn notes(&self) -> [u8; STATE_SLOTS] {
        std::array::from_fn(|i| self.notes[i].load(Ordering::Relaxed))
    }

    pub fn controls(&self) -> [u8; STATE_SLOTS] {
        std::array::from_fn(|i| self.controls[i].load(Ordering::Relaxed))
    }

    /// Pitches with a non-zero velocity.
    pub fn held_notes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.notes.iter().enumerate().filter_map(|(pitch, slot)| {
            let velocity = slot.load(Ordering::Relaxed);
            (velocity > 0).then_some((pitch as u8, velocity))
        })
    }

    pub fn reset(&self) {
        for slot in self.notes.iter().chain(self.controls.iter()) {
            slot.store(0, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn set_note(&self, pitch: u8, velocity: u8) {
        self.notes[pitch as usize].store(velocity, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_control(&self, control: u8, value: u8) {
        self.controls[control as usize].store(value, Ordering::Relaxed);
    }
}

impl Default for ChannelStateBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelStateBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelStateBuffers")
            .field("held_notes", &self.held_notes().count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_zeroed() {
        let state = ChannelStateBuffers::new();
        assert!(state.notes().iter().all(|&v| v == 0));
        assert!(state.controls().iter().all(|&v| v == 0));
        assert_eq!(state.held_notes().count(), 0);
    }

    #[test]
    fn test_set_and_reset() {
        let state = ChannelStateBuffers::new();
        state.set_note(60, 100);
        state.set_control(7, 127);
        assert_eq!(state.note(60), 100);
        assert_eq!(state.control(7), 127);
        assert_eq!(state.held_notes().collect::<Vec<_>>(), vec![(60, 100)]);

        state.reset();
        assert_eq!(state.note(60), 0);
        assert_eq!(state.control(7), 0);
    }

    #[test]
    fn test_concurrent_reader_never_sees_foreign_value() {
        let state = Arc::new(ChannelStateBuffers::new());
        let writer_state = Arc::clone(&state);

        let writer = thread::spawn(move || {
            for i in 0..10_000u32 {
                let value = if i % 2 == 0 { 42 } else { 99 };
                writer_state.set_control(1, value);
            }
        });

        for _ in 0..10_000 {
            let value = state.control(1);
            assert!(value == 0 || value == 42 || value == 99);
        }
        writer.join().unwrap();
    }
}
