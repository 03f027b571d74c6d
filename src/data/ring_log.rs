//! Bounded, overwrite-on-full log with independent reader cursors.
//!
//! One writer publishes entries and receives a monotonically increasing
//! sequence number for each. Readers own a [`Cursor`] holding the next
//! sequence they expect; a reader that falls a full capacity behind the
//! writer gets a [`CursorLapped`] error instead of stale data.
//!
//! All state lives behind a single mutex. Every publish notifies a condition
//! variable so readers blocked in [`SequencedRingLog::take`] wake up and
//! re-check their position.

use crate::error::{EngineError, Result};
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A reader fell behind and the entry it expected was overwritten.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cursor lapped: missed {missed} entries (expected sequence {expected}, log already at {latest})")]
pub struct CursorLapped {
    pub expected: u64,
    pub latest: u64,
    pub missed: u64,
}

/// A payload together with the absolute sequence it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub sequence: u64,
    pub value: T,
}

/// Read position of one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    next: u64,
}

impl Cursor {
    /// Sequence this cursor will read next.
    pub fn next_sequence(&self) -> u64 {
        self.next
    }
}

struct RingState<T> {
    slots: Vec<Option<Entry<T>>>,
    published: u64,
}

impl<T> RingState<T> {
    fn slot(&self, sequence: u64) -> usize {
        (sequence % self.slots.len() as u64) as usize
    }
}

pub struct SequencedRingLog<T> {
    state: Mutex<RingState<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T: Clone> SequencedRingLog<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::Configuration(
                "Ring log capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(RingState {
                slots: (0..capacity).map(|_| None).collect(),
                published: 0,
            }),
            available: Condvar::new(),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RingState<T>> {
        // Slot writes are single assignments; a poisoned lock still guards
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `value`, overwriting the oldest entry when full.
    pub fn publish(&self, value: T) -> u64 {
        self.publish_with(|_| value)
    }

    /// Append the value `build` makes from its own sequence. The sequence is
    /// reserved and the slot written under one lock, so a payload that
    /// carries its sequence always matches the slot it lands in.
    pub fn publish_with<F>(&self, build: F) -> u64
    where
        F: FnOnce(u64) -> T,
    {
        let mut state = self.lock();
        let sequence = state.published;
        let index = state.slot(sequence);
        state.slots[index] = Some(Entry {
            sequence,
            value: build(sequence),
        });
        state.published += 1;
        self.available.notify_all();
        sequence
    }

    /// Non-blocking read of the cursor's next entry. `Ok(None)` when the
    /// cursor has caught up with the writer.
    pub fn poll(&self, cursor: &mut Cursor) -> std::result::Result<Option<Entry<T>>, CursorLapped> {
        let state = self.lock();
        Self::read_next(&state, cursor, self.capacity)
    }

    /// Blocking read: waits for the next publish when the cursor has caught up.
    pub fn take(&self, cursor: &mut Cursor) -> std::result::Result<Entry<T>, CursorLapped> {
        let mut state = self.lock();
        loop {
            if let Some(entry) = Self::read_next(&state, cursor, self.capacity)? {
                return Ok(entry);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn read_next(
        state: &RingState<T>,
        cursor: &mut Cursor,
        capacity: usize,
    ) -> std::result::Result<Option<Entry<T>>, CursorLapped> {
        if state.published <= cursor.next {
            return Ok(None);
        }

        let latest = state.published - 1;
        let distance = latest - cursor.next;
        if distance >= capacity as u64 {
            return Err(CursorLapped {
                expected: cursor.next,
                latest,
                missed: distance - capacity as u64 + 1,
            });
        }

        let entry = state.slots[state.slot(cursor.next)].clone();
        if entry.is_some() {
            cursor.next += 1;
        }
        Ok(entry)
    }

    /// O(1) lookup by absolute sequence. No staleness check: once `sequence`
    /// has been overwritten this returns the newer occupant of its slot, so
    /// callers compare `Entry::sequence` when that matters.
    pub fn get(&self, sequence: u64) -> Option<Entry<T>> {
        let state = self.lock();
        state.slots[state.slot(sequence)].clone()
    }

    /// Most recently published entry.
    pub fn latest(&self) -> Option<Entry<T>> {
        let state = self.lock();
        match state.published {
            0 => None,
            n => state.slots[state.slot(n - 1)].clone(),
        }
    }

    /// Retained entries, oldest first, copied under the lock.
    pub fn snapshot(&self) -> Vec<Entry<T>> {
        let state = self.lock();
        let start = state.published.saturating_sub(self.capacity as u64);
        (start..state.published)
            .filter_map(|sequence| state.slots[state.slot(sequence)].clone())
            .collect()
    }

    /// Cursor positioned at sequence 0.
    pub fn cursor_from_start(&self) -> Cursor {
        Cursor { next: 0 }
    }

    /// Cursor that only sees entries published after this call.
    pub fn cursor_from_now(&self) -> Cursor {
        Cursor {
            next: self.lock().published,
        }
    }

    /// Move a lapped cursor to the oldest retained entry. Returns how many
    /// entries were skipped.
    pub fn resync(&self, cursor: &mut Cursor) -> u64 {
        let oldest = self
            .lock()
            .published
            .saturating_sub(self.capacity as u64);
        let skipped = oldest.saturating_sub(cursor.next);
        cursor.next = cursor.next.max(oldest);
        skipped
    }

    /// Entries published but not yet read through `cursor`.
    pub fn pending(&self, cursor: &Cursor) -> u64 {
        self.lock().published.saturating_sub(cursor.next)
    }

    /// Number of retained entries, at most `capacity`.
    pub fn len(&self) -> usize {
        (self.lock().published as usize).min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().published == 0
    }

    /// Total number of entries ever published; also the next sequence.
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for SequencedRingLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let published = self
            .state
            .lock()
            .map(|s| s.published)
            .unwrap_or_else(|poisoned| poisoned.into_inner().published);
        f.debug_struct("SequencedRingLog")
            .field("capacity", &self.capacity)
            .field("published", &published)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        let result = SequencedRingLog::<u32>::new(0);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_poll_in_order_then_empty() {
        let log = SequencedRingLog::new(4).unwrap();
        let mut cursor = log.cursor_from_start();

        assert_eq!(log.publish("a"), 0);
        assert_eq!(log.publish("b"), 1);

        assert_eq!(log.poll(&mut cursor).unwrap().unwrap().value, "a");
        assert_eq!(log.poll(&mut cursor).unwrap().unwrap().value, "b");
        assert!(log.poll(&mut cursor).unwrap().is_none());
        assert_eq!(cursor.next_sequence(), 2);
    }

    #[test]
    fn test_lapped_cursor_does_not_advance() {
        let log = SequencedRingLog::new(2).unwrap();
        let mut cursor = log.cursor_from_start();
        for i in 0..5 {
            log.publish(i);
        }

        let err = log.poll(&mut cursor).unwrap_err();
        assert_eq!(
            err,
            CursorLapped {
                expected: 0,
                latest: 4,
                missed: 3
            }
        );
        assert_eq!(cursor.next_sequence(), 0);

        assert_eq!(log.resync(&mut cursor), 3);
        assert_eq!(log.poll(&mut cursor).unwrap().unwrap().value, 3);
    }

    #[test]
    fn test_publish_with_stamps_own_sequence() {
        let log = std::sync::Arc::new(SequencedRingLog::new(64).unwrap());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let log = std::sync::Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        log.publish_with(|sequence| sequence);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(log.published(), 40);
        for entry in log.snapshot() {
            assert_eq!(entry.value, entry.sequence);
        }
    }

    #[test]
    fn test_get_has_no_staleness_check() {
        let log = SequencedRingLog::new(2).unwrap();
        log.publish(10);
        log.publish(11);
        log.publish(12);

        // sequence 0 lives in the slot now holding sequence 2
        let entry = log.get(0).unwrap();
        assert_eq!(entry.sequence, 2);
        assert_eq!(entry.value, 12);
    }

    #[test]
    fn test_cursor_from_now_skips_history() {
        let log = SequencedRingLog::new(3).unwrap();
        log.publish(1);
        log.publish(2);
        let mut cursor = log.cursor_from_now();
        assert!(log.poll(&mut cursor).unwrap().is_none());
        log.publish(3);
        assert_eq!(log.poll(&mut cursor).unwrap().unwrap().sequence, 2);
    }

    #[test]
    fn test_pending_and_latest() {
        let log = SequencedRingLog::new(8).unwrap();
        let mut cursor = log.cursor_from_start();
        assert!(log.latest().is_none());
        log.publish(1.0);
        log.publish(2.0);
        assert_eq!(log.pending(&cursor), 2);
        log.poll(&mut cursor).unwrap();
        assert_eq!(log.pending(&cursor), 1);
        assert_eq!(log.latest().unwrap().value, 2.0);
    }
}
