pub mod ring_log;

pub use ring_log::{Cursor, CursorLapped, Entry, SequencedRingLog};
