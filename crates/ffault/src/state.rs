use std::path::PathBuf;

use rand::Rng;

/// Value of the position markers before the first flush or sync.
pub const NEVER: i64 = -1;

/// Buffered durability state for one managed writable file.
///
/// Appends land in `buffer` until a sync pushes them to the underlying
/// file; truncating the buffer models writes lost to a crash. Position
/// counters only advance: `pos_at_last_sync <= pos_at_last_flush <= pos`,
/// with [`NEVER`] reading as less than everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    /// Absolute path; the identity of this record.
    pub filename: PathBuf,
    /// Bytes appended since the last sync.
    pub buffer: Vec<u8>,
    /// Total bytes appended since open.
    pub pos: i64,
    /// Value of `pos` when `flush` last ran.
    pub pos_at_last_flush: i64,
    /// Value of `pos` when `sync` last ran.
    pub pos_at_last_sync: i64,
}

impl FileState {
    /// Fresh state for a newly opened file.
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            buffer: Vec::new(),
            pos: 0,
            pos_at_last_flush: NEVER,
            pos_at_last_sync: NEVER,
        }
    }

    /// Discard all unsynced bytes. Idempotent.
    pub fn drop_unsynced_data(&mut self) {
        self.buffer.clear();
    }

    /// Truncate the unsynced buffer to a uniformly random prefix. No-op
    /// when the buffer is empty.
    pub fn drop_random_unsynced_data(&mut self, rng: &mut impl Rng) {
        if !self.buffer.is_empty() {
            let truncated = rng.gen_range(0..self.buffer.len());
            self.buffer.truncate(truncated);
        }
    }

    /// True when nothing would be lost by a crash: no buffered bytes and
    /// the last sync covered every appended byte.
    #[must_use]
    pub fn is_fully_synced(&self) -> bool {
        self.buffer.is_empty() && self.pos_at_last_sync == self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_state_is_not_fully_synced() {
        let state = FileState::new("/db/a.log");
        assert_eq!(state.pos, 0);
        assert_eq!(state.pos_at_last_sync, NEVER);
        assert!(!state.is_fully_synced());
    }

    #[test]
    fn drop_unsynced_clears_buffer() {
        let mut state = FileState::new("/db/a.log");
        state.buffer.extend_from_slice(b"pending");
        state.pos = 7;

        state.drop_unsynced_data();
        assert!(state.buffer.is_empty());
        // Dropping again is fine.
        state.drop_unsynced_data();
        assert!(state.buffer.is_empty());
    }

    #[test]
    fn drop_random_truncates_to_prefix() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = FileState::new("/db/a.log");
        state.buffer.extend_from_slice(b"0123456789");

        state.drop_random_unsynced_data(&mut rng);
        assert!(state.buffer.len() < 10);
        assert!(b"0123456789".starts_with(&state.buffer));
    }

    #[test]
    fn drop_random_on_empty_is_noop() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = FileState::new("/db/a.log");
        state.drop_random_unsynced_data(&mut rng);
        assert!(state.buffer.is_empty());
    }

    #[test]
    fn drop_random_is_deterministic_under_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = FileState::new("/db/a.log");
            state.buffer.extend_from_slice(b"abcdefghij");
            state.drop_random_unsynced_data(&mut rng);
            state.buffer
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn fully_synced_requires_empty_buffer_and_matching_pos() {
        let mut state = FileState::new("/db/a.log");
        state.pos = 4;
        state.pos_at_last_sync = 4;
        assert!(state.is_fully_synced());

        state.buffer.push(b'x');
        assert!(!state.is_fully_synced());

        state.buffer.clear();
        state.pos = 5;
        assert!(!state.is_fully_synced());
    }
}
