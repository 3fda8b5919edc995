//! Property tests for the durability bookkeeping and checksum handoff.

use std::path::Path;

use proptest::prelude::*;

use ffault::{typed_checksum, ChecksumKind, FaultFs};
use ffault_vfs::{read_file_to_vec, DataVerification, FileOptions, FsBackend, MemFs, WritableFile};

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Flush,
    Sync,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Op::Append),
        Just(Op::Flush),
        Just(Op::Sync),
    ]
}

proptest! {
    // The position markers never regress and never pass each other,
    // and a completed sync leaves nothing buffered.
    #[test]
    fn position_counters_never_regress(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let fs = FaultFs::new(MemFs::new());
        let path = Path::new("/db/000001.log");
        let mut file = fs.new_writable_file(path, FileOptions::default()).unwrap();

        let mut prev_flush = i64::MIN;
        let mut prev_sync = i64::MIN;
        for op in ops {
            let is_sync = matches!(op, Op::Sync);
            match op {
                Op::Append(data) => file.append(&data).unwrap(),
                Op::Flush => file.flush().unwrap(),
                Op::Sync => {
                    // The engine always flushes before it syncs.
                    file.flush().unwrap();
                    file.sync().unwrap();
                }
            }
            let state = file.state().expect("managed handle");
            prop_assert!(state.pos_at_last_sync <= state.pos_at_last_flush);
            prop_assert!(state.pos_at_last_flush <= state.pos);
            prop_assert!(state.pos_at_last_flush >= prev_flush);
            prop_assert!(state.pos_at_last_sync >= prev_sync);
            if is_sync {
                prop_assert!(state.buffer.is_empty());
                prop_assert_eq!(state.pos_at_last_sync, state.pos);
            }
            prev_flush = state.pos_at_last_flush;
            prev_sync = state.pos_at_last_sync;
        }
    }

    // A crash recovers exactly the bytes covered by the last sync.
    #[test]
    fn crash_recovers_exactly_synced_bytes(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let fs = FaultFs::new(MemFs::new());
        let path = Path::new("/db/000001.log");
        let mut file = fs.new_writable_file(path, FileOptions::default()).unwrap();

        let mut appended = Vec::new();
        let mut synced = Vec::new();
        for op in ops {
            match op {
                Op::Append(data) => {
                    file.append(&data).unwrap();
                    appended.extend_from_slice(&data);
                }
                Op::Flush => file.flush().unwrap(),
                Op::Sync => {
                    file.flush().unwrap();
                    file.sync().unwrap();
                    synced.clone_from(&appended);
                }
            }
        }

        fs.set_filesystem_active(false);
        fs.drop_unsynced_file_data().unwrap();
        drop(file);
        fs.reset_state();

        prop_assert_eq!(read_file_to_vec(fs.target(), path).unwrap(), synced);
    }

    // Matching handoff checksums pass; a mismatch is Corruption and
    // buffers nothing.
    #[test]
    fn checksum_handoff_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        flip in 1u8..,
    ) {
        let fs = FaultFs::new(MemFs::new());
        fs.set_checksum_handoff_kind(ChecksumKind::Crc32c);
        let path = Path::new("/db/000001.log");
        let mut file = fs.new_writable_file(path, FileOptions::default()).unwrap();

        let good = typed_checksum(ChecksumKind::Crc32c, &data);
        file.append_with_verification(&data, &DataVerification::new(good.clone()))
            .unwrap();
        let state = file.state().expect("managed handle");
        prop_assert_eq!(state.pos as usize, data.len());

        let mut bad = good;
        bad[0] ^= flip;
        let err = file
            .append_with_verification(&data, &DataVerification::new(bad))
            .unwrap_err();
        prop_assert!(err.is_corruption());

        let state = file.state().expect("managed handle");
        prop_assert_eq!(state.pos as usize, data.len());
        prop_assert_eq!(&state.buffer, &data);
    }

    // Dropping a random prefix of the unsynced buffer never invents
    // bytes: what remains is a prefix of what was appended.
    #[test]
    fn random_drop_keeps_a_prefix(
        data in proptest::collection::vec(any::<u8>(), 1..128),
        seed in any::<u64>(),
    ) {
        let fs = FaultFs::new(MemFs::new());
        let path = Path::new("/db/000001.log");
        let mut file = fs.new_writable_file(path, FileOptions::default()).unwrap();
        file.append(&data).unwrap();

        fs.drop_random_unsynced_file_data(seed).unwrap();
        let state = fs.tracked_file_state(path).expect("tracked");
        prop_assert!(state.buffer.len() < data.len());
        prop_assert!(data.starts_with(&state.buffer));
        drop(file);
    }
}
