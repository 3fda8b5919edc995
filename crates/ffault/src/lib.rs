//! FrankenFault: a fault-injection filesystem for crash-consistency
//! testing of storage engines.
//!
//! [`FaultFs`] wraps any filesystem backend and, transparently to the
//! engine above it, buffers unsynced writes (so a simulated crash can
//! drop them), injects read/write/metadata errors on a programmable
//! schedule, and tracks which files appeared since each directory's last
//! fsync (so a simulated crash can erase them).
//!
//! ```
//! use std::path::Path;
//!
//! use ffault::FaultFs;
//! use ffault_vfs::{FileOptions, FsBackend, MemFs, WritableFile};
//!
//! let fs = FaultFs::new(MemFs::new());
//! let path = Path::new("/db/000001.log");
//!
//! let mut file = fs.new_writable_file(path, FileOptions::default()).unwrap();
//! file.append(b"hello").unwrap();
//!
//! // Nothing was synced; a crash loses everything.
//! fs.drop_unsynced_file_data().unwrap();
//! assert!(fs.tracked_file_state(path).unwrap().buffer.is_empty());
//! ```

pub mod checksum;
pub mod dir;
pub mod filename;
pub mod fs;
pub mod inject;
pub mod path;
pub mod read;
pub mod state;
pub mod writable;

pub use checksum::{typed_checksum, ChecksumKind};
pub use dir::FaultDirectory;
pub use filename::{parse_file_name, try_parse_file_name, FileType};
pub use fs::{FaultFs, PreservedContents};
pub use inject::ErrorOperation;
pub use read::{FaultRandomAccessFile, FaultSequentialFile};
pub use state::FileState;
pub use writable::{FaultRandomRwFile, FaultWritableFile, RandomRwHandle, WritableHandle};
