pub mod host;
pub mod memory;
pub mod traits;
pub mod util;

pub use host::HostFs;
pub use memory::MemFs;
pub use traits::{
    DataVerification, DirFsyncOptions, DirFsyncReason, Directory, FileOptions, FsBackend,
    IoHandle, RandomAccessFile, RandomRwFile, ReadCallback, ReadRequest, SequentialFile,
    WritableFile,
};
pub use util::{read_file_to_vec, write_vec_to_file};
