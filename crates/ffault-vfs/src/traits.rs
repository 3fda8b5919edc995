use std::path::Path;

use ffault_error::Result;

/// Options controlling how files are opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOptions {
    /// Bypass the buffered write path; appends go straight to the target.
    pub use_direct_io: bool,
}

/// Caller-computed checksum handed off alongside a write so the filesystem
/// can detect in-flight corruption before the bytes reach storage.
#[derive(Debug, Clone, Default)]
pub struct DataVerification {
    /// Little-endian fixed-32 digest of the payload; empty means "none".
    pub checksum: Vec<u8>,
}

impl DataVerification {
    /// Wrap a precomputed checksum.
    pub fn new(checksum: Vec<u8>) -> Self {
        Self { checksum }
    }
}

/// Why a directory fsync was issued. Forwarded to the backend as a hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirFsyncReason {
    /// No particular reason given.
    #[default]
    Default,
    /// A file in this directory was just synced for the first time.
    NewFileSynced,
    /// A file was renamed into or out of this directory.
    FileRenamed,
    /// The directory itself was renamed.
    DirRenamed,
}

/// Options for [`Directory::fsync_with_options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirFsyncOptions {
    /// The reason hint.
    pub reason: DirFsyncReason,
}

/// Opaque token identifying an in-flight asynchronous read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoHandle(pub u64);

/// A single request in a batched or asynchronous read.
#[derive(Debug)]
pub struct ReadRequest {
    /// Byte offset to read from.
    pub offset: u64,
    /// Number of bytes requested.
    pub len: usize,
    /// Bytes actually read; shorter than `len` at end of file.
    pub result: Vec<u8>,
    /// Per-request completion status.
    pub status: Result<()>,
}

impl ReadRequest {
    /// Build a pending request for `len` bytes at `offset`.
    pub fn new(offset: u64, len: usize) -> Self {
        Self {
            offset,
            len,
            result: Vec::new(),
            status: Ok(()),
        }
    }
}

/// Completion callback for [`RandomAccessFile::read_async`].
pub type ReadCallback = Box<dyn FnOnce(ReadRequest) + Send>;

/// Append-oriented writable file handle.
///
/// Methods take `&mut self`: exclusive access serializes all operations on
/// one handle. Handles are `Send` so an engine may move them between
/// threads.
pub trait WritableFile: Send {
    /// Append `data` at the current end of file.
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Append with a caller-computed checksum. The default ignores the
    /// verification payload; interposing filesystems may check it.
    fn append_with_verification(
        &mut self,
        data: &[u8],
        verification: &DataVerification,
    ) -> Result<()> {
        let _ = verification;
        self.append(data)
    }

    /// Write `data` at an explicit offset.
    fn positioned_append(&mut self, data: &[u8], offset: u64) -> Result<()>;

    /// Positioned append with a caller-computed checksum.
    fn positioned_append_with_verification(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: &DataVerification,
    ) -> Result<()> {
        let _ = verification;
        self.positioned_append(data, offset)
    }

    /// Flush application buffers to the OS.
    fn flush(&mut self) -> Result<()>;

    /// Make all appended data durable.
    fn sync(&mut self) -> Result<()>;

    /// Make the byte range `[offset, offset + nbytes)` durable.
    fn range_sync(&mut self, offset: u64, nbytes: u64) -> Result<()>;

    /// Close the handle. After this call the handle must not be used.
    fn close(&mut self) -> Result<()>;

    /// True if this handle was opened for direct I/O.
    fn use_direct_io(&self) -> bool {
        false
    }
}

/// Random-access read-only file handle. Reads may run concurrently.
pub trait RandomAccessFile: Send + Sync {
    /// Read up to `buf.len()` bytes at `offset` into `buf`; returns the
    /// number of bytes read.
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Execute a batch of reads. The default issues them one at a time.
    fn multi_read(&self, reqs: &mut [ReadRequest]) -> Result<()> {
        for req in reqs.iter_mut() {
            let mut buf = vec![0u8; req.len];
            match self.read(req.offset, &mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    req.result = buf;
                    req.status = Ok(());
                }
                Err(e) => req.status = Err(e),
            }
        }
        Ok(())
    }

    /// Start an asynchronous read, invoking `cb` with the completed
    /// request. The default performs the read synchronously.
    fn read_async(&self, mut req: ReadRequest, cb: ReadCallback) -> Result<()> {
        let mut buf = vec![0u8; req.len];
        match self.read(req.offset, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                req.result = buf;
                req.status = Ok(());
            }
            Err(e) => req.status = Err(e),
        }
        cb(req);
        Ok(())
    }

    /// A stable identifier for the underlying file, or `None` when the
    /// backend cannot produce one.
    fn unique_id(&self) -> Option<Vec<u8>> {
        None
    }

    /// True if this handle was opened for direct I/O.
    fn use_direct_io(&self) -> bool {
        false
    }
}

/// Sequentially-read file handle with an implicit cursor.
pub trait SequentialFile: Send {
    /// Read up to `buf.len()` bytes at the cursor, advancing it.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read at an explicit offset without moving the cursor.
    fn positioned_read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Advance the cursor by `n` bytes.
    fn skip(&mut self, n: u64) -> Result<()>;
}

/// Read-write file handle addressed by offset.
pub trait RandomRwFile: Send {
    /// Write `data` at `offset`.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes at `offset`.
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Flush application buffers to the OS.
    fn flush(&mut self) -> Result<()>;

    /// Make written data durable.
    fn sync(&mut self) -> Result<()>;

    /// Close the handle.
    fn close(&mut self) -> Result<()>;

    /// True if this handle was opened for direct I/O.
    fn use_direct_io(&self) -> bool {
        false
    }
}

/// Directory handle used for fsync-based durability of directory entries.
pub trait Directory: Send {
    /// Make the directory's entries durable.
    fn fsync(&mut self) -> Result<()>;

    /// Fsync with a reason hint. The default ignores the hint.
    fn fsync_with_options(&mut self, opts: DirFsyncOptions) -> Result<()> {
        let _ = opts;
        self.fsync()
    }

    /// Close the handle.
    fn close(&mut self) -> Result<()>;
}

/// The capability set a filesystem must offer to sit underneath the fault
/// layer: open in every mode, namespace mutation, existence/size probes,
/// and async-I/O plumbing.
pub trait FsBackend: Send + Sync {
    /// Writable handle type.
    type Writable: WritableFile;
    /// Random-access handle type.
    type RandomAccess: RandomAccessFile;
    /// Random read-write handle type.
    type RandomRw: RandomRwFile;
    /// Sequential handle type.
    type Sequential: SequentialFile;
    /// Directory handle type.
    type Dir: Directory;

    /// Create (truncating) a writable file.
    fn new_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable>;

    /// Open an existing file for appending, creating it if absent.
    fn reopen_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable>;

    /// Open a file for random-access reads.
    fn new_random_access_file(&self, path: &Path, opts: FileOptions)
        -> Result<Self::RandomAccess>;

    /// Open (creating) a file for random reads and writes.
    fn new_random_rw_file(&self, path: &Path, opts: FileOptions) -> Result<Self::RandomRw>;

    /// Open a file for sequential reads.
    fn new_sequential_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Sequential>;

    /// Open a directory handle.
    fn new_directory(&self, path: &Path) -> Result<Self::Dir>;

    /// Delete a file.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Rename `src` to `dst`, replacing any existing `dst`.
    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Hard-link `src` as `dst`.
    fn link_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// True if `path` exists.
    fn file_exists(&self, path: &Path) -> Result<bool>;

    /// Size of the file at `path` in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Wait for at least `min_completions` of the given async reads.
    /// Backends without real async I/O return immediately.
    fn poll(&self, handles: &mut Vec<IoHandle>, min_completions: usize) -> Result<()> {
        let _ = (handles, min_completions);
        Ok(())
    }

    /// Abort the given async reads.
    fn abort_io(&self, handles: &mut Vec<IoHandle>) -> Result<()> {
        let _ = handles;
        Ok(())
    }
}
