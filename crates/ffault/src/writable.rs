//! Writable and random-read-write handle wrappers.

use std::path::PathBuf;
use std::sync::Arc;

use ffault_error::{FaultError, Result};
use ffault_vfs::{DataVerification, RandomRwFile, WritableFile};

use crate::checksum::{typed_checksum, ChecksumKind};
use crate::fs::FaultShared;
use crate::state::FileState;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A managed writable file.
///
/// Appends are buffered in the per-file [`FileState`] (unless the target
/// uses direct I/O) so a simulated crash can drop them; flush/sync/close
/// move the position markers and push buffered bytes to the target.
/// Exclusive `&mut self` access serializes all operations on one handle.
#[derive(Debug)]
pub struct FaultWritableFile<W: WritableFile> {
    state: FileState,
    target: W,
    opened: bool,
    shared: Arc<FaultShared>,
}

impl<W: WritableFile> FaultWritableFile<W> {
    pub(crate) fn new(filename: PathBuf, target: W, shared: Arc<FaultShared>) -> Self {
        Self {
            state: FileState::new(filename),
            target,
            opened: true,
            shared,
        }
    }

    /// Snapshot of this handle's durability state.
    pub fn state(&self) -> &FileState {
        &self.state
    }

    fn verify_checksum(&self, data: &[u8], verification: &DataVerification) -> Result<()> {
        if self.shared.should_corrupt_before_write() {
            return Err(FaultError::corruption("Data is corrupted!"));
        }
        let kind = self.shared.checksum_kind();
        let checksum = typed_checksum(kind, data);
        if kind != ChecksumKind::None && checksum != verification.checksum {
            return Err(FaultError::corruption(format!(
                "Data is corrupted! Origin data checksum: {}, current data checksum: {}",
                hex(&verification.checksum),
                hex(&checksum)
            )));
        }
        Ok(())
    }

    fn buffer_append(&mut self, data: &[u8]) {
        if self.target.use_direct_io() {
            // Direct I/O bypasses the buffer; the underlying status is
            // deliberately discarded so injection decides the outcome.
            let _ = self.target.append(data);
        } else {
            self.state.buffer.extend_from_slice(data);
            self.state.pos += data.len() as i64;
            self.shared.writable_file_appended(&self.state);
        }
    }
}

impl<W: WritableFile> WritableFile for FaultWritableFile<W> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.shared.gate()?;
        self.buffer_append(data);
        self.shared.inject_write_error(&self.state.filename)
    }

    fn append_with_verification(
        &mut self,
        data: &[u8],
        verification: &DataVerification,
    ) -> Result<()> {
        self.shared.gate()?;
        self.verify_checksum(data, verification)?;
        self.buffer_append(data);
        self.shared.inject_write_error(&self.state.filename)
    }

    fn positioned_append(&mut self, data: &[u8], offset: u64) -> Result<()> {
        self.shared.gate()?;
        let _ = self.target.positioned_append(data, offset);
        self.shared.inject_write_error(&self.state.filename)
    }

    fn positioned_append_with_verification(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: &DataVerification,
    ) -> Result<()> {
        self.shared.gate()?;
        self.verify_checksum(data, verification)?;
        let _ = self.target.positioned_append(data, offset);
        self.shared.inject_write_error(&self.state.filename)
    }

    fn flush(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.state.pos_at_last_flush = self.state.pos;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.shared.gate()?;
        if self.target.use_direct_io() {
            // Nothing is buffered here in direct mode.
            return Ok(());
        }
        let io_s = self.target.append(&self.state.buffer);
        self.state.buffer.clear();
        let _ = self.target.sync();
        self.state.pos_at_last_sync = self.state.pos;
        self.shared.writable_file_synced(&self.state);
        io_s
    }

    #[allow(clippy::cast_possible_wrap)]
    fn range_sync(&mut self, offset: u64, nbytes: u64) -> Result<()> {
        self.shared.gate()?;
        // Assumes the caller passes consecutive byte ranges.
        let sync_limit = offset + nbytes;
        let buf_begin = self.state.pos_at_last_sync.max(0) as u64;
        if sync_limit < buf_begin {
            return Ok(());
        }
        let num_to_sync = (self.state.buffer.len() as u64).min(sync_limit - buf_begin);
        let n = num_to_sync as usize;
        let io_s = self.target.append(&self.state.buffer[..n]);
        self.state.buffer.drain(..n);
        let _ = self.target.range_sync(offset, nbytes);
        self.state.pos_at_last_sync = (offset + num_to_sync) as i64;
        self.shared.writable_file_synced(&self.state);
        io_s
    }

    fn close(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;
        self.opened = false;
        let mut io_s = Ok(());
        if !self.target.use_direct_io() {
            io_s = self.target.append(&self.state.buffer);
        }
        if io_s.is_ok() {
            self.state.buffer.clear();
            let _ = self.target.sync();
            io_s = self.target.close();
        }
        if io_s.is_ok() {
            self.shared.writable_file_closed(&self.state);
            self.shared.inject_metadata_write_error()?;
        }
        io_s
    }

    fn use_direct_io(&self) -> bool {
        self.target.use_direct_io()
    }
}

impl<W: WritableFile> Drop for FaultWritableFile<W> {
    fn drop(&mut self) {
        if self.opened {
            let _ = self.close();
        }
    }
}

/// A writable handle issued by the fault filesystem: either managed, or
/// the raw backend handle when the direct-writable bypass applies or a
/// reopened file is not eligible for tracking.
#[derive(Debug)]
pub enum WritableHandle<W: WritableFile> {
    /// Managed by the fault layer.
    Fault(FaultWritableFile<W>),
    /// Raw backend handle.
    Direct(W),
}

impl<W: WritableFile> WritableFile for WritableHandle<W> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Fault(f) => f.append(data),
            Self::Direct(f) => f.append(data),
        }
    }

    fn append_with_verification(
        &mut self,
        data: &[u8],
        verification: &DataVerification,
    ) -> Result<()> {
        match self {
            Self::Fault(f) => f.append_with_verification(data, verification),
            Self::Direct(f) => f.append_with_verification(data, verification),
        }
    }

    fn positioned_append(&mut self, data: &[u8], offset: u64) -> Result<()> {
        match self {
            Self::Fault(f) => f.positioned_append(data, offset),
            Self::Direct(f) => f.positioned_append(data, offset),
        }
    }

    fn positioned_append_with_verification(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: &DataVerification,
    ) -> Result<()> {
        match self {
            Self::Fault(f) => f.positioned_append_with_verification(data, offset, verification),
            Self::Direct(f) => f.positioned_append_with_verification(data, offset, verification),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.flush(),
            Self::Direct(f) => f.flush(),
        }
    }

    fn sync(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.sync(),
            Self::Direct(f) => f.sync(),
        }
    }

    fn range_sync(&mut self, offset: u64, nbytes: u64) -> Result<()> {
        match self {
            Self::Fault(f) => f.range_sync(offset, nbytes),
            Self::Direct(f) => f.range_sync(offset, nbytes),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.close(),
            Self::Direct(f) => f.close(),
        }
    }

    fn use_direct_io(&self) -> bool {
        match self {
            Self::Fault(f) => f.use_direct_io(),
            Self::Direct(f) => f.use_direct_io(),
        }
    }
}

impl<W: WritableFile> WritableHandle<W> {
    /// Durability state, when this handle is managed.
    pub fn state(&self) -> Option<&FileState> {
        match self {
            Self::Fault(f) => Some(f.state()),
            Self::Direct(_) => None,
        }
    }
}

/// A random read-write file behind the active gate. No buffering and no
/// injection; every operation checks the gate and delegates.
pub struct FaultRandomRwFile<F: RandomRwFile> {
    target: F,
    shared: Arc<FaultShared>,
}

impl<F: RandomRwFile> FaultRandomRwFile<F> {
    pub(crate) fn new(target: F, shared: Arc<FaultShared>) -> Self {
        Self { target, shared }
    }
}

impl<F: RandomRwFile> RandomRwFile for FaultRandomRwFile<F> {
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.shared.gate()?;
        self.target.write(offset, data)
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.shared.gate()?;
        self.target.read(offset, buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.target.flush()
    }

    fn sync(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.target.sync()
    }

    fn close(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.target.close()
    }

    fn use_direct_io(&self) -> bool {
        self.target.use_direct_io()
    }
}

/// A random read-write handle issued by the fault filesystem.
pub enum RandomRwHandle<F: RandomRwFile> {
    /// Behind the active gate.
    Fault(FaultRandomRwFile<F>),
    /// Raw backend handle (direct-writable bypass).
    Direct(F),
}

impl<F: RandomRwFile> RandomRwFile for RandomRwHandle<F> {
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        match self {
            Self::Fault(f) => f.write(offset, data),
            Self::Direct(f) => f.write(offset, data),
        }
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::Fault(f) => f.read(offset, buf),
            Self::Direct(f) => f.read(offset, buf),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.flush(),
            Self::Direct(f) => f.flush(),
        }
    }

    fn sync(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.sync(),
            Self::Direct(f) => f.sync(),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::Fault(f) => f.close(),
            Self::Direct(f) => f.close(),
        }
    }

    fn use_direct_io(&self) -> bool {
        match self {
            Self::Fault(f) => f.use_direct_io(),
            Self::Direct(f) => f.use_direct_io(),
        }
    }
}
