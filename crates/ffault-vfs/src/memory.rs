use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ffault_error::{FaultError, Result};

use crate::traits::{
    Directory, FileOptions, FsBackend, RandomAccessFile, RandomRwFile, SequentialFile,
    WritableFile,
};

/// Shared byte storage for one file. Multiple handles (and hard links)
/// reference the same storage via `Arc<Mutex<..>>`.
type Storage = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Default)]
struct MemFsInner {
    files: HashMap<PathBuf, Storage>,
}

/// An in-memory backend for tests.
///
/// All files live in a shared map with no persistence. Clones of a `MemFs`
/// see the same files, so a test can hold one clone while the fault layer
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    inner: Arc<Mutex<MemFsInner>>,
}

impl MemFs {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err() -> FaultError {
    FaultError::io("MemFs lock poisoned")
}

/// Writable handle; appends extend the shared byte vector.
#[derive(Debug)]
pub struct MemWritableFile {
    storage: Storage,
    direct: bool,
}

impl WritableFile for MemWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.storage
            .lock()
            .map_err(|_| lock_err())?
            .extend_from_slice(data);
        Ok(())
    }

    fn positioned_append(&mut self, data: &[u8], offset: u64) -> Result<()> {
        let mut storage = self.storage.lock().map_err(|_| lock_err())?;
        let offset = usize::try_from(offset).map_err(|_| FaultError::io("offset overflow"))?;
        let end = offset + data.len();
        if end > storage.len() {
            storage.resize(end, 0);
        }
        storage[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn range_sync(&mut self, _offset: u64, _nbytes: u64) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Random-access read handle.
#[derive(Debug)]
pub struct MemRandomAccessFile {
    storage: Storage,
    direct: bool,
}

impl RandomAccessFile for MemRandomAccessFile {
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let storage = self.storage.lock().map_err(|_| lock_err())?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset >= storage.len() {
            return Ok(0);
        }
        let n = buf.len().min(storage.len() - offset);
        buf[..n].copy_from_slice(&storage[offset..offset + n]);
        Ok(n)
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Sequential read handle with its own cursor.
#[derive(Debug)]
pub struct MemSequentialFile {
    storage: Storage,
    pos: usize,
}

impl SequentialFile for MemSequentialFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let storage = self.storage.lock().map_err(|_| lock_err())?;
        if self.pos >= storage.len() {
            return Ok(0);
        }
        let n = buf.len().min(storage.len() - self.pos);
        buf[..n].copy_from_slice(&storage[self.pos..self.pos + n]);
        drop(storage);
        self.pos += n;
        Ok(n)
    }

    fn positioned_read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let storage = self.storage.lock().map_err(|_| lock_err())?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset >= storage.len() {
            return Ok(0);
        }
        let n = buf.len().min(storage.len() - offset);
        buf[..n].copy_from_slice(&storage[offset..offset + n]);
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        self.pos = self.pos.saturating_add(usize::try_from(n).unwrap_or(usize::MAX));
        Ok(())
    }
}

/// Random read-write handle.
#[derive(Debug)]
pub struct MemRandomRwFile {
    storage: Storage,
    direct: bool,
}

impl RandomRwFile for MemRandomRwFile {
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self.storage.lock().map_err(|_| lock_err())?;
        let offset = usize::try_from(offset).map_err(|_| FaultError::io("offset overflow"))?;
        let end = offset + data.len();
        if end > storage.len() {
            storage.resize(end, 0);
        }
        storage[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let storage = self.storage.lock().map_err(|_| lock_err())?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset >= storage.len() {
            return Ok(0);
        }
        let n = buf.len().min(storage.len() - offset);
        buf[..n].copy_from_slice(&storage[offset..offset + n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Directory handle; fsync is a no-op in memory.
#[derive(Debug)]
pub struct MemDirectory;

impl Directory for MemDirectory {
    fn fsync(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MemFs {
    fn storage(&self, path: &Path) -> Result<Option<Storage>> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| lock_err())?
            .files
            .get(path)
            .cloned())
    }
}

impl FsBackend for MemFs {
    type Writable = MemWritableFile;
    type RandomAccess = MemRandomAccessFile;
    type RandomRw = MemRandomRwFile;
    type Sequential = MemSequentialFile;
    type Dir = MemDirectory;

    fn new_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let storage = if let Some(existing) = inner.files.get(path) {
            // Creating truncates the existing file in place, so open
            // readers observe the truncation like they would on a host fs.
            existing.lock().map_err(|_| lock_err())?.clear();
            Arc::clone(existing)
        } else {
            let storage = Storage::default();
            inner.files.insert(path.to_path_buf(), Arc::clone(&storage));
            storage
        };
        Ok(MemWritableFile {
            storage,
            direct: opts.use_direct_io,
        })
    }

    fn reopen_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let storage = inner
            .files
            .entry(path.to_path_buf())
            .or_default();
        Ok(MemWritableFile {
            storage: Arc::clone(storage),
            direct: opts.use_direct_io,
        })
    }

    fn new_random_access_file(
        &self,
        path: &Path,
        opts: FileOptions,
    ) -> Result<Self::RandomAccess> {
        let storage = self
            .storage(path)?
            .ok_or_else(|| FaultError::not_found(path))?;
        Ok(MemRandomAccessFile {
            storage,
            direct: opts.use_direct_io,
        })
    }

    fn new_random_rw_file(&self, path: &Path, opts: FileOptions) -> Result<Self::RandomRw> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let storage = inner
            .files
            .entry(path.to_path_buf())
            .or_default();
        Ok(MemRandomRwFile {
            storage: Arc::clone(storage),
            direct: opts.use_direct_io,
        })
    }

    fn new_sequential_file(&self, path: &Path, _opts: FileOptions) -> Result<Self::Sequential> {
        let storage = self
            .storage(path)?
            .ok_or_else(|| FaultError::not_found(path))?;
        Ok(MemSequentialFile { storage, pos: 0 })
    }

    fn new_directory(&self, _path: &Path) -> Result<Self::Dir> {
        Ok(MemDirectory)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| lock_err())?
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FaultError::not_found(path))
    }

    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        let storage = inner
            .files
            .remove(src)
            .ok_or_else(|| FaultError::not_found(src))?;
        inner.files.insert(dst.to_path_buf(), storage);
        Ok(())
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| lock_err())?;
        if inner.files.contains_key(dst) {
            return Err(FaultError::io(format!(
                "link target exists: {}",
                dst.display()
            )));
        }
        let storage = inner
            .files
            .get(src)
            .cloned()
            .ok_or_else(|| FaultError::not_found(src))?;
        inner.files.insert(dst.to_path_buf(), storage);
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.storage(path)?.is_some())
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        let storage = self
            .storage(path)?
            .ok_or_else(|| FaultError::not_found(path))?;
        let len = storage.lock().map_err(|_| lock_err())?.len();
        Ok(len as u64)
    }
}
