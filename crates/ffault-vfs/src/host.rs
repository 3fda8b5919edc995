//! POSIX backend over `std::fs`.
//!
//! Positioned reads and writes go through `std::os::unix::fs::FileExt` so
//! concurrent reads on one handle need no seek coordination. Directory
//! fsync opens the directory read-only and calls `sync_all`, which is the
//! portable rendition of `fsync(dirfd)`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::{Path, PathBuf};

use ffault_error::{FaultError, Result};

use crate::traits::{
    Directory, FileOptions, FsBackend, RandomAccessFile, RandomRwFile, SequentialFile,
    WritableFile,
};

/// Real-filesystem backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl HostFs {
    /// Create a host backend.
    pub fn new() -> Self {
        Self
    }
}

fn io_ctx(path: &Path, err: std::io::Error) -> FaultError {
    if err.kind() == std::io::ErrorKind::NotFound {
        FaultError::not_found(path)
    } else {
        FaultError::io(format!("{}: {err}", path.display()))
    }
}

/// Writable file over a host fd. Appends seek to the end explicitly, so
/// positioned appends on the same fd are not affected by `O_APPEND`.
#[derive(Debug)]
pub struct HostWritableFile {
    file: File,
    path: PathBuf,
    direct: bool,
}

impl WritableFile for HostWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::End(0))
            .and_then(|_| self.file.write_all(data))
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn positioned_append(&mut self, data: &[u8], offset: u64) -> Result<()> {
        self.file
            .write_all_at(data, offset)
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| io_ctx(&self.path, e))
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(|e| io_ctx(&self.path, e))
    }

    fn range_sync(&mut self, _offset: u64, _nbytes: u64) -> Result<()> {
        // No stable std wrapper for sync_file_range; sync_data covers the
        // requested range and more.
        self.file.sync_data().map_err(|e| io_ctx(&self.path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| io_ctx(&self.path, e))
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Random-access read handle over a host fd.
#[derive(Debug)]
pub struct HostRandomAccessFile {
    file: File,
    path: PathBuf,
    direct: bool,
}

impl RandomAccessFile for HostRandomAccessFile {
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file
            .read_at(buf, offset)
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn unique_id(&self) -> Option<Vec<u8>> {
        let meta = self.file.metadata().ok()?;
        let mut id = Vec::with_capacity(16);
        id.extend_from_slice(&meta.dev().to_le_bytes());
        id.extend_from_slice(&meta.ino().to_le_bytes());
        Some(id)
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Sequential read handle with the fd's own cursor.
#[derive(Debug)]
pub struct HostSequentialFile {
    file: File,
    path: PathBuf,
}

impl SequentialFile for HostSequentialFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf).map_err(|e| io_ctx(&self.path, e))
    }

    fn positioned_read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file
            .read_at(buf, offset)
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let n = i64::try_from(n).map_err(|_| FaultError::io("skip distance overflows i64"))?;
        self.file
            .seek(SeekFrom::Current(n))
            .map(|_| ())
            .map_err(|e| io_ctx(&self.path, e))
    }
}

/// Random read-write handle over a host fd.
#[derive(Debug)]
pub struct HostRandomRwFile {
    file: File,
    path: PathBuf,
    direct: bool,
}

impl RandomRwFile for HostRandomRwFile {
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.file
            .write_all_at(data, offset)
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file
            .read_at(buf, offset)
            .map_err(|e| io_ctx(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| io_ctx(&self.path, e))
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(|e| io_ctx(&self.path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| io_ctx(&self.path, e))
    }

    fn use_direct_io(&self) -> bool {
        self.direct
    }
}

/// Directory handle; fsync makes entry mutations durable.
#[derive(Debug)]
pub struct HostDirectory {
    file: File,
    path: PathBuf,
}

impl Directory for HostDirectory {
    fn fsync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(|e| io_ctx(&self.path, e))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl FsBackend for HostFs {
    type Writable = HostWritableFile;
    type RandomAccess = HostRandomAccessFile;
    type RandomRw = HostRandomRwFile;
    type Sequential = HostSequentialFile;
    type Dir = HostDirectory;

    fn new_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| io_ctx(path, e))?;
        Ok(HostWritableFile {
            file,
            path: path.to_path_buf(),
            direct: opts.use_direct_io,
        })
    }

    fn reopen_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| io_ctx(path, e))?;
        Ok(HostWritableFile {
            file,
            path: path.to_path_buf(),
            direct: opts.use_direct_io,
        })
    }

    fn new_random_access_file(
        &self,
        path: &Path,
        opts: FileOptions,
    ) -> Result<Self::RandomAccess> {
        let file = File::open(path).map_err(|e| io_ctx(path, e))?;
        Ok(HostRandomAccessFile {
            file,
            path: path.to_path_buf(),
            direct: opts.use_direct_io,
        })
    }

    fn new_random_rw_file(&self, path: &Path, opts: FileOptions) -> Result<Self::RandomRw> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| io_ctx(path, e))?;
        Ok(HostRandomRwFile {
            file,
            path: path.to_path_buf(),
            direct: opts.use_direct_io,
        })
    }

    fn new_sequential_file(&self, path: &Path, _opts: FileOptions) -> Result<Self::Sequential> {
        let file = File::open(path).map_err(|e| io_ctx(path, e))?;
        Ok(HostSequentialFile {
            file,
            path: path.to_path_buf(),
        })
    }

    fn new_directory(&self, path: &Path) -> Result<Self::Dir> {
        let file = File::open(path).map_err(|e| io_ctx(path, e))?;
        Ok(HostDirectory {
            file,
            path: path.to_path_buf(),
        })
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| io_ctx(path, e))
    }

    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::rename(src, dst).map_err(|e| io_ctx(src, e))
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::hard_link(src, dst).map_err(|e| io_ctx(src, e))
    }

    fn file_exists(&self, path: &Path) -> Result<bool> {
        path.try_exists().map_err(|e| io_ctx(path, e))
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| io_ctx(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn append_sync_and_read_back() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("data.log");

        let mut file = fs.new_writable_file(&path, FileOptions::default()).unwrap();
        file.append(b"hello ").unwrap();
        file.append(b"world").unwrap();
        file.sync().unwrap();
        file.close().unwrap();

        let reader = fs
            .new_random_access_file(&path, FileOptions::default())
            .unwrap();
        let mut buf = [0u8; 11];
        let n = reader.read(0, &mut buf).unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn new_writable_truncates_existing() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("trunc.log");

        let mut file = fs.new_writable_file(&path, FileOptions::default()).unwrap();
        file.append(b"old contents").unwrap();
        file.close().unwrap();

        let file = fs.new_writable_file(&path, FileOptions::default()).unwrap();
        drop(file);
        assert_eq!(fs.file_size(&path).unwrap(), 0);
    }

    #[test]
    fn reopen_appends_after_existing_bytes() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("append.log");

        let mut file = fs.new_writable_file(&path, FileOptions::default()).unwrap();
        file.append(b"abc").unwrap();
        file.close().unwrap();

        let mut file = fs
            .reopen_writable_file(&path, FileOptions::default())
            .unwrap();
        file.append(b"def").unwrap();
        file.close().unwrap();

        assert_eq!(crate::util::read_file_to_vec(&fs, &path).unwrap(), b"abcdef");
    }

    #[test]
    fn sequential_read_and_skip() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("seq.log");
        crate::util::write_vec_to_file(&fs, &path, b"0123456789", false).unwrap();

        let mut file = fs
            .new_sequential_file(&path, FileOptions::default())
            .unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"012");

        file.skip(4).unwrap();
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"789");

        // Positioned reads do not move the cursor.
        assert_eq!(file.positioned_read(1, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"123");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn rename_link_delete() {
        let dir = tmp();
        let fs = HostFs::new();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");

        crate::util::write_vec_to_file(&fs, &a, b"x", false).unwrap();
        fs.rename_file(&a, &b).unwrap();
        assert!(!fs.file_exists(&a).unwrap());
        assert!(fs.file_exists(&b).unwrap());

        fs.link_file(&b, &c).unwrap();
        assert_eq!(crate::util::read_file_to_vec(&fs, &c).unwrap(), b"x");

        fs.delete_file(&b).unwrap();
        assert!(fs.delete_file(&b).unwrap_err().is_not_found());
        assert!(fs.file_exists(&c).unwrap());
    }

    #[test]
    fn missing_files_report_not_found() {
        let dir = tmp();
        let fs = HostFs::new();
        let missing = dir.path().join("nope");

        assert!(fs
            .new_random_access_file(&missing, FileOptions::default())
            .unwrap_err()
            .is_not_found());
        assert!(fs.file_size(&missing).unwrap_err().is_not_found());
        assert!(!fs.file_exists(&missing).unwrap());
    }

    #[test]
    fn directory_fsync() {
        let dir = tmp();
        let fs = HostFs::new();
        let mut handle = fs.new_directory(dir.path()).unwrap();
        handle.fsync().unwrap();
        handle.close().unwrap();
    }

    #[test]
    fn random_rw_roundtrip() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("rw.bin");

        let mut file = fs.new_random_rw_file(&path, FileOptions::default()).unwrap();
        file.write(4, b"BB").unwrap();
        file.write(0, b"AAAA").unwrap();
        file.sync().unwrap();

        let mut buf = [0u8; 6];
        assert_eq!(file.read(0, &mut buf).unwrap(), 6);
        assert_eq!(&buf, b"AAAABB");
        file.close().unwrap();
    }

    #[test]
    fn unique_id_is_stable_per_file() {
        let dir = tmp();
        let fs = HostFs::new();
        let path = dir.path().join("id.bin");
        crate::util::write_vec_to_file(&fs, &path, b"x", false).unwrap();

        let f1 = fs
            .new_random_access_file(&path, FileOptions::default())
            .unwrap();
        let f2 = fs
            .new_random_access_file(&path, FileOptions::default())
            .unwrap();
        assert_eq!(f1.unique_id(), f2.unique_id());
        assert!(f1.unique_id().is_some());
    }
}
