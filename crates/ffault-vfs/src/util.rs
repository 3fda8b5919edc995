//! Whole-file helpers generic over any backend.

use std::path::Path;

use ffault_error::Result;

use crate::traits::{FileOptions, FsBackend, SequentialFile, WritableFile};

/// Read the entire file at `path` into a vector.
pub fn read_file_to_vec<B: FsBackend>(fs: &B, path: &Path) -> Result<Vec<u8>> {
    let mut file = fs.new_sequential_file(path, FileOptions::default())?;
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Write `data` to `path`, replacing any existing contents. Syncs before
/// closing when `should_sync` is set.
pub fn write_vec_to_file<B: FsBackend>(
    fs: &B,
    path: &Path,
    data: &[u8],
    should_sync: bool,
) -> Result<()> {
    let mut file = fs.new_writable_file(path, FileOptions::default())?;
    file.append(data)?;
    if should_sync {
        file.sync()?;
    }
    file.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemFs;

    #[test]
    fn roundtrip() {
        let fs = MemFs::new();
        let path = Path::new("/f");
        write_vec_to_file(&fs, path, b"contents", true).unwrap();
        assert_eq!(read_file_to_vec(&fs, path).unwrap(), b"contents");
    }

    #[test]
    fn write_replaces() {
        let fs = MemFs::new();
        let path = Path::new("/f");
        write_vec_to_file(&fs, path, b"long old contents", false).unwrap();
        write_vec_to_file(&fs, path, b"new", false).unwrap();
        assert_eq!(read_file_to_vec(&fs, path).unwrap(), b"new");
    }

    #[test]
    fn read_missing_is_not_found() {
        let fs = MemFs::new();
        assert!(read_file_to_vec(&fs, Path::new("/nope"))
            .unwrap_err()
            .is_not_found());
    }
}
