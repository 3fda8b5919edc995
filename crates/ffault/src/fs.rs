//! The fault-injection filesystem facade.
//!
//! [`FaultFs`] wraps any [`FsBackend`] and hands out wrapped handles that
//! buffer unsynced writes, inject programmed errors, and report durability
//! events back here. The facade owns the global bookkeeping (which file
//! states are known, which files appeared since each directory's last
//! fsync) and offers the crash-simulation entry points built on it.
//!
//! Wrappers hold a non-owning `Arc` reference to the shared state; the
//! facade never owns the wrappers and must outlive them only in the sense
//! that the `Arc` keeps the shared state alive.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use ffault_error::{FaultError, Result};
use ffault_vfs::{
    read_file_to_vec, write_vec_to_file, FileOptions, FsBackend, IoHandle,
};

use crate::checksum::ChecksumKind;
use crate::dir::FaultDirectory;
use crate::filename::{try_parse_file_name, FileType};
use crate::inject::{self, one_in, read_error_decision, ErrorOperation, ReadFault};
use crate::path::{dir_and_name, trim_dirname};
use crate::read::{FaultRandomAccessFile, FaultSequentialFile};
use crate::state::FileState;
use crate::writable::{FaultRandomRwFile, FaultWritableFile, RandomRwHandle, WritableHandle};

/// What to restore for a file created (or overwritten) since its
/// directory's last fsync, when a crash is simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreservedContents {
    /// Newly created; a crash simply deletes it.
    New,
    /// Bytes that existed at the destination before a rename or link
    /// overwrote it. Only captured for files under 1 KiB.
    Bytes(Vec<u8>),
}

/// Size threshold for preserving overwritten rename targets.
const PRESERVE_CONTENTS_LIMIT: u64 = 1024;

#[derive(Debug)]
struct FaultInner {
    active: bool,
    /// The sticky error returned while inactive and by write-error
    /// injection. Replaced by `set_random_write_error`.
    error: FaultError,

    db_file_state: BTreeMap<PathBuf, FileState>,
    dir_to_new_files_since_last_sync: BTreeMap<PathBuf, BTreeMap<String, PreservedContents>>,
    open_managed_files: HashSet<PathBuf>,

    enable_write_error_injection: bool,
    write_error_one_in: u32,
    write_error_allowed_types: Vec<FileType>,
    inject_for_all_file_types: bool,
    write_error_rand: StdRng,

    enable_metadata_write_error_injection: bool,
    metadata_write_error_one_in: u32,

    ingest_data_corruption_before_write: bool,
    checksum_handoff_kind: ChecksumKind,
}

impl Default for FaultInner {
    fn default() -> Self {
        Self {
            active: true,
            error: FaultError::corruption("filesystem is not active"),
            db_file_state: BTreeMap::new(),
            dir_to_new_files_since_last_sync: BTreeMap::new(),
            open_managed_files: HashSet::new(),
            enable_write_error_injection: false,
            write_error_one_in: 0,
            write_error_allowed_types: Vec::new(),
            inject_for_all_file_types: false,
            write_error_rand: StdRng::seed_from_u64(0),
            enable_metadata_write_error_injection: false,
            metadata_write_error_one_in: 0,
            ingest_data_corruption_before_write: false,
            checksum_handoff_kind: ChecksumKind::None,
        }
    }
}

/// Injection state shared between the facade and every wrapper it issues.
#[derive(Debug)]
pub(crate) struct FaultShared {
    inner: Mutex<FaultInner>,
    read_error_one_in: AtomicU32,
    fail_unique_id: AtomicBool,
    filesystem_writable: AtomicBool,
}

impl FaultShared {
    fn new() -> Self {
        Self {
            inner: Mutex::new(FaultInner::default()),
            read_error_one_in: AtomicU32::new(0),
            fail_unique_id: AtomicBool::new(false),
            filesystem_writable: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FaultInner> {
        self.inner.lock().expect("fault fs state lock poisoned")
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lock().active
    }

    pub(crate) fn get_error(&self) -> FaultError {
        self.lock().error.clone()
    }

    /// Return the sticky error when the filesystem is inactive.
    pub(crate) fn gate(&self) -> Result<()> {
        let inner = self.lock();
        if inner.active {
            Ok(())
        } else {
            Err(inner.error.clone())
        }
    }

    pub(crate) fn should_corrupt_before_write(&self) -> bool {
        self.lock().ingest_data_corruption_before_write
    }

    pub(crate) fn checksum_kind(&self) -> ChecksumKind {
        self.lock().checksum_handoff_kind
    }

    pub(crate) fn should_inject_random_read_error(&self) -> bool {
        let rate = self.read_error_one_in.load(Ordering::Relaxed);
        rate != 0 && inject::util_one_in(rate)
    }

    pub(crate) fn should_fail_unique_id(&self) -> bool {
        self.fail_unique_id.load(Ordering::Relaxed)
    }

    /// Consult the write-error program for an append to `filename`.
    pub(crate) fn inject_write_error(&self, filename: &Path) -> Result<()> {
        let mut inner = self.lock();
        if !inner.enable_write_error_injection || inner.write_error_one_in == 0 {
            return Ok(());
        }
        let allowed = if inner.inject_for_all_file_types {
            true
        } else {
            try_parse_file_name(&filename.to_string_lossy())
                .is_some_and(|(_, file_type)| {
                    inner.write_error_allowed_types.contains(&file_type)
                })
        };
        let write_error_one_in = inner.write_error_one_in;
        if allowed && one_in(&mut inner.write_error_rand, write_error_one_in) {
            debug!(file = %filename.display(), "write error injected");
            return Err(inner.error.clone());
        }
        Ok(())
    }

    /// Consult the metadata-write-error program.
    pub(crate) fn inject_metadata_write_error(&self) -> Result<()> {
        {
            let mut inner = self.lock();
            let metadata_write_error_one_in = inner.metadata_write_error_one_in;
            if !inner.enable_metadata_write_error_injection
                || metadata_write_error_one_in == 0
                || !one_in(&mut inner.write_error_rand, metadata_write_error_one_in)
            {
                return Ok(());
            }
        }
        debug!("metadata write error injected");
        Err(FaultError::io("injected metadata write error"))
    }

    pub(crate) fn writable_file_appended(&self, state: &FileState) {
        let mut inner = self.lock();
        if inner.open_managed_files.contains(&state.filename) {
            inner
                .db_file_state
                .insert(state.filename.clone(), state.clone());
        }
    }

    pub(crate) fn writable_file_synced(&self, state: &FileState) {
        let mut inner = self.lock();
        if inner.open_managed_files.contains(&state.filename) {
            inner
                .db_file_state
                .insert(state.filename.clone(), state.clone());
        }
    }

    pub(crate) fn writable_file_closed(&self, state: &FileState) {
        let mut inner = self.lock();
        if inner.open_managed_files.contains(&state.filename) {
            inner
                .db_file_state
                .insert(state.filename.clone(), state.clone());
            inner.open_managed_files.remove(&state.filename);
        }
    }

    /// A directory fsync was observed: its new-file ledger entry is gone.
    pub(crate) fn sync_dir(&self, dirname: &str) {
        debug!(dir = dirname, "directory synced, pruning new-file ledger");
        self.lock()
            .dir_to_new_files_since_last_sync
            .remove(Path::new(dirname));
    }

    /// Forget everything known about `path`.
    fn untrack(&self, path: &Path) {
        let mut inner = self.lock();
        let lossy = path.to_string_lossy();
        let (dir, name) = dir_and_name(&lossy);
        if let Some(files) = inner
            .dir_to_new_files_since_last_sync
            .get_mut(Path::new(dir))
        {
            files.remove(name);
        }
        inner.db_file_state.remove(path);
        inner.open_managed_files.remove(path);
    }

    /// Record `path` as newly created in its directory's ledger and mark
    /// it open-managed.
    fn track_new_file(&self, path: &Path) {
        let mut inner = self.lock();
        inner.open_managed_files.insert(path.to_path_buf());
        let lossy = path.to_string_lossy();
        let (dir, name) = dir_and_name(&lossy);
        inner
            .dir_to_new_files_since_last_sync
            .entry(PathBuf::from(dir))
            .or_default()
            .insert(name.to_string(), PreservedContents::New);
    }
}

/// A filesystem that wraps `B` and injects faults on a programmable
/// schedule, transparently to the storage engine above it.
///
/// `FaultFs` implements [`FsBackend`] itself, so it drops in wherever the
/// engine expects a filesystem.
pub struct FaultFs<B: FsBackend> {
    target: B,
    shared: Arc<FaultShared>,
}

impl<B: FsBackend> FaultFs<B> {
    /// Wrap a backend. The filesystem starts active with no injection
    /// programmed.
    pub fn new(target: B) -> Self {
        Self {
            target,
            shared: Arc::new(FaultShared::new()),
        }
    }

    /// The wrapped backend.
    pub fn target(&self) -> &B {
        &self.target
    }

    fn should_use_direct_writable(&self, _path: &Path) -> bool {
        self.shared.filesystem_writable.load(Ordering::Relaxed)
    }

    // --- activation -----------------------------------------------------

    /// Open or close the active gate, keeping the current sticky error.
    pub fn set_filesystem_active(&self, active: bool) {
        info!(active, "filesystem active flag set");
        self.shared.lock().active = active;
    }

    /// Close (or open) the active gate; when deactivating, `error` becomes
    /// the sticky error every gated operation returns.
    pub fn set_filesystem_active_with_error(&self, active: bool, error: FaultError) {
        info!(active, %error, "filesystem active flag set");
        let mut inner = self.shared.lock();
        inner.active = active;
        if !active {
            inner.error = error;
        }
    }

    /// The current sticky error.
    pub fn get_error(&self) -> FaultError {
        self.shared.get_error()
    }

    /// When set, writable and random-rw opens bypass the fault layer and
    /// return raw backend handles.
    pub fn set_filesystem_direct_writable(&self, writable: bool) {
        info!(writable, "direct-writable bypass set");
        self.shared
            .filesystem_writable
            .store(writable, Ordering::Relaxed);
    }

    // --- write-error program --------------------------------------------

    /// Program write-error injection: a seeded RNG firing one-in-`one_in`
    /// appends to files whose type is in `allowed_types` (or any file when
    /// `inject_for_all_file_types`). `error` becomes the sticky error and
    /// is what injection returns. Takes effect once
    /// [`enable_write_error_injection`](Self::enable_write_error_injection)
    /// is called.
    pub fn set_random_write_error(
        &self,
        seed: u64,
        one_in: u32,
        error: FaultError,
        inject_for_all_file_types: bool,
        allowed_types: Vec<FileType>,
    ) {
        info!(
            seed,
            one_in,
            inject_for_all_file_types,
            ?allowed_types,
            "write-error program set"
        );
        let mut inner = self.shared.lock();
        inner.write_error_rand = StdRng::seed_from_u64(seed);
        inner.write_error_one_in = one_in;
        inner.error = error;
        inner.inject_for_all_file_types = inject_for_all_file_types;
        inner.write_error_allowed_types = allowed_types;
    }

    /// Arm the write-error program.
    pub fn enable_write_error_injection(&self) {
        info!("write-error injection enabled");
        self.shared.lock().enable_write_error_injection = true;
    }

    /// Disarm the write-error program.
    pub fn disable_write_error_injection(&self) {
        info!("write-error injection disabled");
        self.shared.lock().enable_write_error_injection = false;
    }

    // --- metadata-error program -----------------------------------------

    /// Set the one-in rate for metadata-write-error injection.
    pub fn set_random_metadata_write_error(&self, one_in: u32) {
        info!(one_in, "metadata-write-error rate set");
        self.shared.lock().metadata_write_error_one_in = one_in;
    }

    /// Arm metadata-write-error injection.
    pub fn enable_metadata_write_error_injection(&self) {
        info!("metadata-write-error injection enabled");
        self.shared.lock().enable_metadata_write_error_injection = true;
    }

    /// Disarm metadata-write-error injection.
    pub fn disable_metadata_write_error_injection(&self) {
        info!("metadata-write-error injection disabled");
        self.shared.lock().enable_metadata_write_error_injection = false;
    }

    // --- read-error programs --------------------------------------------

    /// Set the one-in rate for the random-read-error toggle. Zero
    /// disables it.
    pub fn set_random_read_error(&self, one_in: u32) {
        info!(one_in, "random-read-error rate set");
        self.shared
            .read_error_one_in
            .store(one_in, Ordering::Relaxed);
    }

    /// Install the calling thread's read-error program.
    pub fn set_thread_local_read_error_context(&self, seed: u64, one_in: u32) {
        inject::set_thread_local_read_error_context(seed, one_in);
    }

    /// Stop read-error injection on the calling thread.
    pub fn disable_thread_local_read_error_injection(&self) {
        inject::disable_thread_local_read_error_injection();
    }

    /// Injection count of the calling thread's context.
    pub fn thread_read_error_count(&self) -> u64 {
        inject::thread_read_error_count()
    }

    /// Accumulated injection message of the calling thread's context.
    pub fn thread_read_error_message(&self) -> String {
        inject::thread_read_error_message()
    }

    /// Log the calling thread's last injection (type, message, call
    /// stack). No-op without backtrace support.
    pub fn print_fault_backtrace(&self) {
        inject::print_fault_backtrace();
    }

    // --- toggles --------------------------------------------------------

    /// When set, every verified append fails with `Corruption` before any
    /// byte is buffered.
    pub fn set_data_corruption_before_write(&self, corrupt: bool) {
        info!(corrupt, "data-corruption-before-write set");
        self.shared.lock().ingest_data_corruption_before_write = corrupt;
    }

    /// Checksum type that verified appends are checked against.
    pub fn set_checksum_handoff_kind(&self, kind: ChecksumKind) {
        info!(?kind, "checksum handoff kind set");
        self.shared.lock().checksum_handoff_kind = kind;
    }

    /// When set, `unique_id` reports no identity.
    pub fn set_fail_get_unique_id(&self, fail: bool) {
        info!(fail, "fail-get-unique-id set");
        self.shared.fail_unique_id.store(fail, Ordering::Relaxed);
    }

    // --- crash simulation -----------------------------------------------

    /// Drop every tracked file's unsynced buffer, as a crash would.
    pub fn drop_unsynced_file_data(&self) -> Result<()> {
        info!("dropping unsynced file data");
        let mut inner = self.shared.lock();
        for state in inner.db_file_state.values_mut() {
            if !state.is_fully_synced() {
                state.drop_unsynced_data();
            }
        }
        Ok(())
    }

    /// Truncate every tracked file's unsynced buffer to a random prefix,
    /// deterministically under `seed`.
    pub fn drop_random_unsynced_file_data(&self, seed: u64) -> Result<()> {
        info!(seed, "dropping random unsynced file data");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut inner = self.shared.lock();
        for state in inner.db_file_state.values_mut() {
            if !state.is_fully_synced() {
                state.drop_random_unsynced_data(&mut rng);
            }
        }
        Ok(())
    }

    /// Delete (or restore the prior contents of) every file created since
    /// its directory's last fsync. Returns the first error encountered.
    pub fn delete_files_created_after_last_dir_sync(&self) -> Result<()> {
        info!("deleting files created after last dir sync");
        // DeleteFile takes the state lock; work from a snapshot.
        let snapshot: Vec<(PathBuf, String, PreservedContents)> = {
            let inner = self.shared.lock();
            inner
                .dir_to_new_files_since_last_sync
                .iter()
                .flat_map(|(dir, files)| {
                    files
                        .iter()
                        .map(|(name, pc)| (dir.clone(), name.clone(), pc.clone()))
                })
                .collect()
        };
        for (dir, name, preserved) in snapshot {
            let path = dir.join(&name);
            match preserved {
                PreservedContents::New => FsBackend::delete_file(self, &path)?,
                PreservedContents::Bytes(bytes) => {
                    write_vec_to_file(&self.target, &path, &bytes, true)?;
                }
            }
        }
        Ok(())
    }

    /// Clear all bookkeeping and re-open the active gate. Idempotent.
    pub fn reset_state(&self) {
        info!("fault filesystem state reset");
        let mut inner = self.shared.lock();
        inner.db_file_state.clear();
        inner.dir_to_new_files_since_last_sync.clear();
        inner.active = true;
    }

    // --- diagnostics ----------------------------------------------------

    /// The last recorded durability state for `path`, if tracked.
    pub fn tracked_file_state(&self, path: &Path) -> Option<FileState> {
        self.shared.lock().db_file_state.get(path).cloned()
    }
}

impl<B: FsBackend> FsBackend for FaultFs<B> {
    type Writable = WritableHandle<B::Writable>;
    type RandomAccess = FaultRandomAccessFile<B::RandomAccess>;
    type RandomRw = RandomRwHandle<B::RandomRw>;
    type Sequential = FaultSequentialFile<B::Sequential>;
    type Dir = FaultDirectory<B::Dir>;

    fn new_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;
        if self.should_use_direct_writable(path) {
            return self
                .target
                .new_writable_file(path, opts)
                .map(WritableHandle::Direct);
        }
        let inner = self.target.new_writable_file(path, opts)?;
        // The file is truncated on creation, so any saved state is stale.
        self.shared.untrack(path);
        self.shared.track_new_file(path);
        self.shared.inject_metadata_write_error()?;
        Ok(WritableHandle::Fault(FaultWritableFile::new(
            path.to_path_buf(),
            inner,
            Arc::clone(&self.shared),
        )))
    }

    fn reopen_writable_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Writable> {
        self.shared.gate()?;
        if self.should_use_direct_writable(path) {
            return self
                .target
                .reopen_writable_file(path, opts)
                .map(WritableHandle::Direct);
        }
        self.shared.inject_metadata_write_error()?;

        let exists = match self.target.file_exists(path) {
            Ok(exists) => exists,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        let inner = self.target.reopen_writable_file(path, opts)?;

        // Only track files this filesystem created. Files that appeared
        // outside of it may hold data a previous run expects to recover,
        // so they are not eligible for dropping.
        let should_track = {
            let known = self.shared.lock().db_file_state.contains_key(path);
            if known {
                debug_assert!(exists);
                true
            } else if !exists {
                self.shared.track_new_file(path);
                true
            } else {
                false
            }
        };
        self.shared.inject_metadata_write_error()?;

        if should_track {
            Ok(WritableHandle::Fault(FaultWritableFile::new(
                path.to_path_buf(),
                inner,
                Arc::clone(&self.shared),
            )))
        } else {
            Ok(WritableHandle::Direct(inner))
        }
    }

    fn new_random_access_file(
        &self,
        path: &Path,
        opts: FileOptions,
    ) -> Result<Self::RandomAccess> {
        self.shared.gate()?;
        if self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected error when open random access file"));
        }
        if read_error_decision(ErrorOperation::Open, false, false, true) != ReadFault::None {
            return Err(FaultError::io("injected thread-local read error"));
        }
        let inner = self.target.new_random_access_file(path, opts)?;
        Ok(FaultRandomAccessFile::new(inner, Arc::clone(&self.shared)))
    }

    fn new_random_rw_file(&self, path: &Path, opts: FileOptions) -> Result<Self::RandomRw> {
        self.shared.gate()?;
        if self.should_use_direct_writable(path) {
            return self
                .target
                .new_random_rw_file(path, opts)
                .map(RandomRwHandle::Direct);
        }
        self.shared.inject_metadata_write_error()?;
        let inner = self.target.new_random_rw_file(path, opts)?;
        // Reopening truncates our model of the file; forget saved state.
        self.shared.untrack(path);
        self.shared.track_new_file(path);
        self.shared.inject_metadata_write_error()?;
        Ok(RandomRwHandle::Fault(FaultRandomRwFile::new(
            inner,
            Arc::clone(&self.shared),
        )))
    }

    fn new_sequential_file(&self, path: &Path, opts: FileOptions) -> Result<Self::Sequential> {
        self.shared.gate()?;
        if self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected read error when creating seq file"));
        }
        if read_error_decision(ErrorOperation::Open, false, false, true) != ReadFault::None {
            return Err(FaultError::io("injected thread-local read error"));
        }
        let inner = self.target.new_sequential_file(path, opts)?;
        Ok(FaultSequentialFile::new(inner, Arc::clone(&self.shared)))
    }

    fn new_directory(&self, path: &Path) -> Result<Self::Dir> {
        let inner = self.target.new_directory(path)?;
        let trimmed = trim_dirname(&path.to_string_lossy()).to_string();
        Ok(FaultDirectory::new(
            inner,
            trimmed,
            Arc::clone(&self.shared),
        ))
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;
        self.target.delete_file(path)?;
        self.shared.untrack(path);
        self.shared.inject_metadata_write_error()?;
        Ok(())
    }

    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;

        // Preserve the destination's contents up to a size threshold so a
        // simulated crash can put them back. I/O errors here degrade to
        // the no-prior-contents case.
        let mut previous_contents = PreservedContents::New;
        if self.target.file_exists(dst).unwrap_or(false) {
            if let Ok(size) = self.target.file_size(dst) {
                if size < PRESERVE_CONTENTS_LIMIT {
                    if let Ok(bytes) = read_file_to_vec(&self.target, dst) {
                        previous_contents = PreservedContents::Bytes(bytes);
                    }
                }
            }
        }

        self.target.rename_file(src, dst)?;

        {
            let mut inner = self.shared.lock();
            if let Some(state) = inner.db_file_state.remove(src) {
                inner.db_file_state.insert(dst.to_path_buf(), state);
            }

            let src_lossy = src.to_string_lossy();
            let (src_dir, src_name) = dir_and_name(&src_lossy);
            let dst_lossy = dst.to_string_lossy();
            let (dst_dir, dst_name) = dir_and_name(&dst_lossy);

            let was_new = inner
                .dir_to_new_files_since_last_sync
                .get_mut(Path::new(src_dir))
                .is_some_and(|files| files.remove(src_name).is_some());
            if was_new {
                let dst_files = inner
                    .dir_to_new_files_since_last_sync
                    .entry(PathBuf::from(dst_dir))
                    .or_default();
                debug_assert!(!dst_files.contains_key(dst_name));
                dst_files.insert(dst_name.to_string(), previous_contents);
            }
        }

        self.shared.inject_metadata_write_error()?;
        Ok(())
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;

        self.target.link_file(src, dst)?;

        {
            let mut inner = self.shared.lock();
            if let Some(state) = inner.db_file_state.get(src).cloned() {
                inner.db_file_state.insert(dst.to_path_buf(), state);
            }

            let src_lossy = src.to_string_lossy();
            let (src_dir, src_name) = dir_and_name(&src_lossy);
            let dst_lossy = dst.to_string_lossy();
            let (dst_dir, dst_name) = dir_and_name(&dst_lossy);

            let src_was_new = inner
                .dir_to_new_files_since_last_sync
                .get(Path::new(src_dir))
                .is_some_and(|files| files.contains_key(src_name));
            if src_was_new {
                let dst_files = inner
                    .dir_to_new_files_since_last_sync
                    .entry(PathBuf::from(dst_dir))
                    .or_default();
                debug_assert!(!dst_files.contains_key(dst_name));
                dst_files.insert(dst_name.to_string(), PreservedContents::New);
            }
        }

        self.shared.inject_metadata_write_error()?;
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> Result<bool> {
        self.target.file_exists(path)
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        self.target.file_size(path)
    }

    fn poll(&self, handles: &mut Vec<IoHandle>, min_completions: usize) -> Result<()> {
        self.target.poll(handles, min_completions)
    }

    fn abort_io(&self, handles: &mut Vec<IoHandle>) -> Result<()> {
        self.target.abort_io(handles)
    }
}
