//! Directory handle wrapper.

use std::sync::Arc;

use ffault_error::Result;
use ffault_vfs::{DirFsyncOptions, Directory};

use crate::fs::FaultShared;

/// A directory whose fsync prunes the "new files since last sync" ledger.
///
/// Carries the trimmed directory name that keys the ledger.
pub struct FaultDirectory<D: Directory> {
    target: D,
    dirname: String,
    shared: Arc<FaultShared>,
}

impl<D: Directory> FaultDirectory<D> {
    pub(crate) fn new(target: D, dirname: String, shared: Arc<FaultShared>) -> Self {
        Self {
            target,
            dirname,
            shared,
        }
    }

    /// The trimmed directory name this handle stands for.
    pub fn dirname(&self) -> &str {
        &self.dirname
    }
}

impl<D: Directory> Directory for FaultDirectory<D> {
    fn fsync(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;
        self.shared.sync_dir(&self.dirname);
        self.target.fsync()?;
        self.shared.inject_metadata_write_error()
    }

    fn fsync_with_options(&mut self, opts: DirFsyncOptions) -> Result<()> {
        self.shared.gate()?;
        self.shared.inject_metadata_write_error()?;
        self.shared.sync_dir(&self.dirname);
        self.target.fsync_with_options(opts)?;
        self.shared.inject_metadata_write_error()
    }

    fn close(&mut self) -> Result<()> {
        self.shared.gate()?;
        self.target.close()
    }
}
