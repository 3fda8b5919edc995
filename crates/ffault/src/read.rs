//! Read-path handle wrappers.

use std::sync::Arc;

use ffault_error::{FaultError, Result};
use ffault_vfs::{RandomAccessFile, ReadCallback, ReadRequest, SequentialFile};

use crate::fs::FaultShared;
use crate::inject::{read_error_decision, ErrorOperation, ReadFault};

/// Random-access reads behind the active gate, the thread-local error
/// program, and the random-read toggle.
#[derive(Debug)]
pub struct FaultRandomAccessFile<R: RandomAccessFile> {
    target: R,
    shared: Arc<FaultShared>,
}

impl<R: RandomAccessFile> FaultRandomAccessFile<R> {
    pub(crate) fn new(target: R, shared: Arc<FaultShared>) -> Self {
        Self { target, shared }
    }
}

impl<R: RandomAccessFile> RandomAccessFile for FaultRandomAccessFile<R> {
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.shared.gate()?;
        let mut n = self.target.read(offset, buf)?;
        match read_error_decision(
            ErrorOperation::Read,
            self.target.use_direct_io(),
            n > 0,
            true,
        ) {
            ReadFault::None => {}
            ReadFault::Error => {
                return Err(FaultError::io("injected thread-local read error"));
            }
            ReadFault::EmptyResult => n = 0,
            ReadFault::CorruptLastByte => {
                if let Some(last) = buf[..n].last_mut() {
                    *last = last.wrapping_add(1);
                }
            }
        }
        if self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected read error"));
        }
        Ok(n)
    }

    fn multi_read(&self, reqs: &mut [ReadRequest]) -> Result<()> {
        self.shared.gate()?;
        let batch = self.target.multi_read(reqs);
        let mut injected = false;
        for req in reqs.iter_mut() {
            if req.status.is_err() {
                // Already seeing an error.
                break;
            }
            match read_error_decision(
                ErrorOperation::MultiReadSingleReq,
                self.target.use_direct_io(),
                !req.result.is_empty(),
                true,
            ) {
                ReadFault::None => {}
                ReadFault::Error => {
                    req.status = Err(FaultError::io("injected thread-local read error"));
                    injected = true;
                }
                ReadFault::EmptyResult => {
                    req.result.clear();
                    injected = true;
                }
                ReadFault::CorruptLastByte => {
                    if let Some(last) = req.result.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                    injected = true;
                }
            }
        }
        let mut status = batch;
        if status.is_ok() {
            if let ReadFault::Error = read_error_decision(
                ErrorOperation::MultiRead,
                self.target.use_direct_io(),
                false,
                !injected,
            ) {
                status = Err(FaultError::io("injected thread-local read error"));
            }
        }
        if status.is_ok() && self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected read error"));
        }
        status
    }

    fn read_async(&self, req: ReadRequest, cb: ReadCallback) -> Result<()> {
        let precheck: Result<()> = if !self.shared.is_active() {
            Err(self.shared.get_error())
        } else {
            match read_error_decision(
                ErrorOperation::Read,
                self.target.use_direct_io(),
                false,
                true,
            ) {
                ReadFault::None => Ok(()),
                _ => Err(FaultError::io("injected thread-local read error")),
            }
        };
        let precheck = precheck.and_then(|()| {
            if self.shared.should_inject_random_read_error() {
                Err(FaultError::io("Injected read error"))
            } else {
                Ok(())
            }
        });
        match precheck {
            Ok(()) => self.target.read_async(req, cb),
            Err(e) => {
                // Synthesize a completed request carrying the injected
                // status and deliver it inline.
                let mut res = ReadRequest::new(req.offset, req.len);
                res.status = Err(e);
                cb(res);
                Ok(())
            }
        }
    }

    fn unique_id(&self) -> Option<Vec<u8>> {
        if self.shared.should_fail_unique_id() {
            None
        } else {
            self.target.unique_id()
        }
    }

    fn use_direct_io(&self) -> bool {
        self.target.use_direct_io()
    }
}

/// Sequential reads with the random-read toggle applied after each
/// successful delegate.
#[derive(Debug)]
pub struct FaultSequentialFile<S: SequentialFile> {
    target: S,
    shared: Arc<FaultShared>,
}

impl<S: SequentialFile> FaultSequentialFile<S> {
    pub(crate) fn new(target: S, shared: Arc<FaultShared>) -> Self {
        Self { target, shared }
    }
}

impl<S: SequentialFile> SequentialFile for FaultSequentialFile<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.target.read(buf)?;
        if self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected seq read error"));
        }
        Ok(n)
    }

    fn positioned_read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let n = self.target.positioned_read(offset, buf)?;
        if self.shared.should_inject_random_read_error() {
            return Err(FaultError::io("Injected seq positioned read error"));
        }
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        self.target.skip(n)
    }
}
