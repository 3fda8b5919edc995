//! Thread-local read-error programs.
//!
//! Each thread can carry its own seeded error program; the read wrappers
//! consult it after every successful delegate. The context is explicit
//! TLS owned by the calling thread, never shared across threads. One
//! fault filesystem per process is assumed.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error};

/// Which intercepted operation is consulting the read-error injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOperation {
    /// Opening a file for reads.
    Open,
    /// A single read.
    Read,
    /// A batched read as a whole.
    MultiRead,
    /// One request inside a batched read.
    MultiReadSingleReq,
}

/// Outcome of one injector consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadFault {
    /// No injection this time.
    None,
    /// Fail the operation outright.
    Error,
    /// Report success with an empty result.
    EmptyResult,
    /// Report success but bump the last byte of the result, so an
    /// upstream checksum check fails.
    CorruptLastByte,
}

#[derive(Debug)]
struct ErrorContext {
    enabled: bool,
    one_in: u32,
    rng: StdRng,
    count: u64,
    message: String,
    backtrace: Option<Backtrace>,
    last_op: Option<ErrorOperation>,
}

thread_local! {
    static READ_ERROR_CTX: RefCell<Option<ErrorContext>> = const { RefCell::new(None) };

    // Unseeded utility RNG for the secondary outcome draws; the primary
    // one-in draw uses the context's seeded RNG.
    static UTIL_RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Bernoulli draw: true with probability `1/n`; never for `n == 0`.
pub(crate) fn one_in(rng: &mut StdRng, n: u32) -> bool {
    n != 0 && rng.gen_range(0..n) == 0
}

/// One-in draw on the calling thread's utility RNG.
pub(crate) fn util_one_in(n: u32) -> bool {
    if n == 0 {
        return false;
    }
    UTIL_RNG.with(|rng| rng.borrow_mut().gen_range(0..n) == 0)
}

/// Install (or reprogram) the calling thread's read-error context.
pub fn set_thread_local_read_error_context(seed: u64, one_in: u32) {
    READ_ERROR_CTX.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_mut() {
            Some(ctx) => {
                ctx.enabled = true;
                ctx.one_in = one_in;
                ctx.rng = StdRng::seed_from_u64(seed);
            }
            None => {
                *slot = Some(ErrorContext {
                    enabled: true,
                    one_in,
                    rng: StdRng::seed_from_u64(seed),
                    count: 0,
                    message: String::new(),
                    backtrace: None,
                    last_op: None,
                });
            }
        }
    });
    debug!(seed, one_in, "thread-local read-error context installed");
}

/// Stop injecting on the calling thread. The context (count, message)
/// is kept for inspection.
pub fn disable_thread_local_read_error_injection() {
    READ_ERROR_CTX.with(|cell| {
        if let Some(ctx) = cell.borrow_mut().as_mut() {
            ctx.enabled = false;
        }
    });
}

/// Number of injections recorded by the calling thread's context.
pub fn thread_read_error_count() -> u64 {
    READ_ERROR_CTX.with(|cell| cell.borrow().as_ref().map_or(0, |ctx| ctx.count))
}

/// Accumulated message of the calling thread's current injection burst.
pub fn thread_read_error_message() -> String {
    READ_ERROR_CTX.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or_else(String::new, |ctx| ctx.message.clone())
    })
}

/// Consult the calling thread's error program.
///
/// `has_scratch` is true when the read landed in a caller-owned buffer
/// that is safe to corrupt in place (a non-empty read).
pub(crate) fn read_error_decision(
    op: ErrorOperation,
    direct_io: bool,
    has_scratch: bool,
    need_count_increase: bool,
) -> ReadFault {
    READ_ERROR_CTX.with(|cell| {
        let mut slot = cell.borrow_mut();
        let Some(ctx) = slot.as_mut() else {
            return ReadFault::None;
        };
        if !ctx.enabled || ctx.one_in == 0 {
            return ReadFault::None;
        }
        if !one_in(&mut ctx.rng, ctx.one_in) {
            return ReadFault::None;
        }

        if ctx.count == 0 {
            ctx.message.clear();
        }
        if need_count_increase {
            ctx.count += 1;
        }
        ctx.backtrace = Some(Backtrace::force_capture());
        ctx.last_op = Some(op);

        let fault = if op != ErrorOperation::MultiReadSingleReq {
            ctx.message.push_str("error; ");
            ReadFault::Error
        } else if util_one_in(8) {
            // Small chance: succeed but hand back an empty result, which
            // the caller is supposed to catch.
            ctx.message.push_str("inject empty result; ");
            ReadFault::EmptyResult
        } else if !direct_io && util_one_in(7) && has_scratch {
            // Direct I/O reads extra bytes, so one flipped byte may not
            // break the checksum; skip corruption there. Only corrupt
            // data sitting in the caller's own buffer.
            ctx.message.push_str("corrupt last byte; ");
            ReadFault::CorruptLastByte
        } else {
            ctx.message.push_str("error result multiget single; ");
            ReadFault::Error
        };
        debug!(?op, ?fault, count = ctx.count, "read fault injected");
        fault
    })
}

/// Log the last injection observed by the calling thread: operation,
/// accumulated message, and the captured call stack. No-op when nothing
/// was injected or the platform cannot capture backtraces.
pub fn print_fault_backtrace() {
    READ_ERROR_CTX.with(|cell| {
        let slot = cell.borrow();
        let Some(ctx) = slot.as_ref() else {
            return;
        };
        let Some(bt) = ctx.backtrace.as_ref() else {
            return;
        };
        if bt.status() == BacktraceStatus::Unsupported {
            return;
        }
        error!(
            op = ?ctx.last_op,
            message = %ctx.message,
            backtrace = %bt,
            "last injected read fault"
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_ctx() {
        READ_ERROR_CTX.with(|cell| *cell.borrow_mut() = None);
    }

    #[test]
    fn no_context_means_no_injection() {
        clear_ctx();
        assert_eq!(
            read_error_decision(ErrorOperation::Read, false, true, true),
            ReadFault::None
        );
        assert_eq!(thread_read_error_count(), 0);
        assert!(thread_read_error_message().is_empty());
    }

    #[test]
    fn one_in_one_always_errors_for_plain_reads() {
        clear_ctx();
        set_thread_local_read_error_context(1234, 1);
        assert_eq!(
            read_error_decision(ErrorOperation::Read, false, true, true),
            ReadFault::Error
        );
        assert_eq!(thread_read_error_count(), 1);
        assert_eq!(thread_read_error_message(), "error; ");
        clear_ctx();
    }

    #[test]
    fn zero_rate_and_disabled_do_not_inject() {
        clear_ctx();
        set_thread_local_read_error_context(1, 0);
        assert_eq!(
            read_error_decision(ErrorOperation::Read, false, true, true),
            ReadFault::None
        );

        set_thread_local_read_error_context(1, 1);
        disable_thread_local_read_error_injection();
        assert_eq!(
            read_error_decision(ErrorOperation::Read, false, true, true),
            ReadFault::None
        );
        clear_ctx();
    }

    #[test]
    fn count_increases_only_when_asked() {
        clear_ctx();
        set_thread_local_read_error_context(9, 1);
        let _ = read_error_decision(ErrorOperation::MultiRead, false, false, false);
        assert_eq!(thread_read_error_count(), 0);
        let _ = read_error_decision(ErrorOperation::MultiRead, false, false, true);
        assert_eq!(thread_read_error_count(), 1);
        clear_ctx();
    }

    #[test]
    fn burst_message_accumulates() {
        clear_ctx();
        set_thread_local_read_error_context(5, 1);
        let _ = read_error_decision(ErrorOperation::Read, false, true, true);
        let _ = read_error_decision(ErrorOperation::Open, false, false, true);
        assert_eq!(thread_read_error_message(), "error; error; ");
        clear_ctx();
    }

    #[test]
    fn multiread_single_req_mixes_outcomes() {
        clear_ctx();
        set_thread_local_read_error_context(77, 1);
        let mut seen_empty = false;
        let mut seen_corrupt = false;
        let mut seen_error = false;
        for _ in 0..400 {
            match read_error_decision(ErrorOperation::MultiReadSingleReq, false, true, true) {
                ReadFault::EmptyResult => seen_empty = true,
                ReadFault::CorruptLastByte => seen_corrupt = true,
                ReadFault::Error => seen_error = true,
                ReadFault::None => panic!("one_in=1 must always inject"),
            }
        }
        assert!(seen_empty && seen_corrupt && seen_error);
        clear_ctx();
    }

    #[test]
    fn direct_io_never_corrupts() {
        clear_ctx();
        set_thread_local_read_error_context(78, 1);
        for _ in 0..200 {
            let fault =
                read_error_decision(ErrorOperation::MultiReadSingleReq, true, true, true);
            assert_ne!(fault, ReadFault::CorruptLastByte);
        }
        clear_ctx();
    }

    #[test]
    fn seeded_primary_draw_is_reproducible() {
        clear_ctx();
        let run = || {
            set_thread_local_read_error_context(42, 3);
            let mut outcomes = Vec::new();
            for _ in 0..64 {
                outcomes
                    .push(read_error_decision(ErrorOperation::Read, false, true, false) != ReadFault::None);
            }
            outcomes
        };
        let first = run();
        clear_ctx();
        let second = run();
        assert_eq!(first, second);
        clear_ctx();
    }

    #[test]
    fn print_backtrace_without_context_is_noop() {
        clear_ctx();
        print_fault_backtrace();
        set_thread_local_read_error_context(1, 1);
        let _ = read_error_decision(ErrorOperation::Read, false, true, true);
        print_fault_backtrace();
        clear_ctx();
    }
}
