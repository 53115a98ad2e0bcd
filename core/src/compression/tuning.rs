//! compression/tuning.rs
//! Best-effort worker-count injection into a libzstd streaming encoder.
//!
//! The `zstd` stream encoder has no constructor argument for worker threads;
//! the count is pushed into the compression context as a raw
//! `ZSTD_c_nbWorkers` parameter after construction. Everything here runs
//! behind its own fault boundary: a failure leaves the encoder untouched and
//! single-threaded, and nothing escapes to the caller.
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;
use zstd::stream::write::Encoder;
use zstd_safe::CParameter;

use crate::compression::constants::MIN_NATIVE_MT_VERSION;

#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("libzstd {found} predates worker support")]
    UnsupportedVersion { found: u32 },

    #[error("libzstd rejected nbWorkers={workers}: {msg}")]
    Rejected { workers: u32, msg: String },

    #[error("worker injection panicked")]
    Panicked,
}

/// Result of an injection attempt; only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningOutcome {
    Applied(u32),
    SingleThreaded,
}

/// Apply `workers` to `encoder`, degrading to single-threaded on any fault.
pub fn inject_workers<W: Write>(encoder: &mut Encoder<'static, W>, workers: usize) -> TuningOutcome {
    let workers = u32::try_from(workers).unwrap_or(u32::MAX);
    match try_inject(encoder, workers) {
        Ok(()) => {
            debug!(workers, "zstd workers set");
            TuningOutcome::Applied(workers)
        }
        Err(e) => {
            debug!(workers, error = %e, "zstd worker injection failed, using single-threaded mode");
            TuningOutcome::SingleThreaded
        }
    }
}

fn try_inject<W: Write>(encoder: &mut Encoder<'static, W>, workers: u32) -> Result<(), TuningError> {
    let found = zstd_safe::version_number();
    if found < MIN_NATIVE_MT_VERSION {
        return Err(TuningError::UnsupportedVersion { found });
    }

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        encoder.set_parameter(CParameter::NbWorkers(workers))
    }));

    match attempt {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TuningError::Rejected { workers, msg: e.to_string() }),
        Err(_) => Err(TuningError::Panicked),
    }
}
