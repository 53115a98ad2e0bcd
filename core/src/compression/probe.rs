//! compression/probe.rs
//! Runtime check that libzstd actually works in this process.
//!
//! The probe does not cache; the selector memoizes its verdict.
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

/// Round-trips a tiny payload through libzstd. Every fault, panics included,
/// becomes `false`.
pub fn probe_native() -> bool {
    match panic::catch_unwind(AssertUnwindSafe(native_round_trip)) {
        Ok(Ok(ok)) => ok,
        Ok(Err(e)) => {
            debug!(error = %e, "native zstd probe failed");
            false
        }
        Err(_) => {
            debug!("native zstd probe panicked");
            false
        }
    }
}

#[cfg(feature = "native")]
fn native_round_trip() -> std::io::Result<bool> {
    use crate::compression::constants::PROBE_PAYLOAD;

    let compressed = zstd::bulk::compress(PROBE_PAYLOAD, 1)?;
    let restored = zstd::bulk::decompress(&compressed, PROBE_PAYLOAD.len())?;
    Ok(restored == PROBE_PAYLOAD)
}

#[cfg(not(feature = "native"))]
fn native_round_trip() -> std::io::Result<bool> {
    Ok(false)
}
