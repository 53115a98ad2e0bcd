//! compression/codecs/native.rs
//!
//! libzstd-backed backend via the `zstd` crate.
//!
//! Design notes:
//! - Availability is decided once by the capability probe and stored.
//! - Level 0 selects libzstd's default; explicit levels are `1..=22`.
//! - Worker count injection is delegated to `compression::tuning` and can
//!   never fail writer construction.
//! - Built without the `native` feature, the backend is permanently unavailable.
use std::io::{Read, Write};

#[cfg(feature = "native")]
use std::io::{self, BufReader};

#[cfg(feature = "native")]
use tracing::debug;

use crate::compression::probe::probe_native;
use crate::compression::stream::{ZstdReader, ZstdWriter};
use crate::compression::types::{CompressionError, ZstdCodec};

#[cfg(feature = "native")]
use crate::compression::constants::{NATIVE_MAX_LEVEL, NATIVE_MIN_LEVEL};
#[cfg(feature = "native")]
use crate::compression::stream::{DecoderKind, EncoderKind};
#[cfg(feature = "native")]
use crate::compression::types::check_level;
#[cfg(feature = "native")]
use crate::compression::tuning::{inject_workers, TuningOutcome};
#[cfg(feature = "native")]
use crate::parallelism::optimal_worker_count;

/// Native backend. Usable only when the probe succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBackend {
    available: bool,
    workers: Option<usize>,
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend {
    /// Probe libzstd and build the backend accordingly.
    pub fn new() -> Self {
        Self::from_probe(probe_native())
    }

    /// Backend that reports itself unavailable without probing.
    pub fn disabled() -> Self {
        Self { available: false, workers: None }
    }

    pub(crate) fn from_probe(available: bool) -> Self {
        Self {
            available: available && cfg!(feature = "native"),
            workers: None,
        }
    }

    /// Fix the injected worker count instead of consulting the heuristic.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }
}

#[cfg(feature = "native")]
impl ZstdCodec for NativeBackend {
    fn new_writer<W: Write + Send>(&self, sink: W, level: i32) -> Result<ZstdWriter<W>, CompressionError> {
        if !self.available {
            return Err(CompressionError::Unavailable);
        }
        check_level(level, NATIVE_MIN_LEVEL, NATIVE_MAX_LEVEL)?;

        let level = if level == 0 { zstd::DEFAULT_COMPRESSION_LEVEL } else { level };
        let mut encoder = zstd::stream::write::Encoder::new(sink, level)?;

        let workers = self.workers.unwrap_or_else(optimal_worker_count);
        if inject_workers(&mut encoder, workers) == TuningOutcome::SingleThreaded {
            debug!(level, "native zstd writer running single-threaded");
        }

        Ok(ZstdWriter::new(EncoderKind::Native(NativeEncoder { inner: encoder })))
    }

    fn new_reader<R: Read + Send>(&self, source: R) -> Result<ZstdReader<R>, CompressionError> {
        if !self.available {
            return Err(CompressionError::Unavailable);
        }
        let decoder = zstd::stream::read::Decoder::new(source)?;
        Ok(ZstdReader::new(DecoderKind::Native(NativeDecoder { inner: decoder })))
    }

    fn name(&self) -> String {
        if self.available {
            format!("native (libzstd {})", libzstd_version())
        } else {
            "native (unavailable)".to_string()
        }
    }

    fn native_available(&self) -> bool {
        self.available
    }

    fn max_level(&self) -> i32 {
        if self.available { NATIVE_MAX_LEVEL } else { 0 }
    }
}

#[cfg(not(feature = "native"))]
impl ZstdCodec for NativeBackend {
    fn new_writer<W: Write + Send>(&self, _sink: W, _level: i32) -> Result<ZstdWriter<W>, CompressionError> {
        Err(CompressionError::Unavailable)
    }

    fn new_reader<R: Read + Send>(&self, _source: R) -> Result<ZstdReader<R>, CompressionError> {
        Err(CompressionError::Unavailable)
    }

    fn name(&self) -> String {
        "native (unavailable)".to_string()
    }

    fn native_available(&self) -> bool {
        false
    }

    fn max_level(&self) -> i32 {
        0
    }
}

#[cfg(feature = "native")]
fn libzstd_version() -> String {
    let v = zstd_safe::version_number();
    format!("{}.{}.{}", v / 10000, (v / 100) % 100, v % 100)
}

/// Owns the libzstd compression context for one writer session.
#[cfg(feature = "native")]
pub struct NativeEncoder<W: Write> {
    inner: zstd::stream::write::Encoder<'static, W>,
}

#[cfg(feature = "native")]
impl<W: Write> NativeEncoder<W> {
    pub(crate) fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub(crate) fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

/// Owns the libzstd decompression context for one reader session.
#[cfg(feature = "native")]
pub struct NativeDecoder<R: Read> {
    inner: zstd::stream::read::Decoder<'static, BufReader<R>>,
}

#[cfg(feature = "native")]
impl<R: Read> NativeDecoder<R> {
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
