//! compression/types.rs
//! Capability trait, capability record and error taxonomy.
use std::fmt;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::compression::stream::{ZstdReader, ZstdWriter};

/// Errors surfaced by the backend layer.
///
/// - `Unavailable` is consumed by selection and only reaches callers that
///   construct a native backend directly.
/// - `Io` carries sink/source failures and codec faults untouched.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("native zstd backend is unavailable")]
    Unavailable,

    #[error("invalid compression level {level}: must be between {min} and {max}")]
    InvalidLevel { level: i32, min: i32, max: i32 },

    #[error("stream closed")]
    StreamClosed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<CompressionError> for io::Error {
    fn from(e: CompressionError) -> Self {
        match e {
            CompressionError::Io(inner) => inner,
            CompressionError::InvalidLevel { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
            CompressionError::Unavailable => io::Error::new(io::ErrorKind::Unsupported, e),
            CompressionError::StreamClosed => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}

/// True when `err` was produced by an operation on a closed session.
pub fn is_stream_closed(err: &io::Error) -> bool {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<CompressionError>())
        .is_some_and(|e| matches!(e, CompressionError::StreamClosed))
}

/// Which implementation a caller asked for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Implementation {
    #[default]
    Auto,
    Native,
    Portable,
}

impl Implementation {
    /// Unrecognised values mean automatic detection.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "native" | "libzstd" | "gozstd" => Implementation::Native,
            "portable" | "pure" | "rust" | "klauspost" => Implementation::Portable,
            _ => Implementation::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Implementation::Auto => "auto",
            Implementation::Native => "native",
            Implementation::Portable => "portable",
        }
    }
}

impl From<String> for Implementation {
    fn from(raw: String) -> Self {
        Implementation::parse(&raw)
    }
}

impl From<Implementation> for String {
    fn from(i: Implementation) -> Self {
        i.as_str().to_string()
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a backend can do in this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub native_available: bool,
    pub max_level: i32,
}

/// Shared contract of the portable and native backends.
///
/// Writers and readers are uniform session types regardless of backend, so
/// frames are interchangeable between implementations.
pub trait ZstdCodec: Send + Sync {
    /// Open a compressing session writing into `sink`.
    fn new_writer<W: Write + Send>(&self, sink: W, level: i32) -> Result<ZstdWriter<W>, CompressionError>;

    /// Open a decompressing session reading from `source`.
    fn new_reader<R: Read + Send>(&self, source: R) -> Result<ZstdReader<R>, CompressionError>;

    fn name(&self) -> String;

    fn native_available(&self) -> bool;

    fn max_level(&self) -> i32;

    fn capability(&self) -> Capability {
        Capability {
            name: self.name(),
            native_available: self.native_available(),
            max_level: self.max_level(),
        }
    }
}

pub(crate) fn check_level(level: i32, min: i32, max: i32) -> Result<(), CompressionError> {
    if (min..=max).contains(&level) {
        Ok(())
    } else {
        Err(CompressionError::InvalidLevel { level, min, max })
    }
}
