//! zstd-backend
//!
//! Pluggable zstd compression: a portable pure Rust backend and a
//! libzstd-backed native backend behind one capability trait, with memoized
//! runtime selection and worker-count tuning.

#![forbid(unsafe_code)]

pub mod config;
pub mod parallelism;

pub mod compression;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{
        compress_to_vec, decompress_to_vec, select_backend, Backend, CompressionError, NativeBackend,
        PortableBackend, ZstdCodec, ZstdReader, ZstdWriter,
    };
    pub use crate::config::CompressionConfig;
}
