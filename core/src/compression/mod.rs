//! compression/mod.rs
//! Pluggable zstd backends.
//!
//! Notes:
//! - `registry` picks a backend once per process (native when libzstd works,
//!   portable otherwise) and hands out the same instance to every caller.
//! - `stream` exposes uniform writer/reader sessions; frames are standard zstd
//!   and interchangeable between backends.
//! - `tuning` is the only place that pokes at libzstd parameters the stream
//!   API does not expose.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;
pub mod probe;
pub mod stream;
#[cfg(feature = "native")]
pub mod tuning;

pub use constants::*;
pub use types::*;
pub use registry::*;
pub use codecs::{NativeBackend, PortableBackend};
pub use probe::probe_native;
pub use stream::{compress_to_vec, decompress_to_vec, ZstdReader, ZstdWriter};
