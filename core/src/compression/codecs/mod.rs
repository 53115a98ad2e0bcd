//! compression/codecs/mod.rs
//! The two concrete backends.

pub mod native;
pub mod portable;

pub use native::NativeBackend;
pub use portable::PortableBackend;
