//! compression/constants.rs
//! Level bounds, environment keys and block sizing shared by both backends.

/// Environment variable forcing a backend (`native` | `portable`).
pub const ENV_FORCE_IMPLEMENTATION: &str = "ZSTD_FORCE_IMPLEMENTATION";

/// Older switch: `1` forces the portable backend.
pub const ENV_LEGACY_FORCE_PORTABLE: &str = "STARGZ_FORCE_PURE_GO_ZSTD";

/// Environment variable overriding the worker heuristic.
pub const ENV_WORKERS: &str = "ZSTD_WORKERS";

/// Level used when the caller has no preference.
pub const DEFAULT_LEVEL: i32 = 3;

/// Portable backend accepts `0..=11`.
pub const PORTABLE_MIN_LEVEL: i32 = 0;
pub const PORTABLE_MAX_LEVEL: i32 = 11;

/// Native backend accepts `0` (library default) and `1..=22`.
pub const NATIVE_MIN_LEVEL: i32 = 0;
pub const NATIVE_MAX_LEVEL: i32 = 22;

/// Portable encoder block size. Each full block becomes one zstd frame.
pub const PORTABLE_BLOCK_SIZE: usize = 1024 * 1024;

/// libzstd release that stabilised `ZSTD_c_nbWorkers` (1.4.0).
pub const MIN_NATIVE_MT_VERSION: u32 = 10400;

/// Fixed payload for the capability probe.
pub const PROBE_PAYLOAD: &[u8] = b"zstd-backend capability probe";

/// A complete zstd frame carrying zero bytes of content: magic, descriptor
/// without content size, 1 KiB window, one last raw block of size 0.
pub const EMPTY_FRAME: [u8; 9] = [0x28, 0xB5, 0x2F, 0xFD, 0x00, 0x00, 0x01, 0x00, 0x00];
