//! config.rs
//! Compression settings a host process can embed in its own configuration.
//!
//! Summary: the selector reads `implementation`; the worker heuristic reads
//! `workers`. `from_env` builds the same struct from `ZSTD_FORCE_IMPLEMENTATION`
//! and `ZSTD_WORKERS`; `STARGZ_FORCE_PURE_GO_ZSTD=1` still forces portable.
//! Keys of the older service block (`zstd_implementation`,
//! `zstd_chunked_compression_level`) are accepted as aliases.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compression::constants::{DEFAULT_LEVEL, ENV_FORCE_IMPLEMENTATION, ENV_LEGACY_FORCE_PORTABLE, ENV_WORKERS};
use crate::compression::types::Implementation;
use crate::parallelism::{worker_count_from, HostTopology};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// `auto` (default), `native` or `portable`. Unknown values mean `auto`.
    #[serde(alias = "zstd_implementation")]
    pub implementation: Implementation,
    /// Level used by callers that do not pick one.
    #[serde(alias = "zstd_chunked_compression_level")]
    pub compression_level: i32,
    /// Raw worker override, validated by the heuristic.
    pub workers: Option<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            implementation: Implementation::Auto,
            compression_level: DEFAULT_LEVEL,
            workers: None,
        }
    }
}

impl CompressionConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(ENV_FORCE_IMPLEMENTATION).ok().as_deref(),
            std::env::var(ENV_LEGACY_FORCE_PORTABLE).ok().as_deref(),
            std::env::var(ENV_WORKERS).ok(),
        )
    }

    /// Pure form of [`from_env`](Self::from_env). The legacy switch only
    /// counts when set to exactly `1`, and then wins over `force`.
    pub fn from_vars(force: Option<&str>, legacy_portable: Option<&str>, workers: Option<String>) -> Self {
        let implementation = if legacy_portable == Some("1") {
            debug!("{}=1, forcing portable zstd", ENV_LEGACY_FORCE_PORTABLE);
            Implementation::Portable
        } else {
            force.map(Implementation::parse).unwrap_or_default()
        };
        Self { implementation, workers, ..Self::default() }
    }

    /// Worker count for this host, honouring `workers` when it is valid.
    pub fn worker_count(&self) -> usize {
        worker_count_from(self.workers.as_deref(), &HostTopology::cached())
    }

    /// `Some` only when a worker override is present (valid or not), so
    /// backends built from this config skip re-reading the environment.
    pub(crate) fn explicit_worker_count(&self) -> Option<usize> {
        self.workers.as_ref().map(|_| self.worker_count())
    }
}
