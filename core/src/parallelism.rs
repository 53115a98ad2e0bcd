//! parallelism.rs
//! Worker-count heuristic for backend-internal compression lanes.
//!
//! Summary: an explicit positive override wins; otherwise use 3/4 of the
//! physical cores, falling back to half the logical CPUs.
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::compression::constants::ENV_WORKERS;

/// CPU topology snapshot used by the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTopology {
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
}

static TOPOLOGY: OnceLock<HostTopology> = OnceLock::new();

impl HostTopology {
    /// Topology detected once per process. `num_cpus::get_physical` reads
    /// `/proc/cpuinfo` on Linux, so writers never call `detect` directly.
    pub fn cached() -> Self {
        *TOPOLOGY.get_or_init(Self::detect)
    }

    pub fn detect() -> Self {
        let physical = num_cpus::get_physical();
        Self {
            physical_cores: (physical > 0).then_some(physical),
            logical_cores: num_cpus::get(),
        }
    }
}

/// Worker count for this host, honouring `ZSTD_WORKERS`.
pub fn optimal_worker_count() -> usize {
    let raw = std::env::var(ENV_WORKERS).ok();
    worker_count_from(raw.as_deref(), &HostTopology::cached())
}

/// Pure form of [`optimal_worker_count`]. Always returns at least 1.
pub fn worker_count_from(override_value: Option<&str>, topology: &HostTopology) -> usize {
    if let Some(n) = parse_override(override_value) {
        debug!(workers = n, "using {} override", ENV_WORKERS);
        return n;
    }

    if let Some(cores) = topology.physical_cores.filter(|&c| c > 0) {
        let workers = (cores * 3 / 4).max(1);
        debug!(physical_cores = cores, workers, "worker count from physical cores");
        return workers;
    }

    let workers = (topology.logical_cores / 2).max(1);
    debug!(logical_cores = topology.logical_cores, workers, "physical cores unknown, worker count from logical CPUs");
    workers
}

fn parse_override(raw: Option<&str>) -> Option<usize> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => usize::try_from(n).ok(),
        _ => {
            warn!(value = raw, "invalid {} value, using automatic detection", ENV_WORKERS);
            None
        }
    }
}
