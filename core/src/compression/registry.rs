//! compression/registry.rs
//! Backend enum and the process-wide memoized selector.
//!
//! Summary: the first `select` runs exactly one decision (forced override,
//! else probe native, else portable) and every caller, concurrent or later,
//! gets the same `Arc<Backend>`. Selection never fails.
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::compression::codecs::{NativeBackend, PortableBackend};
use crate::compression::probe::probe_native;
use crate::compression::stream::{ZstdReader, ZstdWriter};
use crate::compression::types::{CompressionError, Implementation, ZstdCodec};
use crate::config::CompressionConfig;

/// One of the two concrete backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Portable(PortableBackend),
    Native(NativeBackend),
}

impl ZstdCodec for Backend {
    fn new_writer<W: Write + Send>(&self, sink: W, level: i32) -> Result<ZstdWriter<W>, CompressionError> {
        match self {
            Backend::Portable(b) => b.new_writer(sink, level),
            Backend::Native(b) => b.new_writer(sink, level),
        }
    }

    fn new_reader<R: Read + Send>(&self, source: R) -> Result<ZstdReader<R>, CompressionError> {
        match self {
            Backend::Portable(b) => b.new_reader(source),
            Backend::Native(b) => b.new_reader(source),
        }
    }

    fn name(&self) -> String {
        match self {
            Backend::Portable(b) => b.name(),
            Backend::Native(b) => b.name(),
        }
    }

    fn native_available(&self) -> bool {
        match self {
            Backend::Portable(b) => b.native_available(),
            Backend::Native(b) => b.native_available(),
        }
    }

    fn max_level(&self) -> i32 {
        match self {
            Backend::Portable(b) => b.max_level(),
            Backend::Native(b) => b.max_level(),
        }
    }
}

/// Memoized backend chooser.
///
/// `probe` and `config` are plain function pointers so the global instance
/// can be built in a `static`; tests build their own selectors with counting
/// probes or fixed configs.
pub struct BackendSelector {
    selected: OnceLock<Arc<Backend>>,
    test_override: RwLock<Option<Arc<Backend>>>,
    probe: fn() -> bool,
    config: fn() -> CompressionConfig,
}

impl BackendSelector {
    pub const fn new(probe: fn() -> bool, config: fn() -> CompressionConfig) -> Self {
        Self {
            selected: OnceLock::new(),
            test_override: RwLock::new(None),
            probe,
            config,
        }
    }

    /// The backend for this selector. The decision runs once; concurrent
    /// first callers block until it is made.
    pub fn select(&self) -> Arc<Backend> {
        let forced = self
            .test_override
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(backend) = forced {
            return backend;
        }
        Arc::clone(self.selected.get_or_init(|| Arc::new(self.decide())))
    }

    /// Test-only: replace what `select` returns, bypassing the memoized
    /// decision. Not a reconfiguration mechanism; sessions already opened on
    /// the previous backend are unaffected and callers holding the old `Arc`
    /// keep using it.
    pub fn set_override(&self, backend: Backend) -> Arc<Backend> {
        let backend = Arc::new(backend);
        *self.test_override.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&backend));
        backend
    }

    /// Test-only: drop a previous `set_override`.
    pub fn clear_override(&self) {
        *self.test_override.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn decide(&self) -> Backend {
        let config = (self.config)();
        let backend = match config.implementation {
            Implementation::Portable => {
                debug!("portable zstd forced by configuration");
                Backend::Portable(self.portable(&config))
            }
            Implementation::Native => {
                if (self.probe)() {
                    debug!("native zstd forced by configuration");
                    Backend::Native(self.native(&config))
                } else {
                    warn!("native zstd forced but unavailable, falling back to portable");
                    Backend::Portable(self.portable(&config))
                }
            }
            Implementation::Auto => {
                if (self.probe)() {
                    Backend::Native(self.native(&config))
                } else {
                    debug!("libzstd not available, falling back to portable zstd");
                    Backend::Portable(self.portable(&config))
                }
            }
        };
        debug!(backend = %backend.name(), "zstd backend selected");
        backend
    }

    fn portable(&self, config: &CompressionConfig) -> PortableBackend {
        match config.explicit_worker_count() {
            Some(n) => PortableBackend::with_concurrency(n),
            None => PortableBackend::new(),
        }
    }

    fn native(&self, config: &CompressionConfig) -> NativeBackend {
        let backend = NativeBackend::from_probe(true);
        match config.explicit_worker_count() {
            Some(n) => backend.with_workers(n),
            None => backend,
        }
    }
}

static GLOBAL: BackendSelector = BackendSelector::new(probe_native, CompressionConfig::from_env);

/// Process-wide backend, chosen on first use from the environment.
pub fn select_backend() -> Arc<Backend> {
    GLOBAL.select()
}

/// Test-only escape hatch for the process-wide selector. See
/// [`BackendSelector::set_override`].
pub fn set_backend_override(backend: Backend) -> Arc<Backend> {
    GLOBAL.set_override(backend)
}

/// Test-only: undo [`set_backend_override`].
pub fn clear_backend_override() {
    GLOBAL.clear_override()
}
