#[cfg(test)]
mod selector_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use zstd_backend::compression::{
        compress_to_vec, decompress_to_vec, probe_native, Backend, BackendSelector, Implementation,
        PortableBackend, ZstdCodec,
    };
    use zstd_backend::config::CompressionConfig;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn auto_config() -> CompressionConfig {
        CompressionConfig::default()
    }

    fn portable_config() -> CompressionConfig {
        CompressionConfig { implementation: Implementation::Portable, ..CompressionConfig::default() }
    }

    fn native_config() -> CompressionConfig {
        CompressionConfig { implementation: Implementation::Native, ..CompressionConfig::default() }
    }

    fn garbage_config() -> CompressionConfig {
        CompressionConfig {
            implementation: Implementation::parse("definitely-not-a-backend"),
            ..CompressionConfig::default()
        }
    }

    fn never() -> bool {
        false
    }

    #[test]
    fn repeated_select_returns_same_instance() {
        init_logging();
        let selector = BackendSelector::new(probe_native, auto_config);
        let a = selector.select();
        let b = selector.select();
        assert!(Arc::ptr_eq(&a, &b));
    }

    static CONCURRENT_PROBES: AtomicUsize = AtomicUsize::new(0);

    fn slow_counting_probe() -> bool {
        CONCURRENT_PROBES.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        probe_native()
    }

    #[test]
    fn concurrent_first_callers_converge_and_probe_once() {
        let selector = Arc::new(BackendSelector::new(slow_counting_probe, auto_config));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let selector = Arc::clone(&selector);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    selector.select()
                })
            })
            .collect();

        let picked: Vec<Arc<Backend>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for backend in &picked[1..] {
            assert!(Arc::ptr_eq(&picked[0], backend));
        }
        assert_eq!(CONCURRENT_PROBES.load(Ordering::SeqCst), 1);
    }

    static PORTABLE_PROBES: AtomicUsize = AtomicUsize::new(0);

    fn counting_probe() -> bool {
        PORTABLE_PROBES.fetch_add(1, Ordering::SeqCst);
        true
    }

    #[test]
    fn forced_portable_skips_probe() {
        let selector = BackendSelector::new(counting_probe, portable_config);
        let backend = selector.select();
        assert!(matches!(*backend, Backend::Portable(_)));
        assert!(!backend.native_available());
        assert_eq!(backend.max_level(), 11);
        assert_eq!(PORTABLE_PROBES.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_probe_degrades_to_portable() {
        init_logging();
        let auto = BackendSelector::new(never, auto_config).select();
        assert!(matches!(*auto, Backend::Portable(_)));

        let forced = BackendSelector::new(never, native_config).select();
        assert!(matches!(*forced, Backend::Portable(_)));
    }

    #[cfg(feature = "native")]
    #[test]
    fn working_probe_selects_native() {
        let backend = BackendSelector::new(probe_native, auto_config).select();
        assert!(matches!(*backend, Backend::Native(_)));
        assert!(backend.native_available());
        assert_eq!(backend.max_level(), 22);
    }

    #[test]
    fn unrecognized_force_value_uses_detection() {
        let selector = BackendSelector::new(probe_native, garbage_config);
        let backend = selector.select();
        assert_eq!(backend.native_available(), probe_native());

        let data = b"selection must still produce a working backend".repeat(64);
        let compressed = compress_to_vec(backend.as_ref(), &data, 3).unwrap();
        assert_eq!(decompress_to_vec(backend.as_ref(), &compressed).unwrap(), data);
    }

    #[test]
    fn override_bypasses_and_clears() {
        let selector = BackendSelector::new(probe_native, auto_config);
        let chosen = selector.select();

        let forced = selector.set_override(Backend::Portable(PortableBackend::with_concurrency(1)));
        assert!(Arc::ptr_eq(&forced, &selector.select()));
        assert!(!Arc::ptr_eq(&forced, &chosen));

        selector.clear_override();
        assert!(Arc::ptr_eq(&chosen, &selector.select()));
    }

    #[test]
    fn capability_record_matches_backend() {
        let backend = BackendSelector::new(probe_native, auto_config).select();
        let cap = backend.capability();
        assert!(!cap.name.is_empty());
        assert!(cap.max_level >= 0);
        if cap.native_available {
            assert_eq!(cap.max_level, 22);
        } else {
            assert_eq!(cap.max_level, 11);
        }
    }
}
