#[cfg(test)]
mod stream_tests {
    use std::io::{self, Read, Write};
    use std::thread;

    use zstd_backend::compression::{
        compress_to_vec, decompress_to_vec, is_stream_closed, Backend, CompressionError, NativeBackend,
        PortableBackend, ZstdCodec,
    };

    fn backends() -> Vec<Backend> {
        let mut all = vec![Backend::Portable(PortableBackend::with_concurrency(2))];
        let native = NativeBackend::new();
        if native.native_available() {
            all.push(Backend::Native(native.with_workers(2)));
        }
        all
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink gone"))
        }
    }

    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "source gone"))
        }
    }

    #[test]
    fn write_and_flush_after_close_fail_with_stream_closed() {
        for backend in backends() {
            let mut writer = backend.new_writer(Vec::new(), 3).unwrap();
            writer.write_all(b"payload").unwrap();
            writer.close().unwrap();
            assert!(writer.is_closed());

            let err = writer.write(b"more").unwrap_err();
            assert!(is_stream_closed(&err), "{}: {err}", backend.name());
            let err = writer.flush().unwrap_err();
            assert!(is_stream_closed(&err), "{}: {err}", backend.name());
        }
    }

    #[test]
    fn double_close_is_reported() {
        for backend in backends() {
            let mut writer = backend.new_writer(Vec::new(), 3).unwrap();
            writer.close().unwrap();
            assert!(is_stream_closed(&writer.close().unwrap_err()));
            // The finished stream is still retrievable.
            assert!(writer.get_ref().is_some());

            let mut reader = backend.new_reader(io::empty()).unwrap();
            reader.close().unwrap();
            assert!(is_stream_closed(&reader.close().unwrap_err()));
        }
    }

    #[test]
    fn close_without_writes_yields_empty_payload() {
        for backend in backends() {
            let mut writer = backend.new_writer(Vec::new(), 3).unwrap();
            writer.close().unwrap();
            let compressed = writer.into_inner().unwrap();
            assert!(!compressed.is_empty());
            assert!(decompress_to_vec(&backend, &compressed).unwrap().is_empty());
        }
    }

    #[test]
    fn read_after_close_fails_with_stream_closed() {
        for backend in backends() {
            let compressed = compress_to_vec(&backend, b"abc", 3).unwrap();
            let mut reader = backend.new_reader(&compressed[..]).unwrap();
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out, b"abc");

            reader.close().unwrap();
            assert!(reader.is_closed());
            let mut buf = [0u8; 4];
            assert!(is_stream_closed(&reader.read(&mut buf).unwrap_err()));
        }
    }

    #[test]
    fn sink_errors_propagate_and_close_stays_reachable() {
        for backend in backends() {
            let mut writer = backend.new_writer(BrokenSink, 3).unwrap();
            let _ = writer.write_all(&[7u8; 4096]);

            let err = writer.flush().unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe, "{}", backend.name());

            let err = writer.close().unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe, "{}", backend.name());
            assert!(writer.is_closed());
            assert!(writer.into_inner().is_none());
        }
    }

    #[test]
    fn source_errors_propagate_unchanged() {
        for backend in backends() {
            let mut reader = backend.new_reader(BrokenSource).unwrap();
            let mut buf = [0u8; 32];
            let err = reader.read(&mut buf).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::ConnectionReset, "{}", backend.name());
            reader.close().unwrap();
        }
    }

    #[test]
    fn dropping_an_open_writer_is_safe() {
        for backend in backends() {
            let mut writer = backend.new_writer(Vec::new(), 3).unwrap();
            writer.write_all(b"abandoned").unwrap();
            drop(writer);
        }
    }

    #[test]
    fn finish_returns_sink() {
        for backend in backends() {
            let mut writer = backend.new_writer(Vec::new(), 1).unwrap();
            writer.write_all(b"finish me").unwrap();
            let compressed = writer.finish().unwrap();
            assert_eq!(decompress_to_vec(&backend, &compressed).unwrap(), b"finish me");
        }
    }

    #[test]
    fn concurrent_sessions_are_independent() {
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                thread::spawn(move || {
                    let backend = if i % 2 == 0 {
                        Backend::Portable(PortableBackend::with_concurrency(1))
                    } else {
                        backends().pop().unwrap()
                    };
                    let data: Vec<u8> = (0..50_000u32).map(|n| (n % 13) as u8 + i).collect();
                    let compressed = compress_to_vec(&backend, &data, 3).unwrap();
                    assert_eq!(decompress_to_vec(&backend, &compressed).unwrap(), data);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn closed_error_converts_back_to_library_error() {
        let err: io::Error = CompressionError::StreamClosed.into();
        assert!(is_stream_closed(&err));
        let plain = io::Error::new(io::ErrorKind::Other, "stream closed");
        assert!(!is_stream_closed(&plain));
    }
}
