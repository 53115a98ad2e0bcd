//! compression/stream.rs
//! Uniform writer/reader sessions over either backend.
//!
//! Summary: `ZstdWriter` and `ZstdReader` hide the concrete encoder/decoder
//! behind `std::io::Write` / `std::io::Read`. Both follow
//! `Open --write/flush/read--> Open --close--> Closed`; anything attempted on a
//! closed session fails with `CompressionError::StreamClosed`.
//!
//! The concrete encoder/decoder is owned by the session, so its resources are
//! released exactly once: on `close`, or on drop if the caller walks away.
use std::io::{self, Read, Write};

use tracing::debug;

use crate::compression::codecs::portable::{PortableDecoder, PortableEncoder};
use crate::compression::types::{CompressionError, ZstdCodec};

#[cfg(feature = "native")]
use crate::compression::codecs::native::{NativeDecoder, NativeEncoder};

pub(crate) enum EncoderKind<W: Write> {
    Portable(PortableEncoder<W>),
    #[cfg(feature = "native")]
    Native(NativeEncoder<W>),
}

impl<W: Write> EncoderKind<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EncoderKind::Portable(e) => e.write(buf),
            #[cfg(feature = "native")]
            EncoderKind::Native(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EncoderKind::Portable(e) => e.flush(),
            #[cfg(feature = "native")]
            EncoderKind::Native(e) => e.flush(),
        }
    }

    fn finish(self) -> io::Result<W> {
        match self {
            EncoderKind::Portable(e) => e.finish(),
            #[cfg(feature = "native")]
            EncoderKind::Native(e) => e.finish(),
        }
    }
}

pub(crate) enum DecoderKind<R: Read> {
    Portable(PortableDecoder<R>),
    #[cfg(feature = "native")]
    Native(NativeDecoder<R>),
}

impl<R: Read> DecoderKind<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DecoderKind::Portable(d) => d.read(buf),
            #[cfg(feature = "native")]
            DecoderKind::Native(d) => d.read(buf),
        }
    }
}

fn stream_closed() -> io::Error {
    CompressionError::StreamClosed.into()
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

enum WriterState<W: Write> {
    Open(EncoderKind<W>),
    /// Holds the sink once the frame was finalized successfully.
    Closed(Option<W>),
}

/// Compressing session.
///
/// Call `close` (or `finish`) exactly once; a writer dropped while open
/// releases its encoder but leaves the compressed stream unterminated.
pub struct ZstdWriter<W: Write> {
    state: WriterState<W>,
}

impl<W: Write> ZstdWriter<W> {
    pub(crate) fn new(encoder: EncoderKind<W>) -> Self {
        Self { state: WriterState::Open(encoder) }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, WriterState::Closed(_))
    }

    /// Finalize the frame and release the encoder.
    ///
    /// The session is closed afterwards even when finalizing fails. Closing
    /// twice is a caller error and reports `StreamClosed`.
    pub fn close(&mut self) -> io::Result<()> {
        match std::mem::replace(&mut self.state, WriterState::Closed(None)) {
            WriterState::Open(encoder) => {
                let sink = encoder.finish()?;
                self.state = WriterState::Closed(Some(sink));
                Ok(())
            }
            closed @ WriterState::Closed(_) => {
                self.state = closed;
                Err(stream_closed())
            }
        }
    }

    /// Close and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.close()?;
        self.into_inner().ok_or_else(stream_closed)
    }

    /// The sink of a successfully closed writer; `None` while open.
    pub fn into_inner(mut self) -> Option<W> {
        match std::mem::replace(&mut self.state, WriterState::Closed(None)) {
            WriterState::Closed(sink) => sink,
            open @ WriterState::Open(_) => {
                self.state = open;
                None
            }
        }
    }

    pub fn get_ref(&self) -> Option<&W> {
        match &self.state {
            WriterState::Closed(sink) => sink.as_ref(),
            WriterState::Open(_) => None,
        }
    }
}

impl<W: Write> Write for ZstdWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            WriterState::Open(encoder) => encoder.write(buf),
            WriterState::Closed(_) => Err(stream_closed()),
        }
    }

    /// Push buffered compressed output to the sink without ending the stream.
    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            WriterState::Open(encoder) => encoder.flush(),
            WriterState::Closed(_) => Err(stream_closed()),
        }
    }
}

impl<W: Write> Drop for ZstdWriter<W> {
    fn drop(&mut self) {
        if let WriterState::Open(_) = self.state {
            debug!("zstd writer dropped without close, frame left unfinished");
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Decompressing session.
pub struct ZstdReader<R: Read> {
    decoder: Option<DecoderKind<R>>,
}

impl<R: Read> ZstdReader<R> {
    pub(crate) fn new(decoder: DecoderKind<R>) -> Self {
        Self { decoder: Some(decoder) }
    }

    pub fn is_closed(&self) -> bool {
        self.decoder.is_none()
    }

    /// Release decoder resources. Closing twice reports `StreamClosed`.
    pub fn close(&mut self) -> io::Result<()> {
        match self.decoder.take() {
            Some(decoder) => {
                drop(decoder);
                Ok(())
            }
            None => Err(stream_closed()),
        }
    }
}

impl<R: Read> Read for ZstdReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.decoder.as_mut() {
            Some(decoder) => decoder.read(buf),
            None => Err(stream_closed()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Compress `data` in one session.
pub fn compress_to_vec<C: ZstdCodec>(codec: &C, data: &[u8], level: i32) -> Result<Vec<u8>, CompressionError> {
    let mut writer = codec.new_writer(Vec::new(), level)?;
    if let Err(e) = writer.write_all(data) {
        let _ = writer.close();
        return Err(e.into());
    }
    Ok(writer.finish()?)
}

/// Decompress a complete zstd stream in one session.
pub fn decompress_to_vec<C: ZstdCodec>(codec: &C, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut reader = codec.new_reader(data)?;
    let mut out = Vec::new();
    let read = reader.read_to_end(&mut out);
    reader.close()?;
    read?;
    Ok(out)
}
