//! compression/codecs/portable.rs
//!
//! Pure Rust zstd backend built on `ruzstd`.
//!
//! Design notes:
//! - Input is cut into `PORTABLE_BLOCK_SIZE` blocks; each block is compressed
//!   into its own zstd frame. Concatenated frames are a valid zstd stream.
//! - Up to `concurrency` blocks are compressed in parallel on scoped threads
//!   and written out in input order.
//! - `flush` compresses whatever is pending as a (short) frame.
//! - `write` always accepts its input; a sink failure while emitting blocks
//!   surfaces on the next `write` or `flush`, and `close` retries the blocks
//!   that never reached the sink.
//! - The decoder walks concatenated frames lazily; nothing is read before the
//!   first `read` call.
use std::io::{self, BufRead, BufReader, Read, Write};
use std::panic;

use ruzstd::decoding::{FrameDecoder, StreamingDecoder};
use ruzstd::encoding::{compress_to_vec, CompressionLevel};
use tracing::debug;

use crate::compression::constants::{EMPTY_FRAME, PORTABLE_BLOCK_SIZE, PORTABLE_MAX_LEVEL, PORTABLE_MIN_LEVEL};
use crate::compression::stream::{DecoderKind, EncoderKind, ZstdReader, ZstdWriter};
use crate::compression::types::{check_level, CompressionError, ZstdCodec};
use crate::parallelism::optimal_worker_count;

/// Portable backend. Always usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortableBackend {
    concurrency: Option<usize>,
}

impl PortableBackend {
    pub fn new() -> Self {
        Self { concurrency: None }
    }

    /// Fix the encoder concurrency instead of consulting the heuristic.
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self { concurrency: Some(concurrency.max(1)) }
    }
}

impl ZstdCodec for PortableBackend {
    fn new_writer<W: Write + Send>(&self, sink: W, level: i32) -> Result<ZstdWriter<W>, CompressionError> {
        check_level(level, PORTABLE_MIN_LEVEL, PORTABLE_MAX_LEVEL)?;
        let concurrency = self.concurrency.unwrap_or_else(optimal_worker_count);
        let encoder = PortableEncoder::new(sink, level, concurrency);
        Ok(ZstdWriter::new(EncoderKind::Portable(encoder)))
    }

    fn new_reader<R: Read + Send>(&self, source: R) -> Result<ZstdReader<R>, CompressionError> {
        Ok(ZstdReader::new(DecoderKind::Portable(PortableDecoder::new(source))))
    }

    fn name(&self) -> String {
        "portable (ruzstd)".to_string()
    }

    fn native_available(&self) -> bool {
        false
    }

    fn max_level(&self) -> i32 {
        PORTABLE_MAX_LEVEL
    }
}

/// Map a zstd-style level onto a ruzstd tier.
///
/// ruzstd 0.8 only implements `Uncompressed` and `Fastest`; the higher tiers
/// panic with `unimplemented!`. Every accepted level therefore compresses
/// with `Fastest`, and the level only gates validation.
fn encoder_level(_level: i32) -> CompressionLevel {
    CompressionLevel::Fastest
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

pub struct PortableEncoder<W: Write> {
    sink: W,
    level: i32,
    concurrency: usize,
    pending: Vec<u8>,
    frames_written: usize,
    /// Sink failure hit after `write` had already accepted the bytes.
    deferred: Option<io::Error>,
}

impl<W: Write> PortableEncoder<W> {
    pub(crate) fn new(sink: W, level: i32, concurrency: usize) -> Self {
        debug!(level, concurrency, "portable zstd encoder created");
        Self {
            sink,
            level,
            concurrency: concurrency.max(1),
            pending: Vec::new(),
            frames_written: 0,
            deferred: None,
        }
    }

    fn batch_len(&self) -> usize {
        PORTABLE_BLOCK_SIZE.saturating_mul(self.concurrency)
    }

    fn take_deferred(&mut self) -> io::Result<()> {
        match self.deferred.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Compress and emit the first `len` pending bytes.
    ///
    /// Each block leaves `pending` as soon as its frame reached the sink, so
    /// a failed sink write leaves exactly the unwritten blocks behind.
    fn emit(&mut self, len: usize) -> io::Result<()> {
        if len == 0 {
            return Ok(());
        }
        let frames = {
            let blocks: Vec<&[u8]> = self.pending[..len].chunks(PORTABLE_BLOCK_SIZE).collect();
            encode_blocks(&blocks, self.level, self.concurrency)?
        };
        let mut consumed = 0;
        let mut result = Ok(());
        for frame in &frames {
            if let Err(e) = self.sink.write_all(frame) {
                result = Err(e);
                break;
            }
            self.frames_written += 1;
            consumed += PORTABLE_BLOCK_SIZE.min(len - consumed);
        }
        self.pending.drain(..consumed);
        result
    }

    /// Buffers `buf` and returns its full length. A sink failure while
    /// emitting full blocks is kept and reported by the next call.
    pub(crate) fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.take_deferred()?;
        self.pending.extend_from_slice(buf);
        if self.pending.len() >= self.batch_len() {
            let full = self.pending.len() - self.pending.len() % PORTABLE_BLOCK_SIZE;
            if let Err(e) = self.emit(full) {
                debug!(error = %e, "portable zstd sink failed, reporting on next call");
                self.deferred = Some(e);
            }
        }
        Ok(buf.len())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.take_deferred()?;
        self.emit(self.pending.len())?;
        self.sink.flush()
    }

    pub(crate) fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.deferred.take() {
            debug!(error = %e, "retrying pending blocks after earlier sink failure");
        }
        self.emit(self.pending.len())?;
        if self.frames_written == 0 {
            self.sink.write_all(&EMPTY_FRAME)?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}

fn worker_panicked() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "portable zstd worker panicked")
}

/// Compress one block into one frame, turning a codec panic into an error.
fn compress_block(block: &[u8], level: i32) -> io::Result<Vec<u8>> {
    panic::catch_unwind(|| compress_to_vec(block, encoder_level(level))).map_err(|_| worker_panicked())
}

/// One frame per block, in input order.
fn encode_blocks(blocks: &[&[u8]], level: i32, concurrency: usize) -> io::Result<Vec<Vec<u8>>> {
    if concurrency <= 1 || blocks.len() <= 1 {
        return blocks.iter().map(|b| compress_block(b, level)).collect();
    }

    let mut frames = Vec::with_capacity(blocks.len());
    for group in blocks.chunks(concurrency) {
        let encoded = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = group
                .iter()
                .map(|block| s.spawn(move |_| compress_block(block, level)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(worker_panicked())))
                .collect::<io::Result<Vec<_>>>()
        })
        .map_err(|_| worker_panicked())??;
        frames.extend(encoded);
    }
    Ok(frames)
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

enum DecodeState<R: Read> {
    /// Between frames (or before the first one).
    Pending(BufReader<R>),
    Frame(StreamingDecoder<BufReader<R>, FrameDecoder>),
    Done,
    /// A fault was reported; later reads keep failing.
    Failed,
}

pub struct PortableDecoder<R: Read> {
    state: DecodeState<R>,
}

impl<R: Read> PortableDecoder<R> {
    pub(crate) fn new(source: R) -> Self {
        Self { state: DecodeState::Pending(BufReader::new(source)) }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match std::mem::replace(&mut self.state, DecodeState::Failed) {
                DecodeState::Frame(mut frame) => match frame.read(buf) {
                    Ok(0) => self.state = DecodeState::Pending(frame.into_inner()),
                    Ok(n) => {
                        self.state = DecodeState::Frame(frame);
                        return Ok(n);
                    }
                    Err(e) => return Err(e),
                },
                DecodeState::Pending(mut source) => {
                    match source.fill_buf().map(|b| b.is_empty()) {
                        Ok(true) => {
                            self.state = DecodeState::Done;
                            return Ok(0);
                        }
                        Ok(false) => {}
                        Err(e) => {
                            self.state = DecodeState::Pending(source);
                            return Err(e);
                        }
                    }
                    let frame = StreamingDecoder::new(source)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                    self.state = DecodeState::Frame(frame);
                }
                DecodeState::Done => {
                    self.state = DecodeState::Done;
                    return Ok(0);
                }
                DecodeState::Failed => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "zstd stream previously failed to decode",
                    ));
                }
            }
        }
    }
}
