//! Compression Codec
//!
//! Raw deflate (no zlib or gzip framing) over plain `Read`/`Write` streams.
//!
//! Inflate errors are reported as `InflateFailed` so that the container
//! parser can tell "this blob is not compressed" apart from a failing sink,
//! which stays an `Io` error.

use std::io::{self, Read, Write};

use libflate::deflate::{Decoder, Encoder};

use crate::error::{Result, V8Error};

const CHUNK_SIZE: usize = 64 * 1024;

/// Decompress `input` into `output`, returning the inflated size
pub fn inflate<R, W>(input: R, output: &mut W) -> Result<u64>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut decoder = Decoder::new(input);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match decoder.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(V8Error::InflateFailed(e.to_string())),
        };
        output.write_all(&buffer[..n])?;
        total += n as u64;
    }

    Ok(total)
}

/// Compress `input` into `output`, returning the deflated size
pub fn deflate<R, W>(mut input: R, output: W) -> Result<u64>
where
    R: Read,
    W: Write,
{
    let mut writer = DeflateWriter::new(output);
    io::copy(&mut input, &mut writer)?;
    let (_, written) = writer.finish()?;
    Ok(written)
}

/// In-memory convenience around [`inflate`]
pub fn inflate_bytes(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed.len() * 4);
    inflate(compressed, &mut out)?;
    Ok(out)
}

/// In-memory convenience around [`deflate`]
pub fn deflate_bytes(plain: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(plain.len() / 2 + 16);
    deflate(plain, &mut out)?;
    Ok(out)
}

// =============================================================================
// Streaming encoder
// =============================================================================

/// A `Write` adapter that deflates everything written through it
///
/// Lets a serializer stream straight into compressed storage without
/// materializing the plain bytes first.
pub struct DeflateWriter<W: Write> {
    encoder: Encoder<CountingWriter<W>>,
}

impl<W: Write> DeflateWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            encoder: Encoder::new(CountingWriter { inner, written: 0 }),
        }
    }

    /// Flush the final deflate block and hand back the sink with the number
    /// of compressed bytes written to it
    pub fn finish(self) -> Result<(W, u64)> {
        let counting = self
            .encoder
            .finish()
            .into_result()
            .map_err(|e| V8Error::DeflateFailed(e.to_string()))?;
        Ok((counting.inner, counting.written))
    }
}

impl<W: Write> Write for DeflateWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
