use std::io::{self, Write};

use crate::compression::{get_codec, Compression};
use crate::error::Result;

/// Owning write handle used by row writers.
///
/// Uncompressed output passes straight through to the inner writer.
/// Compressed output is buffered and compressed in one piece by
/// [`Sink::finish`].  `finish` also flushes and releases the inner writer;
/// dropping an unfinished sink finishes it, ignoring errors.
pub struct Sink<W: Write> {
    inner:       Option<W>,
    compression: Compression,
    buf:         Vec<u8>,
}

impl<W: Write> Sink<W> {
    pub fn new(inner: W, compression: Compression) -> Self {
        Sink { inner: Some(inner), compression, buf: Vec::new() }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    pub fn finish(&mut self) -> Result<()> {
        let Some(mut inner) = self.inner.take() else {
            return Ok(());
        };
        if !self.compression.is_none() {
            let packed = get_codec(self.compression).compress(&self.buf)?;
            self.buf = Vec::new();
            inner.write_all(&packed)?;
        }
        inner.flush()?;
        Ok(())
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink already closed"));
        };
        if self.compression.is_none() {
            inner.write(data)
        } else {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) if self.compression.is_none() => inner.flush(),
            _ => Ok(()),
        }
    }
}

impl<W: Write> Drop for Sink<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
