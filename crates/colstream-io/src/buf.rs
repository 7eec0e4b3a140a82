//! Position-tracked byte sinks and sources.
//!
//! The stream layer never seeks; it only needs to know how far it has
//! written or read, and whether another byte is available.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

/// Append-only write cursor.
pub trait ByteSink: Write {
    /// Bytes written so far.
    fn position(&self) -> u64;

    fn is_writable(&self) -> bool {
        true
    }
}

/// Sequential read cursor.
pub trait ByteSource: Read {
    /// Bytes consumed so far.
    fn position(&self) -> u64;

    /// True iff at least one more byte can be read.
    fn is_readable(&mut self) -> io::Result<bool>;
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn is_readable(&mut self) -> io::Result<bool> {
        (**self).is_readable()
    }
}

#[derive(Debug)]
pub struct PositionedWriter<W: Write> {
    inner: W,
    position: u64,
    closed: bool,
}

impl PositionedWriter<Vec<u8>> {
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }
}

impl PositionedWriter<BufWriter<File>> {
    pub fn create_file(path: impl AsRef<Path>, buffer_bytes: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::with_capacity(buffer_bytes, file)))
    }
}

impl<W: Write> PositionedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            closed: false,
        }
    }

    /// Mark the sink closed; every later write fails.
    pub fn close(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.closed = true;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PositionedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "byte sink is closed"));
        }
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> ByteSink for PositionedWriter<W> {
    fn position(&self) -> u64 {
        self.position
    }

    fn is_writable(&self) -> bool {
        !self.closed
    }
}

pub struct PositionedReader<R: BufRead> {
    inner: R,
    position: u64,
}

impl<B: AsRef<[u8]>> PositionedReader<Cursor<B>> {
    pub fn from_bytes(bytes: B) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl PositionedReader<BufReader<File>> {
    pub fn open_file(path: impl AsRef<Path>, buffer_bytes: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(buffer_bytes, file)))
    }
}

impl<R: BufRead> PositionedReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Read for PositionedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> ByteSource for PositionedReader<R> {
    fn position(&self) -> u64 {
        self.position
    }

    fn is_readable(&mut self) -> io::Result<bool> {
        Ok(!self.inner.fill_buf()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_tracks_position() {
        let mut w = PositionedWriter::in_memory();
        w.write_all(b"abc").unwrap();
        w.write_all(b"de").unwrap();
        assert_eq!(w.position(), 5);
        assert_eq!(w.into_inner(), b"abcde");
    }

    #[test]
    fn closed_writer_rejects_writes() {
        let mut w = PositionedWriter::in_memory();
        w.close().unwrap();
        assert!(!w.is_writable());
        let err = w.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn reader_probes_without_consuming() {
        let mut r = PositionedReader::from_bytes(vec![1u8, 2]);
        assert!(r.is_readable().unwrap());
        assert!(r.is_readable().unwrap());
        assert_eq!(r.position(), 0);
        let mut buf = [0u8; 2];
        r.read_exact(&mut buf).unwrap();
        assert_eq!(r.position(), 2);
        assert!(!r.is_readable().unwrap());
    }
}
