//! Buffered terminal output.
//!
//! All escape sequences and text for one frame accumulate here and hit
//! the terminal in a single write. Partial frames never reach the
//! screen, and the syscall count stays at one per frame regardless of
//! how many cells changed.

use std::io::{self, Write};

/// Growable byte buffer implementing [`io::Write`], flushed to stdout
/// in one call.
pub struct OutputBuffer {
    buffer: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write the buffered frame to stdout and clear the buffer. The
    /// buffer's capacity is kept for the next frame.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&self.buffer)?;
        stdout.flush()?;
        self.buffer.clear();
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_writes() {
        let mut output = OutputBuffer::new();
        assert!(output.is_empty());

        output.write_all(b"hello ").unwrap();
        output.write_all(b"world").unwrap();
        assert_eq!(output.len(), 11);
        assert_eq!(&output.buffer, b"hello world");
    }
}
