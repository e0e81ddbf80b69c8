use crate::{Termination, TARGET_PIPE_SIZE};
use log::{debug, info};
use std::io;

/// Copies bytes from a reader to a writer one chunk at a time, holding no
/// more than a single chunk of at most [`TARGET_PIPE_SIZE`] bytes.
///
/// Each chunk is written out in full before the next read is issued, so the
/// added latency is bounded by one chunk. `Relay` does not wrap either end in
/// a buffered adapter; pair it with [`RawStdin`] and [`RawStdout`] to get one
/// system call per read and per write.
///
/// [`RawStdin`]: crate::RawStdin
/// [`RawStdout`]: crate::RawStdout
pub struct Relay<R: io::Read, W: io::Write> {
    reader: R,
    writer: W,
    bytes_forwarded: u64,
    chunks_forwarded: u64,
    saw_first_data: bool,
}

impl<R: io::Read, W: io::Write> Relay<R, W> {
    /// Construct a new `Relay` from `reader` to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            bytes_forwarded: 0,
            chunks_forwarded: 0,
            saw_first_data: false,
        }
    }

    /// Forward chunks until the input ends or an I/O condition stops the
    /// relay.
    ///
    /// End of input, a consumer closing the output, and an interrupted call
    /// all return `Ok`. Nothing is retried. Any other failure is returned as
    /// the `Err` for the caller to report.
    pub fn run(&mut self) -> io::Result<Termination> {
        let mut buf = [0_u8; TARGET_PIPE_SIZE];
        let termination = loop {
            let size = match self.reader.read(&mut buf) {
                Ok(0) => break Termination::EndOfInput,
                Ok(size) => size,
                Err(e) => break classify(e)?,
            };

            if !self.saw_first_data {
                info!("first data received ({} bytes)!", size);
                self.saw_first_data = true;
            }

            if let Err(e) = write_chunk(&mut self.writer, &buf[..size]) {
                break classify(e)?;
            }
            self.chunks_forwarded += 1;
            self.bytes_forwarded += size as u64;
        };

        debug!(
            "relay stopped ({}) after {} bytes in {} chunks",
            termination, self.bytes_forwarded, self.chunks_forwarded
        );
        Ok(termination)
    }

    /// The number of bytes written to the output so far.
    #[inline]
    pub fn bytes_forwarded(&self) -> u64 {
        self.bytes_forwarded
    }

    /// The number of complete chunks written to the output so far.
    #[inline]
    pub fn chunks_forwarded(&self) -> u64 {
        self.chunks_forwarded
    }

    /// Consume the relay and return the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Shorthand for `Relay::new(reader, writer).run()`.
pub fn relay<R: io::Read, W: io::Write>(reader: R, writer: W) -> io::Result<Termination> {
    Relay::new(reader, writer).run()
}

/// Sort an I/O error into an expected `Termination` or an error to report.
pub fn classify(e: io::Error) -> io::Result<Termination> {
    match e.kind() {
        io::ErrorKind::BrokenPipe => Ok(Termination::BrokenPipe),
        io::ErrorKind::Interrupted => Ok(Termination::Interrupted),
        _ => Err(e),
    }
}

/// Write all of `buf`, continuing after short writes. Unlike
/// `io::Write::write_all`, an `Interrupted` error is returned rather than
/// retried.
fn write_chunk<W: io::Write + ?Sized>(writer: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match writer.write(buf)? {
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole chunk",
                ));
            }
            n => buf = &buf[n..],
        }
    }
    Ok(())
}
