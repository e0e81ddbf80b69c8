//! Unbuffered handles on the process's standard input and output.
//!
//! `std::io::Stdin` sits behind an internal `BufReader` and `std::io::Stdout`
//! behind a `LineWriter`, and either one can hold bytes back from the pipe.
//! The types here issue exactly one OS read or write per call instead.

#[cfg(not(windows))]
use std::os::unix::io::{AsRawFd, RawFd};
#[cfg(windows)]
use std::{
    fs::File,
    mem::ManuallyDrop,
    os::windows::io::{AsRawHandle, FromRawHandle, RawHandle},
};
use std::io;

/// Reads from the process's standard input with no userspace buffering.
///
/// Dropping a `RawStdin` does not close the underlying handle.
pub struct RawStdin {
    #[cfg(not(windows))]
    fd: RawFd,
    #[cfg(windows)]
    file: ManuallyDrop<File>,
}

/// Writes to the process's standard output with no userspace buffering.
///
/// Dropping a `RawStdout` does not close the underlying handle.
pub struct RawStdout {
    #[cfg(not(windows))]
    fd: RawFd,
    #[cfg(windows)]
    file: ManuallyDrop<File>,
}

#[cfg(not(windows))]
impl RawStdin {
    /// Construct a new `RawStdin` on the process's stdin file descriptor.
    pub fn new() -> Self {
        Self {
            fd: io::stdin().as_raw_fd(),
        }
    }
}

#[cfg(not(windows))]
impl RawStdout {
    /// Construct a new `RawStdout` on the process's stdout file descriptor.
    pub fn new() -> Self {
        Self {
            fd: io::stdout().as_raw_fd(),
        }
    }
}

#[cfg(windows)]
impl RawStdin {
    /// Construct a new `RawStdin` on the process's standard input handle.
    pub fn new() -> Self {
        // The `File` is never dropped, so the handle stays owned by the
        // process.
        let file = unsafe { File::from_raw_handle(io::stdin().as_raw_handle()) };
        Self {
            file: ManuallyDrop::new(file),
        }
    }
}

#[cfg(windows)]
impl RawStdout {
    /// Construct a new `RawStdout` on the process's standard output handle.
    pub fn new() -> Self {
        let file = unsafe { File::from_raw_handle(io::stdout().as_raw_handle()) };
        Self {
            file: ManuallyDrop::new(file),
        }
    }
}

impl Default for RawStdin {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RawStdout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(windows))]
impl io::Read for RawStdin {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_fd(self.fd, buf)
    }
}

#[cfg(windows)]
impl io::Read for RawStdin {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut *self.file, buf)
    }
}

#[cfg(not(windows))]
impl io::Write for RawStdout {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        write_fd(self.fd, buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(windows)]
impl io::Write for RawStdout {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.file, buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(not(windows))]
impl AsRawFd for RawStdin {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

#[cfg(not(windows))]
impl AsRawFd for RawStdout {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

#[cfg(windows)]
impl AsRawHandle for RawStdin {
    #[inline]
    fn as_raw_handle(&self) -> RawHandle {
        self.file.as_raw_handle()
    }
}

#[cfg(windows)]
impl AsRawHandle for RawStdout {
    #[inline]
    fn as_raw_handle(&self) -> RawHandle {
        self.file.as_raw_handle()
    }
}

/// A single `read(2)`. `EINTR` is surfaced as `ErrorKind::Interrupted`
/// rather than retried.
#[cfg(not(windows))]
pub(crate) fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// A single `write(2)`. With `SIGPIPE` ignored, which the Rust runtime
/// arranges before `main`, a closed reader shows up as
/// `ErrorKind::BrokenPipe`.
#[cfg(not(windows))]
pub(crate) fn write_fd(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    let n = unsafe { libc::write(fd, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}
