//! Querying and shrinking the kernel buffer behind a pipe endpoint.

use crate::{RawStdin, RawStdout};
use log::{info, warn};
#[cfg(not(windows))]
use std::os::unix::io::{AsRawFd, RawFd};
use std::{fmt, io};

/// The pipe buffer capacity the shim asks for: roughly 20 ms of
/// 48 kHz, 16-bit, stereo audio.
pub const TARGET_PIPE_SIZE: usize = 4096;

/// Access to the kernel buffer capacity of one end of a pipe.
///
/// On platforms without pipe capacity control, both methods fail with
/// `io::ErrorKind::Unsupported`.
pub trait PipeSize {
    /// Return the current capacity of the pipe, in bytes.
    fn pipe_size(&self) -> io::Result<usize>;

    /// Request a capacity of `size` bytes and return the capacity the kernel
    /// actually applied, which may be larger than requested.
    fn set_pipe_size(&self, size: usize) -> io::Result<usize>;
}

/// Which end of the shim an endpoint is.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Endpoint {
    /// The shim's standard input.
    Input,

    /// The shim's standard output.
    Output,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "STDIN",
            Self::Output => "STDOUT",
        })
    }
}

/// The result of [`adjust`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Adjustment {
    /// The capacity could not be queried, and was left alone.
    Unknown,

    /// The capacity was already at or below the target.
    Unchanged(usize),

    /// The capacity was reduced. `applied` is what the kernel reported, not
    /// what was requested.
    Reduced {
        /// The capacity before the request.
        from: usize,
        /// The capacity after the request.
        applied: usize,
    },

    /// The capacity exceeded the target but the reduction request failed.
    ReduceFailed {
        /// The capacity before the request.
        from: usize,
        /// The capacity which was requested.
        requested: usize,
    },
}

/// Shrink the pipe behind `handle` to `target` bytes if it is larger.
///
/// Every step is reported on the log, and no failure is fatal: an endpoint
/// which isn't a pipe, or a platform without capacity control, simply yields
/// [`Adjustment::Unknown`].
pub fn adjust<P: PipeSize + ?Sized>(handle: &P, endpoint: Endpoint, target: usize) -> Adjustment {
    let current = match handle.pipe_size() {
        Ok(size) => size,
        Err(e) => {
            warn!("failed to get pipe size for {}: {}", endpoint, e);
            return Adjustment::Unknown;
        }
    };

    if current <= target {
        info!("{} pipe size already {}", endpoint, current);
        return Adjustment::Unchanged(current);
    }

    info!(
        "reducing {} pipe from {} to {}...",
        endpoint, current, target
    );
    match handle.set_pipe_size(target) {
        Ok(applied) => {
            info!("{} pipe size is now {}", endpoint, applied);
            Adjustment::Reduced {
                from: current,
                applied,
            }
        }
        Err(e) => {
            warn!(
                "failed to set pipe size for {} to {}: {}",
                endpoint, target, e
            );
            Adjustment::ReduceFailed {
                from: current,
                requested: target,
            }
        }
    }
}

/// `fcntl(F_GETPIPE_SZ)` on `fd`.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn raw_fd_pipe_size(fd: RawFd) -> io::Result<usize> {
    let size = unsafe { libc::fcntl(fd, libc::F_GETPIPE_SZ) };
    if size < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(size as usize)
    }
}

/// `fcntl(F_SETPIPE_SZ)` on `fd`.
///
/// Linux rounds the request up to a power-of-two number of pages; the
/// returned value is the capacity actually applied.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn raw_fd_set_pipe_size(fd: RawFd, size: usize) -> io::Result<usize> {
    use std::convert::TryFrom;

    let arg = libc::c_int::try_from(size)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let applied = unsafe { libc::fcntl(fd, libc::F_SETPIPE_SZ, arg) };
    if applied < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(applied as usize)
    }
}

/// Pipe capacity isn't adjustable on this platform.
#[cfg(all(not(windows), not(any(target_os = "linux", target_os = "android"))))]
pub fn raw_fd_pipe_size(_fd: RawFd) -> io::Result<usize> {
    Err(unsupported())
}

/// Pipe capacity isn't adjustable on this platform.
#[cfg(all(not(windows), not(any(target_os = "linux", target_os = "android"))))]
pub fn raw_fd_set_pipe_size(_fd: RawFd, _size: usize) -> io::Result<usize> {
    Err(unsupported())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "pipe capacity control is not available on this platform",
    )
}

#[cfg(not(windows))]
impl PipeSize for RawStdin {
    #[inline]
    fn pipe_size(&self) -> io::Result<usize> {
        raw_fd_pipe_size(self.as_raw_fd())
    }

    #[inline]
    fn set_pipe_size(&self, size: usize) -> io::Result<usize> {
        raw_fd_set_pipe_size(self.as_raw_fd(), size)
    }
}

#[cfg(not(windows))]
impl PipeSize for RawStdout {
    #[inline]
    fn pipe_size(&self) -> io::Result<usize> {
        raw_fd_pipe_size(self.as_raw_fd())
    }

    #[inline]
    fn set_pipe_size(&self, size: usize) -> io::Result<usize> {
        raw_fd_set_pipe_size(self.as_raw_fd(), size)
    }
}

// Windows anonymous pipes take their buffer size at `CreatePipe` time, and an
// inherited one can't be resized.
#[cfg(windows)]
impl PipeSize for RawStdin {
    fn pipe_size(&self) -> io::Result<usize> {
        Err(unsupported())
    }

    fn set_pipe_size(&self, _size: usize) -> io::Result<usize> {
        Err(unsupported())
    }
}

#[cfg(windows)]
impl PipeSize for RawStdout {
    fn pipe_size(&self) -> io::Result<usize> {
        Err(unsupported())
    }

    fn set_pipe_size(&self, _size: usize) -> io::Result<usize> {
        Err(unsupported())
    }
}
