//! Low-latency relaying between pipes.
//!
//! A full pipe buffer is latency: a consumer that reads as fast as it plays
//! audio still sees each byte only after everything queued ahead of it. This
//! crate shrinks the kernel buffers of the pipes on either side of a process
//! to [`TARGET_PIPE_SIZE`] and copies between them one chunk at a time with
//! no userspace buffering.

#![deny(missing_docs)]

mod pipe_size;
mod raw_stdio;
mod relay;
mod status;

#[cfg(not(windows))]
pub use pipe_size::{raw_fd_pipe_size, raw_fd_set_pipe_size};
pub use pipe_size::{adjust, Adjustment, Endpoint, PipeSize, TARGET_PIPE_SIZE};
pub use raw_stdio::{RawStdin, RawStdout};
pub use relay::{classify, relay, Relay};
pub use status::Termination;
