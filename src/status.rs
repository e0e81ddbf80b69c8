use std::fmt;

/// How a relay came to an end without an unexpected I/O failure.
///
/// Unexpected failures are not represented here; they remain
/// [`std::io::Error`]s so that callers can report their detail.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Termination {
    /// The input stream reached its end, and everything read from it was
    /// forwarded.
    EndOfInput,

    /// The downstream consumer closed its end of the output stream.
    BrokenPipe,

    /// A read or write was interrupted, as by a user-requested cancellation.
    Interrupted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EndOfInput => "end of input",
            Self::BrokenPipe => "output closed by consumer",
            Self::Interrupted => "interrupted",
        })
    }
}

#[test]
fn test_termination_display() {
    assert_eq!(Termination::EndOfInput.to_string(), "end of input");
    assert_eq!(Termination::BrokenPipe.to_string(), "output closed by consumer");
    assert_eq!(Termination::Interrupted.to_string(), "interrupted");
}
