#![no_main]
use libfuzzer_sys::fuzz_target;
use pipeshim::{relay, Termination, TARGET_PIPE_SIZE};
use std::io;

/// Yields its input in pieces whose sizes come from the fuzz input.
struct Pieces<'a> {
    data: &'a [u8],
    sizes: &'a [u8],
    next: usize,
}

impl<'a> io::Read for Pieces<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        assert!(buf.len() <= TARGET_PIPE_SIZE);
        let size = if self.sizes.is_empty() {
            buf.len()
        } else {
            usize::from(self.sizes[self.next % self.sizes.len()]) * 17 + 1
        };
        self.next += 1;
        let n = size.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fuzz_target!(|input: &[u8]| {
    let split = input.first().map_or(0, |&b| usize::from(b)).min(input.len());
    let (sizes, data) = input.split_at(split);
    let reader = Pieces {
        data,
        sizes,
        next: 0,
    };
    let mut out = Vec::new();
    assert_eq!(relay(reader, &mut out).unwrap(), Termination::EndOfInput);
    assert_eq!(out, data);
});
