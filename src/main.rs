//! Sits between an audio producer and consumer, e.g.
//! `encoder | pipeshim | aplay`, shrinking both pipes and relaying bytes
//! without buffering them.

use anyhow::Context;
use log::{debug, error, info};
use pipeshim::{adjust, Endpoint, RawStdin, RawStdout, Relay, TARGET_PIPE_SIZE};
use std::{io::Write, process};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "pipeshim: {}", record.args()))
        .init();

    info!("audio pipeline shim starting...");

    // A blocked read can't observe a flag, so an interrupt ends the process
    // directly.
    ctrlc::set_handler(|| {
        debug!("interrupted, exiting");
        process::exit(0);
    })
    .context("failed to install interrupt handler")?;

    let input = RawStdin::new();
    let output = RawStdout::new();
    adjust(&input, Endpoint::Input, TARGET_PIPE_SIZE);
    adjust(&output, Endpoint::Output, TARGET_PIPE_SIZE);

    info!("starting stream copy...");
    info!("waiting for first data...");

    let mut relay = Relay::new(input, output);
    match relay.run() {
        Ok(termination) => debug!(
            "{} after {} bytes",
            termination,
            relay.bytes_forwarded()
        ),
        Err(e) => error!("stream error: {}", e),
    }

    Ok(())
}
