use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::{
    fs,
    io::{BufRead, BufReader, Write},
    process::{Child, Command, Output, Stdio},
    thread,
};

fn shim() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pipeshim"));
    command
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

/// Feed `input` from a separate thread so that a full output pipe can't
/// deadlock the test, ignoring write errors from an early exit.
fn feed(child: &mut Child, input: Vec<u8>) -> thread::JoinHandle<()> {
    let mut stdin = child.stdin.take().unwrap();
    thread::spawn(move || {
        let _ = stdin.write_all(&input);
    })
}

fn run_with(input: Vec<u8>) -> anyhow::Result<Output> {
    let mut child = shim().spawn()?;
    let feeder = feed(&mut child, input);
    let output = child.wait_with_output()?;
    feeder.join().unwrap();
    Ok(output)
}

#[test]
fn test_hello_world() -> anyhow::Result<()> {
    let output = run_with(b"hello world".to_vec())?;
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello world");

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("audio pipeline shim starting"));
    assert!(stderr.contains("first data received (11 bytes)"));
    assert!(!stderr.contains("stream error"));
    Ok(())
}

#[test]
fn test_one_mebibyte() -> anyhow::Result<()> {
    let mut data = vec![0_u8; 1 << 20];
    StdRng::seed_from_u64(20).fill_bytes(&mut data);

    let output = run_with(data.clone())?;
    assert!(output.status.success());
    assert_eq!(output.stdout.len(), data.len());
    assert!(output.stdout == data);
    Ok(())
}

#[test]
fn test_upstream_closes_without_data() -> anyhow::Result<()> {
    let output = run_with(Vec::new())?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("waiting for first data"));
    assert!(!stderr.contains("first data received"));
    assert!(!stderr.contains("stream error"));
    Ok(())
}

#[test]
fn test_downstream_closes_early() -> anyhow::Result<()> {
    let mut child = shim().spawn()?;
    drop(child.stdout.take());

    let feeder = feed(&mut child, vec![b'x'; 1 << 20]);
    let output = child.wait_with_output()?;
    feeder.join().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(!stderr.contains("stream error"));
    Ok(())
}

#[test]
fn test_stdin_not_a_pipe() -> anyhow::Result<()> {
    let expected = fs::read("Cargo.toml")?;
    let output = shim()
        .stdin(fs::File::open("Cargo.toml")?)
        .spawn()?
        .wait_with_output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout, expected);

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("failed to get pipe size for STDIN"));
    Ok(())
}

#[cfg(not(windows))]
#[test]
fn test_stream_error_is_reported() -> anyhow::Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let read_only = fs::File::open(file.path())?;

    let mut child = shim().stdout(read_only).spawn()?;
    let feeder = feed(&mut child, b"hello world".to_vec());
    let output = child.wait_with_output()?;
    feeder.join().unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("failed to get pipe size for STDOUT"));
    assert!(stderr.contains("stream error"), "{}", stderr);
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn test_pipes_are_shrunk() -> anyhow::Result<()> {
    let output = run_with(b"x".to_vec())?;
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    // Linux pipes start out at 16 pages.
    for endpoint in &["STDIN", "STDOUT"] {
        assert!(
            stderr.contains(&format!("reducing {} pipe from", endpoint)),
            "no reduction requested for {}: {}",
            endpoint,
            stderr
        );
        assert!(
            stderr.contains(&format!("{} pipe size is now ", endpoint)),
            "no applied size reported for {}: {}",
            endpoint,
            stderr
        );
    }
    Ok(())
}

#[cfg(not(windows))]
#[test]
fn test_interrupt_is_clean() -> anyhow::Result<()> {
    let mut child = shim().spawn()?;
    let mut stderr = BufReader::new(child.stderr.take().unwrap());

    let mut line = String::new();
    loop {
        line.clear();
        if stderr.read_line(&mut line)? == 0 {
            anyhow::bail!("shim exited before waiting for data");
        }
        if line.contains("waiting for first data") {
            break;
        }
    }

    assert_eq!(unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) }, 0);
    let status = child.wait()?;
    assert!(status.success());

    let mut rest = String::new();
    std::io::Read::read_to_string(&mut stderr, &mut rest)?;
    assert!(!rest.contains("stream error"));
    Ok(())
}
