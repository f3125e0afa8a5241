//! One-shot subprocess runner shared by the handshake and conversions.
//!
//! stdin is fed on its own thread while stdout and stderr drain on two
//! more, so a child that writes before it has read all input cannot
//! deadlock against us. The exit wait is bounded by a deadline; on expiry
//! the child's whole process group is killed and the child reaped, so
//! helpers it started cannot hold the pipes open past the deadline.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ClientError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Exit code, or -1 when the child was terminated by a signal.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(io::Error),
    Io(io::Error),
    TimedOut,
}

impl RunError {
    pub fn into_client_error(self, timeout: Duration) -> ClientError {
        match self {
            Self::Spawn(source) => ClientError::ProcessStartFailed { source, zpl: None },
            Self::Io(source) => ClientError::Io { source, zpl: None },
            Self::TimedOut => ClientError::ProcessTimeout { timeout, zpl: None },
        }
    }
}

/// Run `program args...`, writing `input` (if any) to its stdin.
pub(crate) fn run(
    program: &Path,
    args: &[&str],
    input: Option<&[u8]>,
    timeout: Duration,
) -> Result<ProcessOutput, RunError> {
    log::debug!(
        "spawning {} with {} argument(s), {} input byte(s)",
        program.display(),
        args.len(),
        input.map_or(0, <[u8]>::len)
    );

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Leader of a fresh group, so a timeout can take down its children too
        command.process_group(0);
    }
    let mut child = command.spawn().map_err(RunError::Spawn)?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| {
        let writer = scope.spawn(move || feed(stdin, input.unwrap_or_default()));
        let out_reader = scope.spawn(move || drain(stdout));
        let err_reader = scope.spawn(move || drain(stderr));

        let status = wait_with_deadline(&mut child, timeout);

        // Joins only fail if a pipe thread panicked, which would be a bug here.
        let written = writer.join().unwrap_or_else(|_| Err(panicked()));
        let stdout = out_reader.join().unwrap_or_else(|_| Err(panicked()));
        let stderr = err_reader.join().unwrap_or_else(|_| Err(panicked()));

        let status = status?;
        written.map_err(RunError::Io)?;

        Ok(ProcessOutput {
            status,
            stdout: stdout.map_err(RunError::Io)?,
            stderr: stderr.map_err(RunError::Io)?,
        })
    })
}

fn feed(stdin: Option<impl Write>, input: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(input).and_then(|_| stdin.flush()) {
        // The child stopped reading; its exit status tells the real story.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
    // stdin drops here, signalling end of input
}

fn drain(pipe: Option<impl Read>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<ExitStatus, RunError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                kill_group(child);
                return Err(RunError::Io(e));
            }
        }
        if Instant::now() >= deadline {
            log::warn!("subprocess exceeded {}ms, killing it", timeout.as_millis());
            kill_group(child);
            return Err(RunError::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and everything in its process group, then reap the child.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child is unreaped here, so its pid still names its group.
        let pgid = child.id() as libc::pid_t;
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    // Fails if the child already exited; reaping still applies
    let _ = child.kill();
    let _ = child.wait();
}

fn panicked() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "pipe thread panicked")
}
