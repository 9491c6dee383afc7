//! Exec-style child process runner used by the command model backend.
//!
//! The child is spawned directly (no shell) and its stdout/stderr are
//! drained on dedicated threads into bounded buffers.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Cap on bytes kept from each of stdout / stderr (4 MiB).
const MAX_OUTPUT_BYTES: u64 = 4 * 1024 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output from a finished (or killed) child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed or ended by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}

/// Run `program` with `args`, killing it once `timeout` elapses.
///
/// Stdin is closed so a CLI waiting for interactive input ends immediately.
pub fn run_command<P, S>(
    program: P,
    args: &[S],
    timeout: Option<Duration>,
) -> std::io::Result<CommandOutput>
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout not captured"))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr not captured"))?;

    let stdout_reader = std::thread::spawn(move || read_bounded(stdout_pipe));
    let stderr_reader = std::thread::spawn(move || read_bounded(stderr_pipe));

    let (timed_out, exit_code) = wait_with_timeout(&mut child, timeout)?;

    let stdout = stdout_reader
        .join()
        .map_err(|e| std::io::Error::other(format!("stdout reader panicked: {e:?}")))??;
    let stderr = stderr_reader
        .join()
        .map_err(|e| std::io::Error::other(format!("stderr reader panicked: {e:?}")))??;

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
        timed_out,
    })
}

/// A child that exits right at the deadline may be reported as timed out.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<(bool, Option<i32>)> {
    let Some(limit) = timeout else {
        let status = child.wait()?;
        return Ok((false, status.code()));
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((false, status.code()));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok((true, None));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Keeps the first `MAX_OUTPUT_BYTES` and discards the rest so the child
/// never blocks on a full pipe.
fn read_bounded(mut reader: impl Read) -> std::io::Result<String> {
    let mut buf = Vec::new();
    (&mut reader).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf)?;
    std::io::copy(&mut reader, &mut std::io::sink())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run_command("echo", &["hello", "world"], None).unwrap();
        assert_eq!(out.stdout.trim(), "hello world");
        assert!(out.stderr.is_empty());
        assert!(out.success());
    }

    #[test]
    fn reports_nonzero_exit() {
        let out = run_command("false", &[] as &[&str], None).unwrap();
        assert_ne!(out.exit_code, Some(0));
        assert!(!out.success());
        assert!(!out.timed_out);
    }

    #[test]
    fn captures_stderr() {
        let out = run_command("sh", &["-c", "echo oops >&2"], None).unwrap();
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn stdin_is_closed() {
        let out = run_command("cat", &[] as &[&str], Some(Duration::from_secs(5))).unwrap();
        assert!(out.success());
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn kills_child_after_timeout() {
        let out = run_command("sleep", &["30"], Some(Duration::from_millis(200))).unwrap();
        assert!(out.timed_out);
        assert_eq!(out.exit_code, None);
        assert!(!out.success());
    }

    #[test]
    fn fast_child_finishes_within_timeout() {
        let out = run_command("true", &[] as &[&str], Some(Duration::from_secs(5))).unwrap();
        assert!(!out.timed_out);
        assert!(out.success());
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = run_command("recipe-vault-no-such-binary", &[] as &[&str], None).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
