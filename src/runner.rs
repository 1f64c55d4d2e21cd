//! Child process spawning and line-by-line output relay.
//!
//! The runner executes the monitored command under `/bin/sh -c`, mirrors every
//! output line to the controlling terminal as it arrives, and hands tagged
//! lines to the monitor over a channel. The relay lives on its own tasks so
//! the child is never stalled while the monitor is waiting on the user or on
//! a provider call; lines produced during those waits queue in the channel
//! and are classified once the monitor resumes.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Which stream of the child a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One line of child output, tagged with its stream and arrival order
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
    pub seq: u64,
}

/// The child could not be started at all
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed to spawn `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Shell-convention exit code for a spawn failure
    pub fn exit_code(&self) -> i32 {
        match self {
            SpawnError::NotFound(_) => 127,
            SpawnError::PermissionDenied(_) => 126,
            SpawnError::Io { .. } => 1,
        }
    }
}

/// A running monitored command
pub struct ProcessRunner {
    child: Child,
    lines: mpsc::UnboundedReceiver<OutputLine>,
}

impl ProcessRunner {
    /// Spawn `command` under `/bin/sh -c`, inheriting the environment.
    ///
    /// stdin is redirected to /dev/null so the confirmation prompt owns the
    /// terminal's input. Both output streams are piped and relayed.
    pub fn spawn(command: &str) -> Result<Self, SpawnError> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => SpawnError::NotFound(command.to_string()),
                std::io::ErrorKind::PermissionDenied => {
                    SpawnError::PermissionDenied(command.to_string())
                }
                _ => SpawnError::Io {
                    command: command.to_string(),
                    source: err,
                },
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SpawnError::Io {
            command: command.to_string(),
            source: std::io::Error::other("child stdout not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SpawnError::Io {
            command: command.to_string(),
            source: std::io::Error::other("child stderr not captured"),
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let seq = Arc::new(AtomicU64::new(0));

        Self::relay(stdout, StreamKind::Stdout, tx.clone(), Arc::clone(&seq));
        Self::relay(stderr, StreamKind::Stderr, tx, seq);

        Ok(Self { child, lines: rx })
    }

    /// Spawn a reader task that echoes lines and forwards them on the channel
    fn relay<R>(
        reader: R,
        stream: StreamKind,
        tx: mpsc::UnboundedSender<OutputLine>,
        seq: Arc<AtomicU64>,
    ) where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                match stream {
                    StreamKind::Stdout => println!("{text}"),
                    StreamKind::Stderr => eprintln!("{text}"),
                }
                let line = OutputLine {
                    stream,
                    text,
                    seq: seq.fetch_add(1, Ordering::Relaxed),
                };
                // Receiver dropped means the monitor is gone; stop relaying.
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }

    /// Next relayed line, or None once both streams have closed
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.recv().await
    }

    /// Wait for the child to exit and return its exit code.
    ///
    /// On Unix a signal death maps to `128 + signal`, matching the shell.
    pub async fn wait(&mut self) -> std::io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(exit_code_of(status))
    }

    /// Terminate the child (used on Ctrl-C)
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_relays_stdout_lines() {
        let mut runner = ProcessRunner::spawn("echo one; echo two").unwrap();

        let first = runner.next_line().await.unwrap();
        assert_eq!(first.stream, StreamKind::Stdout);
        assert_eq!(first.text, "one");

        let second = runner.next_line().await.unwrap();
        assert_eq!(second.text, "two");

        assert!(runner.next_line().await.is_none());
        assert_eq!(runner.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawn_tags_stderr_lines() {
        let mut runner = ProcessRunner::spawn("echo oops 1>&2").unwrap();

        let line = runner.next_line().await.unwrap();
        assert_eq!(line.stream, StreamKind::Stderr);
        assert_eq!(line.text, "oops");
    }

    #[tokio::test]
    async fn test_exit_code_propagates() {
        let mut runner = ProcessRunner::spawn("exit 3").unwrap();
        while runner.next_line().await.is_some() {}
        assert_eq!(runner.wait().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let mut runner = ProcessRunner::spawn("echo a; echo b; echo c").unwrap();
        let mut last = None;
        while let Some(line) = runner.next_line().await {
            if let Some(prev) = last {
                assert!(line.seq > prev);
            }
            last = Some(line.seq);
        }
    }

    #[test]
    fn test_spawn_error_exit_codes() {
        assert_eq!(SpawnError::NotFound("x".into()).exit_code(), 127);
        assert_eq!(SpawnError::PermissionDenied("x".into()).exit_code(), 126);
    }
}
