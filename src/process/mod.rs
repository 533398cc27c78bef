//! Subprocess plumbing shared by the probe and `toolentry exec`.
//!
//! [`ServerCommand`] is a small fluent builder in the style of a command
//! builder: program, arguments, environment overlay, working directory and a
//! context label used in log lines. Spawning yields a [`RunningProcess`]
//! whose stdout and stderr are read by background tasks and delivered as
//! [`StreamEvent`] chunks over a single channel, so callers can `select!`
//! over output, exit and timers at once.
//!
//! # Termination
//!
//! On Unix every child is placed in its own process group. [`RunningProcess::terminate`]
//! sends `SIGTERM` to the whole group, waits [`TERMINATE_GRACE_PERIOD`],
//! then sends `SIGKILL` and reaps the child. On Windows the tree is killed
//! with `taskkill /T /F`. `kill_on_drop` stays enabled on every child.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;

use crate::constants::TERMINATE_GRACE_PERIOD;

#[cfg(unix)]
const ORPHAN_POLL_INTERVAL: Duration = Duration::from_millis(50);

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Chunks buffered between the output readers and the consumer. Readers
/// wait when it is full, which in turn blocks a child that floods its pipes.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A chunk of output read from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Bytes read from stdout
    Stdout(Vec<u8>),
    /// Bytes read from stderr
    Stderr(Vec<u8>),
}

/// Builder for a child process with piped stdio.
///
/// ```rust,ignore
/// use toolentry_cli::process::ServerCommand;
///
/// # async fn example() -> std::io::Result<()> {
/// let mut process = ServerCommand::new("npx")
///     .args(["@modelcontextprotocol/server-git", "/repo"])
///     .env("DEBUG", "1")
///     .with_context("git server")
///     .spawn()?;
/// process.terminate().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    env_vars: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
    context: Option<String>,
}

impl ServerCommand {
    /// Start building a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// The platform shell running `command_line` (`sh -c` or `cmd /C`).
    pub fn shell(command_line: impl Into<String>) -> Self {
        let (shell, flag) = crate::utils::platform::shell_invocation();
        Self::new(shell).arg(flag).arg(command_line)
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set several environment variables on top of the inherited environment.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run the child in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Label used as a prefix in log lines.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Program followed by its arguments, space separated.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the child with stdin, stdout and stderr piped.
    ///
    /// Output readers start immediately; their chunks arrive on
    /// [`RunningProcess::events`].
    pub fn spawn(self) -> std::io::Result<RunningProcess> {
        let label = self.context.clone().unwrap_or_else(|| self.program.clone());
        tracing::debug!(target: "process", "({}) Spawning: {}", label, self.command_line());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &self.env_vars {
            tracing::trace!(target: "process", "Setting env var: {}", key);
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        tracing::trace!(target: "process", "({}) Spawned pid {:?}", label, pid);

        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward(stdout, tx.clone(), StreamEvent::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward(stderr, tx, StreamEvent::Stderr));
        }
        let stdin = child.stdin.take();

        Ok(RunningProcess {
            child,
            stdin,
            events,
            pid,
            label,
            started: Instant::now(),
        })
    }
}

async fn forward<R>(
    mut reader: R,
    tx: mpsc::Sender<StreamEvent>,
    wrap: fn(Vec<u8>) -> StreamEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(wrap(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::trace!(target: "process", "Output reader stopped: {}", e);
                break;
            }
        }
    }
}

/// A spawned child owned by exactly one caller.
///
/// Fields are public so `select!` branches can borrow the child and the
/// event channel independently.
#[derive(Debug)]
pub struct RunningProcess {
    /// The child itself
    pub child: Child,
    /// Write end of the child's stdin, if still open
    pub stdin: Option<ChildStdin>,
    /// Output chunks; closes once both streams reach end of file
    pub events: mpsc::Receiver<StreamEvent>,
    pid: Option<u32>,
    label: String,
    started: Instant,
}

impl RunningProcess {
    /// Time since spawn.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the child has already exited (and been reaped).
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Stop the child and everything in its process group, then reap it.
    ///
    /// Returns once the child is no longer running. When the child already
    /// exited, whatever it left behind in its process group is still stopped.
    pub async fn terminate(&mut self) {
        self.stdin = None;
        if self.has_exited() {
            self.stop_orphans().await;
            return;
        }

        tracing::debug!(target: "process", "({}) Terminating pid {:?}", self.label, self.pid);
        self.signal_tree(false).await;

        if tokio::time::timeout(TERMINATE_GRACE_PERIOD, self.child.wait()).await.is_ok() {
            self.stop_orphans().await;
            return;
        }

        tracing::debug!(
            target: "process",
            "({}) Still running after {}ms, killing",
            self.label,
            TERMINATE_GRACE_PERIOD.as_millis()
        );
        self.signal_tree(true).await;
        if let Err(e) = self.child.start_kill() {
            tracing::trace!(target: "process", "start_kill: {}", e);
        }
        if let Err(e) = self.child.wait().await {
            tracing::warn!(target: "process", "({}) Failed to reap child: {}", self.label, e);
        }
    }

    /// Signal the group of an already reaped child until it is empty.
    #[cfg(unix)]
    async fn stop_orphans(&mut self) {
        if !self.group_signal(0) {
            return;
        }
        tracing::debug!(
            target: "process",
            "({}) Stopping leftover processes in group {:?}",
            self.label,
            self.pid
        );
        self.group_signal(libc::SIGTERM);

        let deadline = Instant::now() + TERMINATE_GRACE_PERIOD;
        while Instant::now() < deadline {
            tokio::time::sleep(ORPHAN_POLL_INTERVAL).await;
            if !self.group_signal(0) {
                return;
            }
        }
        self.group_signal(libc::SIGKILL);
    }

    #[cfg(windows)]
    async fn stop_orphans(&mut self) {}

    #[cfg(unix)]
    async fn signal_tree(&mut self, hard: bool) {
        self.group_signal(if hard { libc::SIGKILL } else { libc::SIGTERM });
    }

    /// `killpg` on the child's group; `false` once the group is empty.
    #[cfg(unix)]
    fn group_signal(&self, signal: libc::c_int) -> bool {
        let Some(pgid) = self.pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
            return false;
        };
        // SAFETY: the group id is the pid of a child we spawned with
        // `process_group(0)`; the kernel keeps it reserved while the group
        // has members.
        let rc = unsafe { libc::killpg(pgid, signal) };
        if rc == 0 {
            return true;
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::trace!(target: "process", "killpg({}, {}) failed: {}", pgid, signal, err);
        }
        false
    }

    #[cfg(windows)]
    async fn signal_tree(&mut self, hard: bool) {
        let Some(pid) = self.pid else {
            return;
        };
        if hard {
            return;
        }
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = status {
            tracing::trace!(target: "process", "taskkill failed: {}", e);
        }
    }

    /// Collect whatever output is still in flight.
    ///
    /// Stops when both streams are closed, when no chunk arrives for `idle`,
    /// or after ten idle windows in total.
    pub async fn drain(&mut self, output: &mut CapturedOutput, idle: Duration) {
        let deadline = Instant::now() + idle * 10;
        loop {
            let wait = idle.min(deadline.saturating_duration_since(Instant::now()));
            match tokio::time::timeout(wait, self.events.recv()).await {
                Ok(Some(event)) => output.push(event),
                _ => break,
            }
        }
    }
}

/// Exit code and terminating signal of a finished child.
#[must_use]
pub fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status);
    #[cfg(not(unix))]
    let signal = None;
    (status.code(), signal)
}

/// Byte buffer that keeps at most `limit` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBuffer {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl BoundedBuffer {
    /// Empty buffer holding at most `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    /// Append `chunk`, dropping whatever exceeds the limit.
    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    /// Whether any bytes were dropped.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Contents decoded as UTF-8, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Bounded stdout and stderr of one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Captured stdout
    pub stdout: BoundedBuffer,
    /// Captured stderr
    pub stderr: BoundedBuffer,
}

impl CapturedOutput {
    /// Empty capture with `limit` bytes per stream.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            stdout: BoundedBuffer::new(limit),
            stderr: BoundedBuffer::new(limit),
        }
    }

    /// Route one event into the matching buffer.
    pub fn push(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Stdout(chunk) => self.stdout.push(&chunk),
            StreamEvent::Stderr(chunk) => self.stderr.push(&chunk),
        }
    }

    /// Trimmed stdout, or trimmed stderr when stdout is blank.
    #[must_use]
    pub fn preferred_text(&self) -> String {
        let stdout = self.stdout.text();
        let stdout = stdout.trim();
        if stdout.is_empty() {
            self.stderr.text().trim().to_string()
        } else {
            stdout.to_string()
        }
    }
}
