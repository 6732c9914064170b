// src/exec/shell.rs

use std::io;
use std::os::fd::{FromRawFd, OwnedFd};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info};

use crate::config::ShellConfig;

/// A persistent interactive shell wired to the watcher over two pipes.
///
/// Commands flow in over the child's stdin; replies flow back over a single
/// pipe that carries both the child's stdout and stderr. Replies are framed
/// by a sentinel line `handle` appends after every command, so one call
/// reads exactly one command's output.
///
/// The child must not outlive the watcher: it is spawned with
/// `PR_SET_PDEATHSIG` so the kernel delivers SIGTERM if the parent dies
/// first, and `kill_on_drop` backs that up if the bridge is dropped without
/// an explicit [`shutdown`](ShellBridge::shutdown).
pub struct ShellBridge {
    child: Child,
    commands: ChildStdin,
    replies: Lines<BufReader<pipe::Receiver>>,
    seq: u64,
}

impl std::fmt::Debug for ShellBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellBridge")
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

impl ShellBridge {
    /// Spawn the configured shell.
    ///
    /// The reply pipe is created first; its write end is duplicated so that
    /// both stdout and stderr of the child land on the same pipe. All ends
    /// are held as `OwnedFd`/`Stdio` values, so a failure at any point here
    /// (pipe creation, duplication, spawn) releases every descriptor
    /// acquired so far on the way out. After a successful spawn the parent
    /// keeps only the command writer and the reply reader.
    pub fn spawn(shell: &ShellConfig) -> Result<Self> {
        let (reply_rx, reply_tx) = reply_pipe().context("creating reply pipe")?;
        let stderr_tx = reply_tx
            .try_clone()
            .context("duplicating reply pipe write end")?;

        let mut cmd = Command::new(&shell.program);
        cmd.args(&shell.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(reply_tx))
            .stderr(Stdio::from(stderr_tx))
            .kill_on_drop(true);

        // Ask the kernel to SIGTERM the shell if the watcher dies first.
        // SAFETY: prctl with PR_SET_PDEATHSIG is async-signal-safe, which is
        // all that is allowed between fork and exec.
        unsafe {
            cmd.pre_exec(|| {
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) != 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning shell '{}'", shell.program))?;

        info!(shell = %shell.program, pid = ?child.id(), "shell bridge started");

        let commands = child.stdin.take().context("child stdin pipe missing")?;
        let replies = pipe::Receiver::from_owned_fd(reply_rx)
            .context("registering reply pipe with the reactor")?;

        Ok(Self {
            child,
            commands,
            replies: BufReader::new(replies).lines(),
            seq: 0,
        })
    }

    /// OS process id of the shell, if it is still running.
    pub fn process_id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Send one command line to the shell and read back its reply.
    ///
    /// The command is followed by an `echo` of a per-call sentinel; the
    /// reply is everything the shell prints (stdout and stderr alike) up to
    /// that sentinel line. There is no timeout: a shell that never prints
    /// the sentinel stalls the caller, and a shell that closes its output
    /// pipe mid-reply is an error.
    pub async fn handle(&mut self, command: &str) -> Result<String> {
        self.seq += 1;
        let sentinel = format!("__watchsh_done_{}__", self.seq);

        let request = format!("{command}\necho {sentinel}\n");
        self.commands
            .write_all(request.as_bytes())
            .await
            .context("writing command to shell stdin")?;
        self.commands
            .flush()
            .await
            .context("flushing shell stdin")?;
        debug!(command = %command, "command sent to shell");

        let mut reply = String::new();
        loop {
            match self
                .replies
                .next_line()
                .await
                .context("reading shell reply")?
            {
                Some(line) if line == sentinel => break,
                Some(line) => {
                    reply.push_str(&line);
                    reply.push('\n');
                }
                None => bail!("shell closed its output pipe mid-reply"),
            }
        }

        Ok(reply)
    }

    /// Kill the shell and wait for it to be reaped.
    ///
    /// Consuming `self` makes teardown exactly-once by construction; every
    /// exit path of the main loop funnels through here, so no zombie or
    /// orphan shell remains afterwards.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Err(err) = self.child.start_kill() {
            // Already gone; wait() below still reaps it.
            debug!(error = %err, "shell exited before explicit kill");
        }
        let status = self
            .child
            .wait()
            .await
            .context("reaping shell process")?;
        info!(?status, "shell bridge shut down");
        Ok(())
    }
}

/// Create the reply pipe as a pair of owned descriptors (read end, write
/// end), closed automatically wherever they go out of scope.
fn reply_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0; 2];
    // SAFETY: fds points at two writable ints; pipe2 fills both on success.
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: on success both descriptors are open and owned by us alone.
    let read = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let write = unsafe { OwnedFd::from_raw_fd(fds[1]) };
    Ok((read, write))
}
