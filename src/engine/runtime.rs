// src/engine/runtime.rs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::exec::ShellBridge;
use crate::watch::{decode, EventRecord, NotifyChannel, WatchRegistry, EVENT_BUFFER_LEN};

/// The main orchestration loop.
///
/// Responsibilities:
/// - Await one read at a time from the notification channel.
/// - Demultiplex each raw buffer into records and classify them.
/// - For each record that resolves to a watched path, feed the configured
///   command to the shell bridge and re-arm the path's watch.
/// - Tear the shell bridge down exactly once, on every exit path.
///
/// At most one command is ever outstanding against the shell: the loop
/// finishes each dispatch (write, reply, re-arm) before touching the
/// notification channel again. There is no timeout on the shell reply; a
/// non-responsive shell stalls the loop, and only a fatal read fault, watch
/// exhaustion, or Ctrl-C ends it.
pub struct Runtime {
    channel: NotifyChannel,
    registry: WatchRegistry,
    bridge: ShellBridge,
    command: String,
}

impl Runtime {
    pub fn new(
        channel: NotifyChannel,
        registry: WatchRegistry,
        bridge: ShellBridge,
        command: String,
    ) -> Self {
        Self {
            channel,
            registry,
            bridge,
            command,
        }
    }

    /// Run until a fatal fault, watch exhaustion, or Ctrl-C.
    ///
    /// The shell bridge is shut down before this returns, whatever the
    /// outcome; a teardown failure is logged rather than allowed to mask
    /// the loop's own result.
    pub async fn run(mut self) -> Result<()> {
        info!("watchsh runtime started");

        let outcome = self.watch_loop().await;

        if let Err(err) = self.bridge.shutdown().await {
            warn!(error = %err, "failed to shut down shell bridge cleanly");
        }

        info!("watchsh runtime exiting");
        outcome
    }

    async fn watch_loop(&mut self) -> Result<()> {
        let mut buf = vec![0u8; EVENT_BUFFER_LEN];

        loop {
            info!("watching for changes");

            let read = tokio::select! {
                read = self.channel.read_events(&mut buf) => read,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, shutting down");
                    return Ok(());
                }
            };

            let count = read.context("reading from the notification channel")?;
            if count == 0 {
                return Err(anyhow!("notification channel returned end of stream"));
            }
            debug!(bytes = count, "notification buffer read");

            self.drain_records(count, &buf).await?;
        }
    }

    /// Dispatch records as they are decoded from one read's buffer.
    ///
    /// Structural decode errors (truncation, overrun) mean every later
    /// offset in the buffer is suspect, so they abort the loop; per-record
    /// classification problems are merely logged inside `dispatch`.
    async fn drain_records(&mut self, count: usize, buf: &[u8]) -> Result<()> {
        for record in decode(&buf[..count]) {
            let record = record.context("demultiplexing notification records")?;
            self.dispatch(record).await?;
        }
        Ok(())
    }

    async fn dispatch(&mut self, record: EventRecord) -> Result<()> {
        if record.is_directory_scoped() {
            warn!(
                wd = record.wd.as_raw(),
                name = ?record.name,
                "ignoring event for a directory child; watch the file itself instead"
            );
            return Ok(());
        }

        let Some(path) = self.registry.resolve(record.wd) else {
            warn!(
                wd = record.wd.as_raw(),
                "event for an unknown watch descriptor, skipping"
            );
            return Ok(());
        };
        let path = path.to_path_buf();

        info!(path = %path.display(), wd = record.wd.as_raw(), "handling file update");

        let command = render_command(&self.command, &path);
        let reply = self.bridge.handle(&command).await?;
        if reply.is_empty() {
            debug!(path = %path.display(), "shell produced no reply");
        } else {
            info!(reply = %reply.trim_end(), "shell reply");
        }

        // Delivery is single-shot per registration in this design: the watch
        // must be re-armed after every event, not just at startup.
        match self.registry.rearm(&self.channel, &path) {
            Ok(wd) => {
                debug!(path = %path.display(), wd = wd.as_raw(), "re-armed watch");
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "could not re-arm watch; dropping path"
                );
                if self.registry.is_exhausted() {
                    return Err(anyhow!("ran out of paths to watch"));
                }
            }
        }

        Ok(())
    }
}

/// Substitute the changed path into the configured command line.
///
/// A literal `{path}` placeholder is replaced with the path's display form;
/// a command without the placeholder is sent as-is.
pub fn render_command(template: &str, path: &Path) -> String {
    if template.contains("{path}") {
        template.replace("{path}", &path.display().to_string())
    } else {
        template.to_string()
    }
}
