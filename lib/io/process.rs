use super::{Io, Pipe};
use anyhow::{bail, Context, Error as Anyhow};
use async_trait::async_trait;
use std::{io, time::Duration};
use tokio::time::timeout;
use tracing::{field::display, instrument, warn, Span};

#[cfg(test)]
#[async_trait]
#[mockall::automock]
trait Child {
    async fn wait(&mut self) -> io::Result<String>;
    async fn kill(&mut self) -> io::Result<()>;
}

/// An [`Io`] interface for a remote process.
#[derive(Debug)]
pub struct Process {
    #[cfg(test)]
    pipe: Pipe<tokio::io::DuplexStream, tokio::io::DuplexStream>,

    #[cfg(not(test))]
    pipe: Pipe<tokio::process::ChildStdin, tokio::process::ChildStdout>,

    #[cfg(test)]
    child: MockChild,

    #[cfg(not(test))]
    child: tokio::process::Child,
}

impl Process {
    #[cfg(test)]
    const TIMEOUT: Duration = Duration::ZERO;

    #[cfg(not(test))]
    const TIMEOUT: Duration = Duration::from_millis(1000);

    /// Spawns a remote process.
    ///
    /// The process is killed if the handle is dropped before [`Process::shutdown`] completes.
    #[instrument(level = "debug", err)]
    pub fn spawn(path: &str) -> io::Result<Self> {
        #[cfg(test)]
        {
            Ok(Process {
                pipe: tokio::io::duplex(1).into(),
                child: MockChild::new(),
            })
        }

        #[cfg(not(test))]
        {
            let mut child = tokio::process::Command::new(path)
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            let pipe = Option::zip(child.stdin.take(), child.stdout.take()).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Other,
                    Anyhow::msg("failed to open the remote process' stdio"),
                )
            })?;

            Ok(Process {
                pipe: pipe.into(),
                child,
            })
        }
    }

    /// Flushes the outbound buffer and waits for the remote process to exit.
    ///
    /// The process is killed if it doesn't exit within a second.
    #[instrument(level = "debug", skip(self), err, fields(status))]
    pub async fn shutdown(&mut self) -> Result<(), Anyhow> {
        if let Err(e) = self.flush().await {
            warn!("failed to flush the remote process' stdin: {}", e);
        }

        match timeout(Self::TIMEOUT, self.child.wait()).await {
            Ok(status) => {
                let status = status.context("failed to wait for the remote process")?;
                Span::current().record("status", display(status));
                Ok(())
            }

            Err(_) => {
                self.child
                    .kill()
                    .await
                    .context("failed to kill the remote process")?;

                bail!(
                    "killed the remote process after waiting {}ms for it to exit",
                    Self::TIMEOUT.as_millis()
                );
            }
        }
    }
}

#[async_trait]
impl Io for Process {
    async fn recv(&mut self) -> io::Result<String> {
        self.pipe.recv().await
    }

    async fn send(&mut self, msg: &str) -> io::Result<()> {
        self.pipe.send(msg).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.pipe.flush().await
    }
}
