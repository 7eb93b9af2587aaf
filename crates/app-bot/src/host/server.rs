use std::sync::Arc;

use tempmail_messaging::MailService;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::types::{InboundEvent, OutboundReply};

/// JSON-lines bridge between a host bot runtime and the plugin.
///
/// Each inbound line is handled on its own task, so different users run
/// concurrently; ordering for one user comes from the service's user locks.
pub struct HostServer {
    service: Arc<MailService>,
}

impl HostServer {
    pub fn new(service: Arc<MailService>) -> Self {
        Self { service }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await?;
        Ok(())
    }

    /// Serves until `input` closes and every in-flight command has replied.
    pub async fn serve<R, W>(&self, input: R, output: W) -> std::io::Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_replies(rx, output));
        let mut inflight = JoinSet::new();
        let mut lines = input.lines();

        debug!("host bridge started, waiting for events");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let event: InboundEvent = match serde_json::from_str(line) {
                Ok(e) => e,
                Err(e) => {
                    let _ = tx.send(OutboundReply::error(None, format!("parse error: {e}")));
                    continue;
                }
            };

            if event.origin.trim().is_empty() {
                let _ = tx.send(OutboundReply::error(None, "missing origin"));
                continue;
            }

            let service = self.service.clone();
            let tx = tx.clone();
            inflight.spawn(async move {
                for text in service.handle(&event.origin, &event.text).await {
                    if tx.send(OutboundReply::text(event.origin.clone(), text)).is_err() {
                        break;
                    }
                }
            });

            while let Some(done) = inflight.try_join_next() {
                if let Err(e) = done {
                    warn!(error = %e, "command task failed");
                }
            }
        }

        while let Some(done) = inflight.join_next().await {
            if let Err(e) = done {
                warn!(error = %e, "command task failed");
            }
        }
        drop(tx);

        debug!("input closed, host bridge shutting down");
        writer.await.map_err(std::io::Error::other)?
    }
}

async fn write_replies<W>(
    mut rx: mpsc::UnboundedReceiver<OutboundReply>,
    mut output: W,
) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = rx.recv().await {
        let json = serde_json::to_string(&reply)?;
        output.write_all(json.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(output)
}
