//! Newline-delimited JSON bridge for the host command channel.
//!
//! Reads `CommandEnvelope` lines from an input stream, dispatches them
//! through the [`HostCommandServer`](crate::host::channel::HostCommandServer)
//! router, and writes `ResponseEnvelope` and `EventEnvelope` lines to the
//! output stream.
//!
//! When bridged over stdio, stdout is reserved for the protocol; tracing
//! output goes to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex, broadcast};

use crate::error::{AppError, Result};
use crate::host::channel::{HostCommandClient, ScoutCommandHandler, command_channel};
use crate::host::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};

/// Default request channel capacity for the bridge.
const REQUEST_CAPACITY: usize = 64;

type SharedWriter<W> = Arc<Mutex<BufWriter<W>>>;

/// Run the bridge over the process stdin/stdout.
pub async fn run_stdio_bridge<H: ScoutCommandHandler>(
    handler: H,
    event_tx: broadcast::Sender<EventEnvelope>,
) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_bridge(stdin, tokio::io::stdout(), handler, event_tx).await
}

/// Run the bridge until the input closes or a `runtime.stop` command is
/// answered.
///
/// Three tasks cooperate: the reader (this task) dispatches commands and
/// writes responses, a forwarder writes broadcast events, and the server
/// runs the command router. Responses and events share one writer so lines
/// never interleave.
pub async fn run_bridge<R, W, H>(
    reader: R,
    writer: W,
    handler: H,
    event_tx: broadcast::Sender<EventEnvelope>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    H: ScoutCommandHandler,
{
    let (client, server) = command_channel(REQUEST_CAPACITY, event_tx, handler);
    let writer: SharedWriter<W> = Arc::new(Mutex::new(BufWriter::new(writer)));

    let server_handle = tokio::spawn(async move {
        server.run().await;
    });

    let event_writer = Arc::clone(&writer);
    let mut event_rx = client.subscribe_events();
    let event_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        let mut w = event_writer.lock().await;
                        if let Err(e) = write_line(&mut w, &json).await {
                            tracing::warn!(error = %e, "failed to write event; stopping event forwarder");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize event envelope; skipping");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event forwarder lagged; some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event channel closed; stopping event forwarder");
                    break;
                }
            }
        }
    });

    let reader_result = run_reader(reader, client, Arc::clone(&writer)).await;

    event_handle.abort();
    let _ = event_handle.await;
    let _ = server_handle.await;

    reader_result
}

async fn run_reader<R, W>(
    mut reader: R,
    client: HostCommandClient,
    writer: SharedWriter<W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| AppError::Channel(format!("failed to read command line: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down host bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_envelope(&writer, &response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::RuntimeStop;
        let request_id = envelope.request_id.clone();

        let response = match client.send(envelope).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "host command rejected");
                ResponseEnvelope::error(request_id, e.to_string())
            }
        };
        let stopped = is_stop && response.ok;
        write_envelope(&writer, &response).await?;

        if stopped {
            tracing::info!("runtime.stop received; shutting down host bridge");
            break;
        }
    }

    Ok(())
}

async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &SharedWriter<W>,
    response: &ResponseEnvelope,
) -> Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| AppError::Contract(format!("failed to serialize response envelope: {e}")))?;
    let mut w = writer.lock().await;
    write_line(&mut w, &json).await
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut BufWriter<W>, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| AppError::Channel(format!("failed to write line: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| AppError::Channel(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}
