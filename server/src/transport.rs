//! Stdio transport
//!
//! Reads request lines and answers each on the blocking pool, so a slow
//! embedding never stalls the reader. Responses are written as they finish;
//! callers that pipeline requests match them up by `id`.

use crate::error::ServerResult;
use crate::protocol::{handle_line, WireResponse};
use ragctx_retrieval::Retriever;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Semaphore};

/// Requests answered at once before the reader stops pulling lines
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Line-delimited JSON server
pub struct StdioServer {
    retriever: Retriever,
    max_in_flight: usize,
}

impl StdioServer {
    pub fn new(retriever: Retriever) -> Self {
        Self {
            retriever,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Limit concurrent requests (minimum 1)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run(&self) -> ServerResult<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();

        tracing::info!("Serving requests on stdio");
        let handled = self.serve(stdin, &mut stdout).await?;
        tracing::info!("Input closed after {} requests", handled);
        Ok(())
    }

    /// Serve any line reader and writer; returns the number of responses written
    ///
    /// A write failure stops the reader and is returned.
    pub async fn serve<R, W>(&self, reader: R, writer: &mut W) -> ServerResult<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::channel::<WireResponse>(self.max_in_flight);
        let slots = Arc::new(Semaphore::new(self.max_in_flight));

        let read_loop = async move {
            let mut lines = reader.lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                let Ok(permit) = slots.clone().acquire_owned().await else {
                    break;
                };
                let retriever = self.retriever.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = tokio::task::spawn_blocking(move || {
                        handle_line(&retriever, &line)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!("Request worker failed: {}", e);
                        WireResponse::failure(None, 500, "internal error")
                    });
                    // Fails only once the writer has stopped
                    let _ = tx.send(response).await;
                    drop(permit);
                });
            }
            ServerResult::Ok(())
        };

        let write_loop = async move {
            let mut written = 0;
            while let Some(response) = rx.recv().await {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                written += 1;
            }
            ServerResult::Ok(written)
        };

        let ((), written) = tokio::try_join!(read_loop, write_loop)?;
        Ok(written)
    }
}
