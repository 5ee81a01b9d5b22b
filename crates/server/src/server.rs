//! TCP transport: accept loop and per-connection workers.

use std::net::SocketAddr;
use std::sync::Arc;

use protocol::{DEFAULT_MAX_FRAME_BYTES, DEGRADED_RESULT, Frame, LineFramer, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::{DispatchError, Dispatcher, error_chain};
use crate::{Error, Result};

/// Bytes requested per socket read.
pub const READ_CHUNK: usize = 1024;

/// Default listen address of the host plugin.
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9999;

/// A bound server, ready to run.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
}

impl Server {
    /// Bind `addr` (`host:port`).
    pub async fn bind(addr: &str, dispatcher: Dispatcher) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self {
            listener,
            dispatcher: Arc::new(dispatcher),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    /// Longest accepted frame; longer lines are answered with `Invalid JSON`.
    pub fn max_frame_bytes(mut self, max: usize) -> Self {
        self.max_frame_bytes = max;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` is cancelled, then wait for the
    /// open connections to finish their current request.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let local = self.local_addr()?;
        tracing::info!(addr = %local, "listening");

        let mut workers = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "connection worker panicked");
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let span = tracing::info_span!("connection", id = %Uuid::new_v4(), %peer);
                    let worker = Worker {
                        stream,
                        dispatcher: self.dispatcher.clone(),
                        framer: LineFramer::new(self.max_frame_bytes),
                        shutdown: shutdown.clone(),
                    };
                    workers.spawn(worker.run().instrument(span));
                    tracing::info!(active = workers.len(), "connection accepted");
                }
            }
        }

        tracing::info!(open = workers.len(), "shutting down");
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "connection worker panicked");
            }
        }
        Ok(())
    }
}

/// One client connection.
struct Worker {
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    framer: LineFramer,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        tracing::info!("connected");
        match self.serve().await {
            Ok(()) => tracing::info!("disconnected"),
            Err(e) => tracing::warn!(error = %e, "connection closed"),
        }
    }

    async fn serve(&mut self) -> std::io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                read = self.stream.read(&mut chunk) => read?,
            };
            if n == 0 {
                return Ok(());
            }
            self.framer.push(&chunk[..n]);

            // Every complete frame is answered before the next read.
            while let Some(frame) = self.framer.next_frame() {
                let response = match frame {
                    Frame::Line(line) => self.dispatcher.handle_frame(&line).await,
                    Frame::Oversized => {
                        let err = DispatchError::Framing(protocol::Error::FrameTooLarge {
                            max: self.framer.max_frame(),
                        });
                        tracing::warn!(error = %error_chain(&err), "rejected frame");
                        err.into()
                    }
                };
                self.stream.write_all(&encode(&response)).await?;
            }
        }
    }
}

fn encode(response: &Response) -> Vec<u8> {
    response.to_line().unwrap_or_else(|e| {
        tracing::error!(error = %e, "response not serializable");
        format!("{{\"result\":\"{DEGRADED_RESULT}\"}}\n").into_bytes()
    })
}
