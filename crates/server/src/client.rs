//! Line client: one request line out, one response line back.

use std::time::Duration;

use protocol::{Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;

use crate::{Error, Result};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// A connection to a running server.
#[derive(Debug)]
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    read_timeout: Duration,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout {
                operation: "connect",
                after: CONNECT_TIMEOUT,
            })??;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            read_timeout: READ_TIMEOUT,
        })
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Send `request` and wait for its response.
    pub async fn call(&mut self, request: &Request) -> Result<Response> {
        self.send_raw(&request.to_line()?).await?;
        self.read_response().await
    }

    /// Write bytes as-is; framing is the caller's business.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the next response line.
    pub async fn read_response(&mut self) -> Result<Response> {
        let mut line = Vec::new();
        let n = timeout(self.read_timeout, self.reader.read_until(b'\n', &mut line))
            .await
            .map_err(|_| Error::Timeout {
                operation: "read",
                after: self.read_timeout,
            })??;
        if n == 0 || line.last() != Some(&b'\n') {
            return Err(Error::Closed);
        }
        line.pop();
        Ok(Response::parse(&line)?)
    }
}
