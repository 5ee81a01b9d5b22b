//! Line-delimited JSON function server.
//!
//! [`Server`] accepts TCP connections and runs one task per client. Each task
//! frames the byte stream into lines, hands every line to the
//! [`Dispatcher`] and writes the responses back in request order.
//! [`Client`] is the matching one-line-at-a-time client.

mod client;
mod dispatch;
mod error;
mod server;

pub use client::{CONNECT_TIMEOUT, Client, READ_TIMEOUT};
pub use dispatch::{DispatchError, Dispatcher, ErrorCategory, error_chain};
pub use error::{Error, Result};
pub use server::{DEFAULT_HOST, DEFAULT_PORT, READ_CHUNK, Server};
