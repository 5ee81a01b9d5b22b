//! Wire protocol for the license tool function server.
//!
//! Every message in either direction is a single JSON object followed by a
//! single `\n` byte. Several messages may arrive in one read, and one message
//! may be split across reads; [`LineFramer`] demultiplexes the byte stream.
//!
//! # Example
//!
//! ```
//! use protocol::{Frame, Inbound, LineFramer, Response};
//!
//! let mut framer = LineFramer::default();
//! framer.push(b"{\"function\":\"add\",\"args\":[2,3]}\n{\"func");
//!
//! let Some(Frame::Line(line)) = framer.next_frame() else {
//!     panic!("expected a complete line");
//! };
//! let Inbound::Request(request) = Inbound::parse(&line)? else {
//!     panic!("expected a well-formed request");
//! };
//! assert_eq!(request.function, "add");
//! assert_eq!(request.args().len(), 2);
//!
//! // The partial second message stays buffered.
//! assert!(framer.next_frame().is_none());
//!
//! let line = Response::success(5).to_line()?;
//! assert_eq!(line, b"{\"result\":5}\n");
//! # Ok::<(), protocol::Error>(())
//! ```

mod error;
mod framing;
mod message;

pub use error::{Error, Result};
pub use framing::{DEFAULT_MAX_FRAME_BYTES, Frame, LineFramer};
pub use message::{DEGRADED_RESULT, INVALID_JSON, Inbound, Request, Response, UNKNOWN_FUNCTION};
