//! Newline framing for a continuous byte stream.

/// Default maximum frame size (1 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// One unit produced by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete message, without its trailing `\n` (and `\r`, if any).
    Line(Vec<u8>),
    /// A message longer than the maximum was dropped.
    Oversized,
}

/// Splits inbound bytes on `\n`, keeping incomplete trailing data buffered.
///
/// Every line is a frame, blank ones included, so each gets its own reply.
/// A message that grows past the maximum frame size is reported once as [`Frame::Oversized`] and the rest of it,
/// up to the next newline, is discarded.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_frame: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl LineFramer {
    pub fn new(max_frame: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame,
            discarding: false,
        }
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    /// Append bytes read from the connection.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet terminated by a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete frame, in arrival order.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
                if self.discarding {
                    self.buf.clear();
                } else if self.buf.len() > self.max_frame {
                    self.buf.clear();
                    self.discarding = true;
                    return Some(Frame::Oversized);
                }
                return None;
            };

            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_frame {
                return Some(Frame::Oversized);
            }
            return Some(Frame::Line(line));
        }
    }
}
