//! Incremental frame decoder.
//!
//! Bytes are buffered as they arrive and split on the blank-line (`\n\n`)
//! separator. The separator search runs on raw bytes: `\n` never appears
//! inside a multi-byte UTF-8 sequence, so a character split across two chunks
//! always lands inside one frame and is decoded whole once the frame is
//! complete.

use super::error::{DecodeError, StreamError};
use super::frame::Frame;
use futures::{Stream, StreamExt};

const SEPARATOR: &[u8] = b"\n\n";

/// Buffering frame decoder, fed one chunk at a time.
///
/// Extracted frames advance a read cursor instead of shifting the buffer, and
/// consumed bytes are dropped once per [`push`](Self::push). Decoding a chunk
/// that holds many frames is linear in its length.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Start of the bytes not yet returned as part of a frame.
    head: usize,
    /// Offset below which the buffer is known to hold no separator.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes to the buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.head == self.buffer.len() {
            self.buffer.clear();
        } else if self.head > 0 {
            self.buffer.drain(..self.head);
        }
        self.scanned = self.scanned.saturating_sub(self.head);
        self.head = 0;
        self.buffer.extend_from_slice(chunk);
    }

    /// Extract the next complete frame from buffered data.
    ///
    /// Returns `Ok(None)` once no complete frame remains; frames without a
    /// `data:` line are skipped.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        while let Some(end) = self.find_separator() {
            let start = self.head;
            self.head = end + SEPARATOR.len();
            self.scanned = self.head;

            let text = String::from_utf8_lossy(&self.buffer[start..end]);
            if let Some(frame) = Frame::parse(&text)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len() - self.head
    }

    fn find_separator(&mut self) -> Option<usize> {
        let start = self
            .scanned
            .saturating_sub(SEPARATOR.len() - 1)
            .max(self.head);
        let found = self.buffer[start..]
            .windows(SEPARATOR.len())
            .position(|window| window == SEPARATOR)
            .map(|pos| start + pos);
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }
}

/// Decode a stream of byte chunks into a stream of frames.
///
/// All frames available in buffered data are yielded before the next chunk
/// is pulled. A source error or an undecodable frame ends the stream with an
/// error item. A trailing partial frame at end of input is discarded.
pub fn decode_stream<S, B, E>(source: S) -> impl Stream<Item = Result<Frame, StreamError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    async_stream::try_stream! {
        futures::pin_mut!(source);
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| StreamError::Transport(e.to_string()))?;
            decoder.push(chunk.as_ref());

            while let Some(frame) = decoder.next_frame().map_err(StreamError::from)? {
                tracing::trace!(event = %frame.event, "decoded frame");
                yield frame;
            }
        }

        if decoder.pending_len() > 0 {
            tracing::debug!(
                discarded_bytes = decoder.pending_len(),
                "discarding unterminated trailing frame"
            );
        }
    }
}
