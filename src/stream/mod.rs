//! Streaming response decoding.
//!
//! The `/query/stream` endpoint answers with a chunked body of blank-line
//! delimited frames:
//!
//! ```text
//! event: token
//! data: {"text":"Hel"}
//!
//! event: done
//! data: {"documents":[],"timings":{"total_ms":42}}
//!
//! ```
//!
//! [`FrameDecoder`] reassembles frames from arbitrary chunk boundaries,
//! [`decode_stream`] adapts it to an async byte stream, and [`StreamEvent`]
//! gives each frame a typed payload.
//!
//! # Example
//!
//! ```rust
//! use ragchat::stream::{FrameDecoder, StreamEvent};
//!
//! let mut decoder = FrameDecoder::new();
//! decoder.push(b"event: token\ndata: {\"text\":\"Hi\"}\n");
//! assert!(decoder.next_frame().unwrap().is_none());
//!
//! decoder.push(b"\n");
//! let frame = decoder.next_frame().unwrap().unwrap();
//! let event = StreamEvent::from_frame(frame).unwrap();
//! assert_eq!(event.name(), "token");
//! ```

pub mod decoder;
pub mod error;
pub mod events;
pub mod frame;

pub use decoder::{decode_stream, FrameDecoder};
pub use error::{DecodeError, StreamError};
pub use events::{DoneEvent, ErrorEvent, MetaEvent, StreamEvent, TokenEvent, TtftEvent};
pub use frame::{Frame, DEFAULT_EVENT};

use futures::stream::BoxStream;

/// Boxed frame stream, as returned by the HTTP client.
pub type FrameStream = BoxStream<'static, Result<Frame, StreamError>>;
