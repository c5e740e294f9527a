//! Drives a frame stream through [`RequestState`] until a terminal event.

use super::state::{Completion, RequestState, Transition};
use crate::stream::{Frame, StreamError, StreamEvent};
use futures::{Stream, StreamExt};
use std::time::Instant;
use thiserror::Error;

/// A stream that stopped before producing a terminal event.
///
/// Carries the partial state so the caller can still account for the
/// request (answer so far, first-token time).
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Interrupted {
    #[source]
    pub error: StreamError,
    pub partial: RequestState,
}

impl Interrupted {
    /// True when the body ended cleanly but without `done` or `error`.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.error, StreamError::Incomplete)
    }
}

/// Consume `frames` until the first `done` or `error` event.
///
/// `clock` timestamps each event; `on_event` observes every typed event
/// before it is applied. Frames after the terminal one are never polled.
pub async fn drive<S, C, F>(
    frames: S,
    mut state: RequestState,
    clock: C,
    mut on_event: F,
) -> Result<Completion, Interrupted>
where
    S: Stream<Item = Result<Frame, StreamError>>,
    C: Fn() -> Instant,
    F: FnMut(&StreamEvent),
{
    futures::pin_mut!(frames);

    while let Some(item) = frames.next().await {
        let event = match item.and_then(|frame| StreamEvent::from_frame(frame).map_err(Into::into)) {
            Ok(event) => event,
            Err(error) => {
                return Err(Interrupted {
                    error,
                    partial: state,
                })
            }
        };

        tracing::trace!(event = event.name(), "stream event");
        on_event(&event);

        match state.apply(event, clock()) {
            Transition::Pending(next) => state = next,
            Transition::Finished(completion) => return Ok(completion),
        }
    }

    Err(Interrupted {
        error: StreamError::Incomplete,
        partial: state,
    })
}
