//! Request lifecycle and conversation state.
//!
//! - [`state`]: per-request value threaded through the event stream
//! - [`dispatch`]: drives a frame stream to completion
//! - [`chat`]: the conversation, wired to the client and metrics window
//! - [`documents`]: local view of ingested documents

pub mod chat;
pub mod dispatch;
pub mod documents;
pub mod error;
pub mod state;

pub use chat::{ChatMessage, ChatSession, Role};
pub use dispatch::{drive, Interrupted};
pub use documents::DocumentIndex;
pub use error::ChatError;
pub use state::{Completion, Outcome, RequestIdentity, RequestState, Transition};
