//! Chat turns: transcript, state machine and tool-call follow-up.

pub mod controller;
pub mod model;

pub use controller::{ChatController, ChatPhase, RefreshCallback, SubmitOutcome};
pub use model::{ChatMessage, ChatReply, ChatRequest, ChatRole, Conversation, ConversationDetail};
