//! Chat tool calls and their dispatch onto the task API.

pub mod call;
pub mod dispatcher;

pub use call::{RawToolCall, ToolCall};
pub use dispatcher::{DEMO_USER_ID, DispatchReport, ToolDispatcher, ToolEffect, ToolOutcome};
