//! REST client for the todo-chat backend.

pub mod chat;
pub mod client;
pub mod tasks;

pub use chat::{ChatApi, ChatResponse};
pub use client::ApiClient;
pub use tasks::TaskApi;
