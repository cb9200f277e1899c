//! Todo Chat: client core for a conversational todo assistant.

pub mod api;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod navigation;
pub mod session;
pub mod timestamp;
pub mod todos;
pub mod tools;

pub use error::{Error, Result};
