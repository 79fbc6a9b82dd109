//! Conversational wellness chat — bypass policy, exam guidance, memory.

pub mod guidance;
pub mod memory;
pub mod service;

pub use memory::ChatMemory;
pub use service::{ChatReply, ChatService, ReplySource};
