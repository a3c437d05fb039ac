pub mod chat;
pub mod context;

pub use chat::{ChatRequest, ChatResponse};
pub use context::{Message, Role, UserContext};
