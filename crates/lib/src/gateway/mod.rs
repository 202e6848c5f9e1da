//! Gateway: HTTP + WebSocket relay.
//!
//! Single port serves the HTTP API and the WebSocket chat endpoint. Inbound
//! user messages are forwarded to the Rasa webhook and the structured replies
//! pushed back to the originating session.

pub mod protocol;
mod server;

pub use protocol::{BotReply, ChatRequest, ClientMessage, MessageType, ReplyButton};
pub use server::run_server;
