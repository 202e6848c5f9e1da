//! Chatbridge core library — config, session registry, Rasa client, and the
//! HTTP + WebSocket relay gateway used by the CLI binary.

pub mod config;
pub mod gateway;
pub mod rasa;
pub mod registry;
