//! Quill core library — request verification, interaction routing, the
//! deferred reply protocol, and the answer engine behind a Discord
//! slash-command webhook.

pub mod answer;
pub mod commands;
pub mod config;
pub mod discord;
pub mod gateway;
pub mod interactions;
pub mod llm;
pub mod memory;
pub mod responder;
pub mod retrieval;
pub mod verify;
pub mod worker;
