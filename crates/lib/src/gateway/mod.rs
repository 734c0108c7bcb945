//! Gateway: webhook front end for platform interactions.
//!
//! One HTTP port serves the interactions endpoint and a health probe. The
//! handler verifies, routes, and defers; the server adapts HTTP to the
//! trigger-event seam and owns startup/shutdown.

mod handler;
mod server;

pub use handler::{handle_event, GatewayState, HandlerReply, NO_MESSAGE_REPLY};
pub use server::run_gateway;
