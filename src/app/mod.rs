//! Client-side protocol and request handling

pub mod handler;
pub mod protocol;

pub use handler::{handle_message, ClientAction};
pub use protocol::ClientCommand;
