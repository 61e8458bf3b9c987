//! ZLL Gateway - bridge between TCP control clients and a serial-attached
//! ZigBee Light Link coordinator.
//!
//! Clients send semantic commands (light on/off, level, hue, groups, device
//! queries) over a small binary TCP protocol; the bridge translates them to
//! the coordinator's framed serial RPC protocol. Coordinator events
//! (device announces, command responses) flow back as broadcasts to every
//! connected client.
//!
//! Everything runs on one scheduler thread; see [`scheduler`] for the
//! service-order contract.

pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod nodes;
pub mod pool;
pub mod scheduler;
pub mod soc;
pub mod transport;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
