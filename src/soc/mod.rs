//! Coordinator-side protocol: framing, command translation, dispatch
//!
//! The coordinator speaks a framed RPC protocol over the serial link:
//!
//! ```text
//! [0xFE] [LEN] [CMD0] [CMD1] [BODY ...] ([FCS])
//! ```
//!
//! Two outbound families exist. App commands (`CMD0=0x49`) carry a
//! control- or data-class structure and no checksum; simple RPC commands
//! (`CMD0=0x29`) lay the same ZCL header out flat and end with an XOR
//! checksum over everything after the start byte.
//!
//! Inbound frames are tagged by `CMD1`: `0x80` is a data-class (ZCL)
//! response, `0x81` a control-class indication such as a device announce.

pub mod commands;
pub mod constants;
pub mod dispatch;
pub mod frame;

pub use commands::{AddrMode, Destination, SocCommander};
pub use frame::{read_frame, ControlFrame, DataFrame, SocFrame};
