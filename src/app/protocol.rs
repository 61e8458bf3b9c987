//! Client-facing binary protocol
//!
//! Messages start with the `0xA3` marker and a command byte; the rest is a
//! fixed layout per command, multi-byte integers little-endian. Client
//! requests are parsed into [`ClientCommand`]; bridge notifications (device
//! report, group response) are built by the `encode_*` helpers.

use crate::error::{Error, Result};

/// Start-of-message marker on the client link
pub const APP_SOF: u8 = 0xA3;

// Command ids
pub const CMD_HEART_BEAT: u8 = 0;
pub const CMD_REPORT: u8 = 1;
pub const CMD_QUERY_REQ: u8 = 2;
pub const CMD_QUERY_RSP: u8 = 3;
pub const CMD_LEAVE_NWK: u8 = 4;
pub const CMD_BIND: u8 = 5;
pub const CMD_GROUP: u8 = 6;
pub const CMD_GROUP_RSP: u8 = 7;
pub const CMD_LIGHT: u8 = 8;
pub const CMD_LEVEL: u8 = 9;
pub const CMD_CLOSE: u8 = 10;

/// Group command opcodes
pub const GROUP_OPCODE_ADD: u8 = 0;
pub const GROUP_OPCODE_REMOVE: u8 = 1;

/// A parsed client request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Keep-alive counter; accepted without action
    Heartbeat { count: u8 },
    /// Ask for one report per known device
    QueryAll,
    /// Accepted without action
    LeaveNetwork,
    /// Bind a controller to the coordinator
    Bind { addr_mode: u8, addr: u16 },
    /// Group membership change for a device
    Group {
        nwk_addr: u16,
        opcode: u8,
        group_id: u16,
    },
    /// Light on/off/toggle
    Light {
        addr_mode: u8,
        addr: u16,
        opcode: u8,
    },
    /// Brightness move
    Level {
        addr_mode: u8,
        addr: u16,
        level: u8,
        trans_time: u16,
    },
    /// Shut the bridge down
    Close,
}

impl ClientCommand {
    /// Parse one client message
    ///
    /// `Ok(None)` for command ids the bridge does not act on; errors for a
    /// wrong start byte or a layout shorter than the command requires.
    /// Callers log and drop on error.
    pub fn parse(buf: &[u8]) -> Result<Option<ClientCommand>> {
        if buf.len() < 2 {
            return Err(Error::MalformedFrame(format!(
                "client message too short: {} bytes",
                buf.len()
            )));
        }
        if buf[0] != APP_SOF {
            return Err(Error::BadSof(buf[0]));
        }

        let need = |n: usize| -> Result<()> {
            if buf.len() < n {
                Err(Error::MalformedFrame(format!(
                    "client command 0x{:02X} truncated: {} of {} bytes",
                    buf[1],
                    buf.len(),
                    n
                )))
            } else {
                Ok(())
            }
        };

        let cmd = match buf[1] {
            CMD_HEART_BEAT => {
                need(3)?;
                Some(ClientCommand::Heartbeat { count: buf[2] })
            }
            CMD_QUERY_REQ => Some(ClientCommand::QueryAll),
            CMD_LEAVE_NWK => Some(ClientCommand::LeaveNetwork),
            CMD_BIND => {
                need(5)?;
                Some(ClientCommand::Bind {
                    addr_mode: buf[2],
                    addr: u16::from_le_bytes([buf[3], buf[4]]),
                })
            }
            CMD_GROUP => {
                need(7)?;
                Some(ClientCommand::Group {
                    nwk_addr: u16::from_le_bytes([buf[2], buf[3]]),
                    opcode: buf[4],
                    group_id: u16::from_le_bytes([buf[5], buf[6]]),
                })
            }
            CMD_LIGHT => {
                need(6)?;
                Some(ClientCommand::Light {
                    addr_mode: buf[2],
                    addr: u16::from_le_bytes([buf[3], buf[4]]),
                    opcode: buf[5],
                })
            }
            CMD_LEVEL => {
                need(9)?;
                Some(ClientCommand::Level {
                    addr_mode: buf[2],
                    addr: u16::from_le_bytes([buf[3], buf[4]]),
                    level: buf[6],
                    trans_time: u16::from_le_bytes([buf[7], buf[8]]),
                })
            }
            CMD_CLOSE => Some(ClientCommand::Close),
            _ => None,
        };
        Ok(cmd)
    }
}

/// Device-report notification: new or enumerated device
pub fn encode_report(device_type: u8, nwk_addr: u16, ext_addr: &[u8; 8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(13);
    msg.push(APP_SOF);
    msg.push(CMD_REPORT);
    msg.push(device_type);
    msg.extend_from_slice(&nwk_addr.to_le_bytes());
    msg.extend_from_slice(ext_addr);
    msg
}

/// Group-response notification relayed from a device
pub fn encode_group_rsp(nwk_addr: u16, opcode: u8, status: u8, group_id: u16) -> Vec<u8> {
    let mut msg = Vec::with_capacity(8);
    msg.push(APP_SOF);
    msg.push(CMD_GROUP_RSP);
    msg.extend_from_slice(&nwk_addr.to_le_bytes());
    msg.push(opcode);
    msg.push(status);
    msg.extend_from_slice(&group_id.to_le_bytes());
    msg
}
