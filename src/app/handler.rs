//! Client request handling
//!
//! Turns parsed client commands into coordinator commands or registry
//! queries. Runs on the scheduler thread; nothing here waits for a
//! coordinator reply.

use crate::app::protocol::{self, ClientCommand, GROUP_OPCODE_ADD};
use crate::error::Result;
use crate::nodes::NodeRegistry;
use crate::pool::ClientPool;
use crate::soc::constants::APP_ENDPOINT;
use crate::soc::{AddrMode, Destination, SocCommander};
use crate::transport::Transport;
use std::io::Write;

/// What the scheduler should do after handling a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    Continue,
    Shutdown,
}

/// Handle one raw message read from a client socket
///
/// Malformed messages are logged and dropped; only a close request alters
/// control flow.
pub fn handle_message<S: Write, T: Transport + ?Sized>(
    buf: &[u8],
    registry: &NodeRegistry,
    pool: &mut ClientPool<S>,
    commander: &mut SocCommander,
    link: &mut T,
) -> Result<ClientAction> {
    let cmd = match ClientCommand::parse(buf) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => {
            log::debug!("ignoring unhandled client command: {:02X?}", buf);
            return Ok(ClientAction::Continue);
        }
        Err(e) => {
            log::warn!("dropping malformed client message: {}", e);
            return Ok(ClientAction::Continue);
        }
    };

    log::trace!("client command: {:?}", cmd);
    match cmd {
        ClientCommand::Heartbeat { count } => {
            log::trace!("client heartbeat {}", count);
        }
        ClientCommand::QueryAll => {
            query_all(registry, pool);
        }
        ClientCommand::LeaveNetwork => {
            log::debug!("leave-network request accepted (no action)");
        }
        ClientCommand::Bind { addr_mode, addr } => {
            commander.demo_bind(link, AddrMode::from_u8(addr_mode), addr)?;
        }
        ClientCommand::Group {
            nwk_addr,
            opcode,
            group_id,
        } => {
            if opcode == GROUP_OPCODE_ADD {
                let dst = Destination::new(nwk_addr, APP_ENDPOINT, AddrMode::Short);
                commander.add_group(link, group_id, dst)?;
            } else {
                log::debug!("unsupported group opcode {}", opcode);
            }
        }
        ClientCommand::Light {
            addr_mode,
            addr,
            opcode,
        } => {
            let dst = Destination::new(addr, APP_ENDPOINT, AddrMode::from_u8(addr_mode));
            // Any nonzero opcode (including toggle) turns the light on
            commander.set_state(link, opcode != 0, dst)?;
        }
        ClientCommand::Level {
            addr_mode,
            addr,
            level,
            trans_time,
        } => {
            let dst = Destination::new(addr, APP_ENDPOINT, AddrMode::from_u8(addr_mode));
            commander.set_level(link, level, trans_time, dst)?;
        }
        ClientCommand::Close => {
            log::info!("close requested by client");
            return Ok(ClientAction::Shutdown);
        }
    }
    Ok(ClientAction::Continue)
}

/// Broadcast one device report per occupied registry slot
fn query_all<S: Write>(registry: &NodeRegistry, pool: &mut ClientPool<S>) {
    for entry in registry.iter_occupied() {
        let msg = protocol::encode_report(
            entry.device_type.as_u8(),
            entry.nwk_addr,
            &entry.ext_addr,
        );
        pool.broadcast(&msg);
    }
}
