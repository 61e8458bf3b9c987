//! Inbound coordinator frame dispatch
//!
//! Routes decoded frames to the registry and the client pool. Data-class
//! responses from the groups cluster and control-class device announces
//! produce client notifications; everything else is logged and dropped.
//! Payload field access is bounds-checked and a short payload drops the
//! whole frame.

use crate::app::protocol::{encode_group_rsp, encode_report};
use crate::error::{Error, Result};
use crate::nodes::{AddOutcome, DeviceType, NodeRegistry};
use crate::pool::ClientPool;
use crate::soc::constants::{
    CLUSTER_GROUPS, CLUSTER_LEVEL_CONTROL, CLUSTER_ON_OFF, CMD_GROUP_DEFAULT_RSP,
    CMD_ONOFF_FLASH_RESET, CTRL_CMD_DEV_ANN_IND, CTRL_CMD_GET_NODES,
};
use crate::soc::frame::{ControlFrame, DataFrame, SocFrame};
use std::io::Write;

/// Route one decoded frame
pub fn dispatch_frame<S: Write>(
    frame: &SocFrame,
    registry: &mut NodeRegistry,
    pool: &mut ClientPool<S>,
) -> Result<()> {
    match frame {
        SocFrame::Data(data) => dispatch_data(data, pool),
        SocFrame::Control(ctrl) => dispatch_control(ctrl, registry, pool),
    }
}

fn dispatch_data<S: Write>(data: &DataFrame, pool: &mut ClientPool<S>) -> Result<()> {
    match data.cluster_id {
        CLUSTER_ON_OFF => {
            if data.cmd_id == CMD_ONOFF_FLASH_RESET {
                log::trace!("flash-reset acknowledged by 0x{:04X}", data.src_addr);
            } else {
                let name = match data.cmd_id {
                    0 => "off",
                    1 => "on",
                    2 => "toggle",
                    _ => "unknown",
                };
                log::trace!("on-off response ({}) from 0x{:04X}", name, data.src_addr);
            }
        }
        CLUSTER_LEVEL_CONTROL => {
            let name = match data.cmd_id {
                0 => "move-to-level",
                2 => "step",
                4 => "move-to-level-with-onoff",
                _ => "unknown",
            };
            log::trace!("level response ({}) from 0x{:04X}", name, data.src_addr);
        }
        CLUSTER_GROUPS => {
            if data.cmd_id == CMD_GROUP_DEFAULT_RSP {
                log::trace!("group default response from 0x{:04X}", data.src_addr);
                return Ok(());
            }
            if data.payload.len() < 3 {
                return Err(Error::MalformedFrame(format!(
                    "group response payload too short: {} bytes",
                    data.payload.len()
                )));
            }
            let status = data.payload[0];
            let group_id = u16::from_le_bytes([data.payload[1], data.payload[2]]);
            log::info!(
                "group response from 0x{:04X}: opcode {} status {} group 0x{:04X}",
                data.src_addr,
                data.cmd_id,
                status,
                group_id
            );
            let msg = encode_group_rsp(data.src_addr, data.cmd_id, status, group_id);
            pool.broadcast(&msg);
        }
        other => {
            log::trace!("unhandled data response for cluster 0x{:04X}", other);
        }
    }
    Ok(())
}

fn dispatch_control<S: Write>(
    ctrl: &ControlFrame,
    registry: &mut NodeRegistry,
    pool: &mut ClientPool<S>,
) -> Result<()> {
    match ctrl.cmd_id {
        CTRL_CMD_DEV_ANN_IND => handle_device_announce(&ctrl.payload, registry, pool),
        CTRL_CMD_GET_NODES => handle_node_list(&ctrl.payload),
        other => {
            log::trace!("unhandled control indication 0x{:02X}", other);
            Ok(())
        }
    }
}

/// Device-announce payload: network addr, extended addr, capability,
/// endpoint, HA profile device id
fn handle_device_announce<S: Write>(
    payload: &[u8],
    registry: &mut NodeRegistry,
    pool: &mut ClientPool<S>,
) -> Result<()> {
    if payload.len() < 14 {
        return Err(Error::MalformedFrame(format!(
            "device announce payload too short: {} bytes",
            payload.len()
        )));
    }
    let nwk_addr = u16::from_le_bytes([payload[0], payload[1]]);
    let mut ext_addr = [0u8; 8];
    ext_addr.copy_from_slice(&payload[2..10]);
    let capability = payload[10];
    let endpoint = payload[11];
    let device_id = u16::from_le_bytes([payload[12], payload[13]]);

    match registry.add(nwk_addr, ext_addr, capability, device_id, endpoint) {
        AddOutcome::Added => {
            log::info!(
                "device announced: nwk 0x{:04X} ext {:02X?} profile 0x{:04X} endpoint 0x{:02X}",
                nwk_addr,
                ext_addr,
                device_id,
                endpoint
            );
        }
        AddOutcome::AlreadyKnown => {
            log::debug!("device 0x{:04X} re-announced, keeping existing entry", nwk_addr);
        }
        AddOutcome::Full => {
            log::warn!("node table full, device 0x{:04X} not recorded", nwk_addr);
        }
    }

    let device_type = DeviceType::from_announce(device_id);
    let msg = encode_report(device_type.as_u8(), nwk_addr, &ext_addr);
    pool.broadcast(&msg);
    Ok(())
}

/// Node-list result: count byte then 16-bit network addresses
fn handle_node_list(payload: &[u8]) -> Result<()> {
    let Some(&count) = payload.first() else {
        return Err(Error::MalformedFrame(
            "empty node list payload".to_string(),
        ));
    };
    let need = 1 + count as usize * 2;
    if payload.len() < need {
        return Err(Error::MalformedFrame(format!(
            "node list truncated: {} of {} bytes",
            payload.len(),
            need
        )));
    }
    let addrs: Vec<u16> = payload[1..need]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    log::info!("coordinator reports {} nodes: {:04X?}", count, addrs);
    Ok(())
}
