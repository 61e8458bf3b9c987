//! Interactive console commands
//!
//! Line-oriented commands read from stdin, e.g. `setonoff -n0x1234 -m2 -v1`.
//! Parameters are sticky: a value given once stays in effect for later
//! commands until overridden. Numbers accept a `0x` hex prefix or plain
//! decimal.
//!
//! Stdin cannot be polled without blocking from portable std, so a reader
//! thread feeds whole lines into a channel the scheduler drains in its
//! console slot. Protocol state never leaves the scheduler thread.

use crate::error::{Error, Result};
use crate::nodes::NodeRegistry;
use crate::soc::{AddrMode, Destination, SocCommander};
use crate::transport::Transport;
use crossbeam_channel::{unbounded, Receiver};
use std::io::BufRead;
use std::thread;

/// Sticky command parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleState {
    nwk_addr: u16,
    addr_mode: u8,
    endpoint: u8,
    value: u8,
    trans_time: u16,
    group_id: u16,
}

/// What the scheduler should do after a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Continue,
    Shutdown,
}

/// Spawn the stdin reader thread
///
/// The thread ends when stdin reaches EOF or fails; the channel simply
/// stops producing lines.
pub fn spawn_console_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("console read error: {}", e);
                        break;
                    }
                }
            }
        })
        .map_err(|e| Error::Other(format!("failed to spawn console reader: {}", e)))?;
    Ok(rx)
}

/// Parse `0x`-prefixed hex or decimal
fn parse_num(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

impl ConsoleState {
    /// Fold `-<key><value>` tokens into the sticky parameters
    fn apply_params(&mut self, line: &str) {
        for token in line.split_whitespace() {
            let Some(rest) = token.strip_prefix('-') else {
                continue;
            };
            let mut chars = rest.chars();
            let (key, value) = (chars.next(), chars.as_str());
            let Some(num) = parse_num(value) else {
                log::warn!("unparseable console parameter: {}", token);
                continue;
            };
            match key {
                Some('n') => self.nwk_addr = num as u16,
                Some('m') => self.addr_mode = num as u8,
                Some('e') => self.endpoint = num as u8,
                Some('v') => self.value = num as u8,
                Some('t') => self.trans_time = num as u16,
                Some('g') => self.group_id = num as u16,
                _ => log::warn!("unknown console parameter: {}", token),
            }
        }
    }

    fn destination(&self) -> Destination {
        Destination::new(self.nwk_addr, self.endpoint, AddrMode::from_u8(self.addr_mode))
    }
}

/// Execute one console line
pub fn handle_line<T: Transport + ?Sized>(
    line: &str,
    state: &mut ConsoleState,
    registry: &NodeRegistry,
    commander: &mut SocCommander,
    link: &mut T,
) -> Result<ConsoleAction> {
    state.apply_params(line);
    let dst = state.destination();
    let command = line.split_whitespace().next().unwrap_or("");

    match command {
        "" => {}
        "touchlink" => {
            commander.touchlink(link)?;
            log::info!("touchlink started");
        }
        "resettofn" => {
            commander.reset_to_fn(link)?;
            log::info!("coordinator reset to factory new");
        }
        "sendresettofn" => {
            // Reset of the remote device only works inside a touchlink window
            commander.touchlink(link)?;
            commander.send_reset_to_fn(link)?;
            log::info!("reset-to-fn sent to touchlinked device");
        }
        "setonoff" => {
            commander.set_state(link, state.value != 0, dst)?;
            log::info!(
                "setonoff nwk 0x{:04X} ep 0x{:02X} mode {} value {}",
                state.nwk_addr,
                state.endpoint,
                state.addr_mode,
                state.value
            );
        }
        "setlevel" => {
            commander.set_level(link, state.value, state.trans_time, dst)?;
            log::info!(
                "setlevel nwk 0x{:04X} level {} time {}",
                state.nwk_addr,
                state.value,
                state.trans_time
            );
        }
        "sethue" => {
            commander.set_hue(link, state.value, state.trans_time, dst)?;
            log::info!(
                "sethue nwk 0x{:04X} hue {} time {}",
                state.nwk_addr,
                state.value,
                state.trans_time
            );
        }
        "setsat" => {
            commander.set_sat(link, state.value, state.trans_time, dst)?;
            log::info!(
                "setsat nwk 0x{:04X} sat {} time {}",
                state.nwk_addr,
                state.value,
                state.trans_time
            );
        }
        "sethuesat" => {
            commander.set_hue_sat(link, state.value, state.value, state.trans_time, dst)?;
            log::info!("sethuesat nwk 0x{:04X}", state.nwk_addr);
        }
        "getstate" => commander.get_state(link, dst)?,
        "getlevel" => commander.get_level(link, dst)?,
        "gethue" => commander.get_hue(link, dst)?,
        "getsat" => commander.get_sat(link, dst)?,
        "getnodes" => {
            commander.get_nodes(link)?;
            for entry in registry.iter_occupied() {
                log::info!(
                    "node: nwk 0x{:04X} ext {:02X?} type {:?} ep 0x{:02X}",
                    entry.nwk_addr,
                    entry.ext_addr,
                    entry.device_type,
                    entry.endpoint
                );
            }
        }
        "addgroup" => {
            commander.add_group(link, state.group_id, dst)?;
            log::info!(
                "addgroup nwk 0x{:04X} group 0x{:04X}",
                state.nwk_addr,
                state.group_id
            );
        }
        "storescene" => {
            commander.store_scene(link, state.group_id, state.value, dst)?;
            log::info!(
                "storescene group 0x{:04X} scene {}",
                state.group_id,
                state.value
            );
        }
        "recallscene" => {
            commander.recall_scene(link, state.group_id, state.value, dst)?;
            log::info!(
                "recallscene group 0x{:04X} scene {}",
                state.group_id,
                state.value
            );
        }
        "setbind" => {
            commander.demo_bind(link, AddrMode::from_u8(state.addr_mode), state.nwk_addr)?;
            log::info!(
                "setbind nwk 0x{:04X} mode {}",
                state.nwk_addr,
                state.addr_mode
            );
        }
        "resetflash" => {
            commander.flash_reset(link, dst)?;
            log::info!("resetflash nwk 0x{:04X}", state.nwk_addr);
        }
        "enddevbind" => commander.end_dev_bind(link)?,
        "selectlight" => {
            commander.identify(link, state.trans_time, dst)?;
            log::info!("identify nwk 0x{:04X}", state.nwk_addr);
        }
        "exit" => {
            log::info!("console exit");
            return Ok(ConsoleAction::Shutdown);
        }
        other => {
            log::warn!("invalid console command: {}", other);
        }
    }
    Ok(ConsoleAction::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn run(line: &str, state: &mut ConsoleState, link: &mut MockTransport) -> ConsoleAction {
        let registry = NodeRegistry::new();
        let mut commander = SocCommander::new();
        handle_line(line, state, &registry, &mut commander, link).unwrap()
    }

    #[test]
    fn test_parse_num() {
        assert_eq!(parse_num("0x1234"), Some(0x1234));
        assert_eq!(parse_num("0XAB"), Some(0xAB));
        assert_eq!(parse_num("42"), Some(42));
        assert_eq!(parse_num("zz"), None);
    }

    #[test]
    fn test_setonoff_builds_frame() {
        let mut state = ConsoleState::default();
        let mut link = MockTransport::new();
        run("setonoff -n0x1234 -m2 -e0x0B -v1", &mut state, &mut link);

        let frame = link.get_written();
        assert_eq!(frame[0], 0xFE);
        assert_eq!(frame[5..7], [0x34, 0x12]); // destination
        assert_eq!(frame[8..10], [0x06, 0x00]); // on-off cluster
        assert_eq!(*frame.last().unwrap(), 1);
    }

    #[test]
    fn test_params_are_sticky() {
        let mut state = ConsoleState::default();
        let mut link = MockTransport::new();
        run("setonoff -n0x1234 -m2 -e0x0B -v1", &mut state, &mut link);

        // No params this time; destination carries over
        link.clear_written();
        run("setlevel -v0x80 -t10", &mut state, &mut link);

        let frame = link.get_written();
        assert_eq!(frame[5..7], [0x34, 0x12]);
        assert_eq!(frame[8..10], [0x08, 0x00]); // level cluster
        assert_eq!(frame[15..18], [0x80, 10, 0]); // level + transition time
    }

    #[test]
    fn test_exit_requests_shutdown() {
        let mut state = ConsoleState::default();
        let mut link = MockTransport::new();
        assert_eq!(run("exit", &mut state, &mut link), ConsoleAction::Shutdown);
    }

    #[test]
    fn test_invalid_command_writes_nothing() {
        let mut state = ConsoleState::default();
        let mut link = MockTransport::new();
        assert_eq!(
            run("frobnicate -n0x1234", &mut state, &mut link),
            ConsoleAction::Continue
        );
        assert!(link.get_written().is_empty());
        // Parameters still stick even on an invalid command
        assert_eq!(state.nwk_addr, 0x1234);
    }

    #[test]
    fn test_getnodes_sends_control_frame() {
        let mut state = ConsoleState::default();
        let mut link = MockTransport::new();
        run("getnodes", &mut state, &mut link);

        let frame = link.get_written();
        assert_eq!(frame[2..4], [0x49, 0x00]);
        assert_eq!(frame[14], 0x08); // get-nodes command id
    }
}
