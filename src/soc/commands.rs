//! Command translation: logical device actions to coordinator frames
//!
//! Each public method builds one outbound frame and writes it to the
//! serial link. Fire-and-forget: nothing here waits for a reply, the
//! response (if any) comes back through the dispatcher.
//!
//! The translator owns the ZCL transaction sequence number. Every
//! ZCL-addressed command (data-class or simple RPC) consumes one value;
//! the counter wraps at 256. It is plain mutable state because all
//! senders live on the single scheduler thread; a multi-threaded port
//! would need to synchronize it.

use crate::error::Result;
use crate::soc::constants::*;
use crate::soc::frame::calc_fcs;
use crate::transport::Transport;

/// Destination addressing selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddrMode {
    NoAddress = 0,
    Group = 1,
    Short = 2,
    Long = 3,
}

impl AddrMode {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => AddrMode::Group,
            2 => AddrMode::Short,
            3 => AddrMode::Long,
            _ => AddrMode::NoAddress,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Where a device command is sent: network address or group id, plus the
/// device endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub addr: u16,
    pub endpoint: u8,
    pub mode: AddrMode,
}

impl Destination {
    pub fn new(addr: u16, endpoint: u8, mode: AddrMode) -> Self {
        Destination {
            addr,
            endpoint,
            mode,
        }
    }

    /// Unicast to a network address on the default application endpoint
    pub fn unicast(addr: u16) -> Self {
        Self::new(addr, APP_ENDPOINT, AddrMode::Short)
    }
}

/// Builds and sends coordinator-bound command frames
#[derive(Debug, Default)]
pub struct SocCommander {
    seq: u8,
}

// Frame builders. Kept as free functions so tests can assert on exact
// byte layouts without a transport.

/// Data-class app command: `0x49 0x00` selector, no checksum
fn data_frame(seq: u8, cluster: u16, data_len: u8, cmd_id: u8, payload: &[u8], dst: Destination) -> Vec<u8> {
    let len = (2 + 11 + payload.len()) as u8;
    let mut frame = vec![
        SOC_SOF,
        len,
        APP_CMD0,
        APP_CMD1_REQUEST,
        APP_ENDPOINT,
        dst.addr as u8,
        (dst.addr >> 8) as u8,
        dst.endpoint,
        cluster as u8,
        (cluster >> 8) as u8,
        data_len,
        dst.mode.as_u8(),
        0x01, // ZCL frame control: cluster-specific
        seq,
        cmd_id,
    ];
    frame.extend_from_slice(payload);
    frame
}

/// Control-class app command: fixed 0xFFFF cluster, reserved fields zeroed
fn ctrl_frame(cmd_id: u8, payload: &[u8]) -> Vec<u8> {
    let len = (2 + 13 + payload.len()) as u8;
    let mut frame = vec![
        SOC_SOF,
        len,
        APP_CMD0,
        APP_CMD1_REQUEST,
        APP_ENDPOINT,
        0x00,
        0x00,
        0x00,
        CTRL_CLUSTER_ID as u8,
        (CTRL_CLUSTER_ID >> 8) as u8,
        0x03, // control data length, fixed by the coordinator firmware
        0x00,
        0x00,
        0x00,
        cmd_id,
        0x00,
        0x00,
    ];
    frame.extend_from_slice(payload);
    frame
}

/// Simple RPC command: `0x29 0x00` selector with XOR checksum trailer
#[allow(clippy::too_many_arguments)]
fn simple_frame(
    dst: Destination,
    cluster: u16,
    data_len: u8,
    frame_ctrl: u8,
    seq: u8,
    cmd_id: u8,
    payload: &[u8],
) -> Vec<u8> {
    let len = (11 + payload.len()) as u8;
    let mut frame = vec![
        SOC_SOF,
        len,
        MT_RPC_AREQ_APP,
        MT_APP_MSG,
        APP_ENDPOINT,
        dst.addr as u8,
        (dst.addr >> 8) as u8,
        dst.endpoint,
        cluster as u8,
        (cluster >> 8) as u8,
        data_len,
        dst.mode.as_u8(),
        frame_ctrl,
        seq,
        cmd_id,
    ];
    frame.extend_from_slice(payload);
    let fcs = calc_fcs(&frame[1..]);
    frame.push(fcs);
    frame
}

/// Fixed destination used by the touch-link command group
fn touchlink_dst() -> Destination {
    Destination::new(0x0002, APP_ENDPOINT, AddrMode::Short)
}

impl SocCommander {
    pub fn new() -> Self {
        SocCommander { seq: 0 }
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    fn send<T: Transport + ?Sized>(&self, link: &mut T, frame: &[u8]) -> Result<()> {
        log::debug!("soc tx frame: {:02X?}", frame);
        link.write_all(frame)
    }

    /// Start a touch-link scan
    pub fn touchlink<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let frame = simple_frame(touchlink_dst(), CTRL_CLUSTER_ID, 6, 0x00, 0x00, CTRL_CMD_TOUCHLINK, &[0, 0]);
        self.send(link, &frame)
    }

    /// Reset the coordinator itself to factory-new
    pub fn reset_to_fn<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let frame = simple_frame(touchlink_dst(), CTRL_CLUSTER_ID, 6, 0x00, 0x00, CTRL_CMD_RESET_TO_FN, &[0, 0]);
        self.send(link, &frame)
    }

    /// Ask the touch-linked device to reset to factory-new
    pub fn send_reset_to_fn<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let frame = simple_frame(touchlink_dst(), CTRL_CLUSTER_ID, 6, 0x00, 0x00, CTRL_CMD_SEND_RESET_TO_FN, &[0, 0]);
        self.send(link, &frame)
    }

    /// Turn a light (or group) on or off
    pub fn set_state<T: Transport + ?Sized>(&mut self, link: &mut T, on: bool, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let frame = data_frame(seq, CLUSTER_ON_OFF, 3, on as u8, &[], dst);
        self.send(link, &frame)
    }

    /// Move to a brightness level over a transition time
    pub fn set_level<T: Transport + ?Sized>(&mut self, link: &mut T, level: u8, time: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [level, time as u8, (time >> 8) as u8];
        let frame = data_frame(seq, CLUSTER_LEVEL_CONTROL, 6, CMD_LEVEL_MOVE_TO_LEVEL_WITH_ONOFF, &payload, dst);
        self.send(link, &frame)
    }

    /// Move to a hue over a transition time
    pub fn set_hue<T: Transport + ?Sized>(&mut self, link: &mut T, hue: u8, time: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [hue, time as u8, (time >> 8) as u8];
        let frame = data_frame(seq, CLUSTER_COLOR_CONTROL, 8, CMD_LIGHTING_MOVE_TO_HUE, &payload, dst);
        self.send(link, &frame)
    }

    /// Move to a saturation over a transition time
    pub fn set_sat<T: Transport + ?Sized>(&mut self, link: &mut T, sat: u8, time: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [sat, time as u8, (time >> 8) as u8];
        let frame = simple_frame(dst, CLUSTER_COLOR_CONTROL, 7, 0x01, seq, CMD_LIGHTING_MOVE_TO_SATURATION, &payload);
        self.send(link, &frame)
    }

    /// Move to hue and saturation in one command
    pub fn set_hue_sat<T: Transport + ?Sized>(&mut self, link: &mut T, hue: u8, sat: u8, time: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [hue, sat, time as u8, (time >> 8) as u8];
        let frame = simple_frame(dst, CLUSTER_COLOR_CONTROL, 8, 0x01, seq, CMD_LIGHTING_MOVE_TO_HUE_AND_SAT, &payload);
        self.send(link, &frame)
    }

    /// Blink a light for identification
    pub fn identify<T: Transport + ?Sized>(&mut self, link: &mut T, time: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [time as u8, (time >> 8) as u8];
        let frame = data_frame(seq, CLUSTER_IDENTIFY, 6, 0x00, &payload, dst);
        self.send(link, &frame)
    }

    /// Add the destination device to a group
    pub fn add_group<T: Transport + ?Sized>(&mut self, link: &mut T, group_id: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        // Trailing zero: empty group name, names are not pushed to devices
        let payload = [group_id as u8, (group_id >> 8) as u8, 0x00];
        let frame = data_frame(seq, CLUSTER_GROUPS, 7, CMD_GROUP_ADD, &payload, dst);
        self.send(link, &frame)
    }

    /// Store the current device state as a scene
    pub fn store_scene<T: Transport + ?Sized>(&mut self, link: &mut T, group_id: u16, scene_id: u8, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [group_id as u8, (group_id >> 8) as u8, scene_id];
        let frame = simple_frame(dst, CLUSTER_SCENES, 7, 0x01, seq, CMD_SCENE_STORE, &payload);
        self.send(link, &frame)
    }

    /// Recall a stored scene
    pub fn recall_scene<T: Transport + ?Sized>(&mut self, link: &mut T, group_id: u16, scene_id: u8, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [group_id as u8, (group_id >> 8) as u8, scene_id];
        let frame = simple_frame(dst, CLUSTER_SCENES, 7, 0x01, seq, CMD_SCENE_RECALL, &payload);
        self.send(link, &frame)
    }

    /// Flash-reset a light (on-off cluster command 0x04)
    pub fn flash_reset<T: Transport + ?Sized>(&mut self, link: &mut T, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let frame = data_frame(seq, CLUSTER_ON_OFF, 3, CMD_ONOFF_FLASH_RESET, &[], dst);
        self.send(link, &frame)
    }

    fn read_attribute<T: Transport + ?Sized>(&mut self, link: &mut T, cluster: u16, attr_id: u16, dst: Destination) -> Result<()> {
        let seq = self.next_seq();
        let payload = [attr_id as u8, (attr_id >> 8) as u8];
        // Frame control 0x00: foundation command, not cluster-specific
        let frame = simple_frame(dst, cluster, 6, 0x00, seq, ZCL_CMD_READ, &payload);
        self.send(link, &frame)
    }

    /// Query the on/off state attribute
    pub fn get_state<T: Transport + ?Sized>(&mut self, link: &mut T, dst: Destination) -> Result<()> {
        self.read_attribute(link, CLUSTER_ON_OFF, ATTR_ON_OFF, dst)
    }

    /// Query the current level attribute
    pub fn get_level<T: Transport + ?Sized>(&mut self, link: &mut T, dst: Destination) -> Result<()> {
        self.read_attribute(link, CLUSTER_LEVEL_CONTROL, ATTR_LEVEL_CURRENT_LEVEL, dst)
    }

    /// Query the current hue attribute
    pub fn get_hue<T: Transport + ?Sized>(&mut self, link: &mut T, dst: Destination) -> Result<()> {
        self.read_attribute(link, CLUSTER_COLOR_CONTROL, ATTR_COLOR_CURRENT_HUE, dst)
    }

    /// Query the current saturation attribute
    pub fn get_sat<T: Transport + ?Sized>(&mut self, link: &mut T, dst: Destination) -> Result<()> {
        self.read_attribute(link, CLUSTER_COLOR_CONTROL, ATTR_COLOR_CURRENT_SATURATION, dst)
    }

    /// Bind a remote controller to the coordinator (demo bind)
    pub fn demo_bind<T: Transport + ?Sized>(&mut self, link: &mut T, addr_mode: AddrMode, addr: u16) -> Result<()> {
        let payload = [addr as u8, (addr >> 8) as u8, addr_mode.as_u8()];
        let frame = ctrl_frame(CTRL_CMD_DEMO_BIND, &payload);
        self.send(link, &frame)
    }

    /// Trigger end-device binding on the coordinator
    pub fn end_dev_bind<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let frame = ctrl_frame(CTRL_CMD_END_DEV_BIND, &[]);
        self.send(link, &frame)
    }

    /// Ask the coordinator for its node list
    pub fn get_nodes<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let frame = ctrl_frame(CTRL_CMD_GET_NODES, &[]);
        self.send(link, &frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn unicast() -> Destination {
        Destination::unicast(0x1234)
    }

    /// Split a capture of consecutive frames on the SOF/length framing
    fn split_frames(mut bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while !bytes.is_empty() {
            assert_eq!(bytes[0], SOC_SOF);
            let len = bytes[1] as usize;
            // Simple family len excludes the 2 selector bytes and the
            // trailing FCS; data/control len covers the selector onward
            let total = if bytes[2] == MT_RPC_AREQ_APP {
                2 + 2 + len + 1
            } else {
                2 + len
            };
            frames.push(bytes[..total].to_vec());
            bytes = &bytes[total..];
        }
        frames
    }

    #[test]
    fn test_set_state_layout() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        cmd.set_state(&mut link, true, unicast()).unwrap();

        let frame = link.get_written();
        assert_eq!(
            frame,
            vec![
                0xFE, 13, 0x49, 0x00, 0x0B, 0x34, 0x12, 0x0B, 0x06, 0x00, 3, 0x02, 0x01, 0x00,
                0x01,
            ]
        );
    }

    #[test]
    fn test_set_level_layout() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        cmd.set_level(&mut link, 0x40, 0x0102, unicast()).unwrap();

        let frame = link.get_written();
        assert_eq!(
            frame,
            vec![
                0xFE, 16, 0x49, 0x00, 0x0B, 0x34, 0x12, 0x0B, 0x08, 0x00, 6, 0x02, 0x01, 0x00,
                0x04, 0x40, 0x02, 0x01,
            ]
        );
    }

    #[test]
    fn test_add_group_layout() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        cmd.add_group(&mut link, 0x0005, unicast()).unwrap();

        let frame = link.get_written();
        assert_eq!(
            frame,
            vec![
                0xFE, 16, 0x49, 0x00, 0x0B, 0x34, 0x12, 0x0B, 0x04, 0x00, 7, 0x02, 0x01, 0x00,
                0x00, 0x05, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_demo_bind_layout() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        cmd.demo_bind(&mut link, AddrMode::Group, 0x00AB).unwrap();

        let frame = link.get_written();
        assert_eq!(
            frame,
            vec![
                0xFE, 18, 0x49, 0x00, 0x0B, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x00, 0x00,
                0x0A, 0x00, 0x00, 0xAB, 0x00, 0x01,
            ]
        );
    }

    #[test]
    fn test_simple_family_checksums() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        let dst = unicast();

        cmd.touchlink(&mut link).unwrap();
        cmd.reset_to_fn(&mut link).unwrap();
        cmd.send_reset_to_fn(&mut link).unwrap();
        cmd.set_sat(&mut link, 0x60, 0x000A, dst).unwrap();
        cmd.set_hue_sat(&mut link, 0x20, 0x60, 0x000A, dst).unwrap();
        cmd.store_scene(&mut link, 0x0005, 1, dst).unwrap();
        cmd.recall_scene(&mut link, 0x0005, 1, dst).unwrap();
        cmd.get_state(&mut link, dst).unwrap();
        cmd.get_level(&mut link, dst).unwrap();
        cmd.get_hue(&mut link, dst).unwrap();
        cmd.get_sat(&mut link, dst).unwrap();

        let frames = split_frames(&link.get_written());
        assert_eq!(frames.len(), 11);
        for frame in frames {
            assert_eq!(frame[2], MT_RPC_AREQ_APP);
            let fcs = *frame.last().unwrap();
            // Checksum covers length byte through last payload byte
            assert_eq!(fcs, calc_fcs(&frame[1..frame.len() - 1]));
        }
    }

    #[test]
    fn test_get_state_matches_reference_bytes() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();
        cmd.get_state(&mut link, unicast()).unwrap();

        let frame = link.get_written();
        let expected_body = [
            0xFE, 13, 0x29, 0x00, 0x0B, 0x34, 0x12, 0x0B, 0x06, 0x00, 0x06, 0x02, 0x00, 0x00,
            0x00, 0x00, 0x00,
        ];
        assert_eq!(&frame[..expected_body.len()], &expected_body);
        assert_eq!(frame.len(), expected_body.len() + 1); // + FCS
    }

    #[test]
    fn test_seq_wraps_and_never_repeats() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();

        let mut seen = Vec::with_capacity(256);
        for _ in 0..256 {
            link.clear_written();
            cmd.set_state(&mut link, true, unicast()).unwrap();
            // Sequence number sits at offset 13 of the data-class frame
            seen.push(link.get_written()[13]);
        }

        for (i, seq) in seen.iter().enumerate() {
            assert_eq!(*seq, i as u8);
        }

        // 257th send wraps back to 0
        link.clear_written();
        cmd.set_state(&mut link, true, unicast()).unwrap();
        assert_eq!(link.get_written()[13], 0);
    }

    #[test]
    fn test_control_commands_do_not_consume_seq() {
        let mut link = MockTransport::new();
        let mut cmd = SocCommander::new();

        cmd.touchlink(&mut link).unwrap();
        cmd.get_nodes(&mut link).unwrap();
        cmd.end_dev_bind(&mut link).unwrap();

        link.clear_written();
        cmd.set_state(&mut link, true, unicast()).unwrap();
        assert_eq!(link.get_written()[13], 0);
    }
}
