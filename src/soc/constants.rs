//! Wire constants for the coordinator RPC protocol

/// Start-of-frame marker on the serial link
pub const SOC_SOF: u8 = 0xFE;

/// First selector byte of the app-command family
pub const APP_CMD0: u8 = 0x49;
/// Second selector byte of an outbound app command
pub const APP_CMD1_REQUEST: u8 = 0x00;
/// Selector of an inbound data-class (ZCL) response
pub const APP_CMD1_DATA_RSP: u8 = 0x80;
/// Selector of an inbound control-class response
pub const APP_CMD1_CTRL_RSP: u8 = 0x81;

/// MT_RPC_CMD_AREQ | MT_RPC_SYS_APP, first byte of the simple RPC family
pub const MT_RPC_AREQ_APP: u8 = 0x29;
/// MT_APP_MSG, second byte of the simple RPC family
pub const MT_APP_MSG: u8 = 0x00;

/// Application endpoint on the coordinator side
pub const APP_ENDPOINT: u8 = 0x0B;

/// Cluster id placeholder used by control-class commands
pub const CTRL_CLUSTER_ID: u16 = 0xFFFF;

// Control-pipe command ids
pub const CTRL_CMD_TOUCHLINK: u8 = 0x01;
pub const CTRL_CMD_RESET_TO_FN: u8 = 0x02;
pub const CTRL_CMD_SEND_RESET_TO_FN: u8 = 0x06;
pub const CTRL_CMD_DEV_ANN_IND: u8 = 0x07;
pub const CTRL_CMD_GET_NODES: u8 = 0x08;
pub const CTRL_CMD_END_DEV_BIND: u8 = 0x09;
pub const CTRL_CMD_DEMO_BIND: u8 = 0x0A;

// General cluster ids
pub const CLUSTER_IDENTIFY: u16 = 0x0003;
pub const CLUSTER_GROUPS: u16 = 0x0004;
pub const CLUSTER_SCENES: u16 = 0x0005;
pub const CLUSTER_ON_OFF: u16 = 0x0006;
pub const CLUSTER_LEVEL_CONTROL: u16 = 0x0008;
pub const CLUSTER_COLOR_CONTROL: u16 = 0x0300;

// ZCL foundation command ids
pub const ZCL_CMD_READ: u8 = 0x00;

// Cluster-specific command ids
pub const CMD_LEVEL_MOVE_TO_LEVEL_WITH_ONOFF: u8 = 0x04;
pub const CMD_LIGHTING_MOVE_TO_HUE: u8 = 0x00;
pub const CMD_LIGHTING_MOVE_TO_SATURATION: u8 = 0x03;
pub const CMD_LIGHTING_MOVE_TO_HUE_AND_SAT: u8 = 0x06;
pub const CMD_GROUP_ADD: u8 = 0x00;
pub const CMD_GROUP_DEFAULT_RSP: u8 = 0x0B;
pub const CMD_SCENE_STORE: u8 = 0x04;
pub const CMD_SCENE_RECALL: u8 = 0x05;
/// On-off cluster command id doubling as the flash-reset marker
pub const CMD_ONOFF_FLASH_RESET: u8 = 0x04;

// Attribute ids for foundation reads
pub const ATTR_ON_OFF: u16 = 0x0000;
pub const ATTR_LEVEL_CURRENT_LEVEL: u16 = 0x0000;
pub const ATTR_COLOR_CURRENT_HUE: u16 = 0x0000;
pub const ATTR_COLOR_CURRENT_SATURATION: u16 = 0x0001;

// HA profile device ids used for classification
pub const HA_DEV_ONOFF_SWITCH: u16 = 0x0000;
pub const HA_DEV_ONOFF_LIGHT: u16 = 0x0100;
pub const HA_DEV_DIMMABLE_LIGHT: u16 = 0x0101;
pub const HA_DEV_COLOR_DIMMABLE_LIGHT: u16 = 0x0102;
pub const HA_DEV_ONOFF_LIGHT_SWITCH: u16 = 0x0103;
pub const HA_DEV_DIMMER_SWITCH: u16 = 0x0104;
pub const HA_DEV_COLOR_DIMMER_SWITCH: u16 = 0x0105;
/// ZLL color light, outside the HA lighting range but announced by ZLL bulbs
pub const HA_DEV_ZLL_COLOR_LIGHT: u16 = 0x0210;
