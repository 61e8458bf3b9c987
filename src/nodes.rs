//! Node registry for devices known to the coordinator
//!
//! Fixed-capacity table keyed by (network address, extended address).
//! Entries are created when a device-announce arrives and are never
//! deleted; the table is reset once at startup. Capacity exhaustion and
//! duplicates are reported explicitly so callers can log them.

use crate::soc::constants::{
    HA_DEV_COLOR_DIMMABLE_LIGHT, HA_DEV_COLOR_DIMMER_SWITCH, HA_DEV_DIMMABLE_LIGHT,
    HA_DEV_DIMMER_SWITCH, HA_DEV_ONOFF_LIGHT, HA_DEV_ONOFF_LIGHT_SWITCH, HA_DEV_ONOFF_SWITCH,
    HA_DEV_ZLL_COLOR_LIGHT,
};

/// Maximum number of tracked devices
pub const MAX_NODES: usize = 10;

/// Network address marking an unoccupied slot
pub const EMPTY_NWK_ADDR: u16 = 0xFFFF;

/// Extended address marking an unoccupied slot
pub const EMPTY_EXT_ADDR: [u8; 8] = [0xFF; 8];

/// Device categories reported to clients
///
/// Discriminants are the client-protocol encoding and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceType {
    Gateway = 0,
    Light = 1,
    Sensor = 2,
    Switch = 3,
    Unknown = 4,
}

impl DeviceType {
    /// Classify an HA profile device id (full table)
    pub fn from_device_id(device_id: u16) -> Self {
        match device_id {
            HA_DEV_ONOFF_LIGHT
            | HA_DEV_DIMMABLE_LIGHT
            | HA_DEV_COLOR_DIMMABLE_LIGHT
            | HA_DEV_ZLL_COLOR_LIGHT => DeviceType::Light,
            HA_DEV_ONOFF_SWITCH
            | HA_DEV_ONOFF_LIGHT_SWITCH
            | HA_DEV_DIMMER_SWITCH
            | HA_DEV_COLOR_DIMMER_SWITCH => DeviceType::Switch,
            _ => DeviceType::Unknown,
        }
    }

    /// Classification used for device-announce broadcasts.
    ///
    /// Matches the coordinator bridge as deployed: only the light profile
    /// ids are recognized on this path, everything else reports Unknown
    /// (the switch ids are classified only when stored in the registry).
    pub fn from_announce(device_id: u16) -> Self {
        match device_id {
            HA_DEV_ONOFF_LIGHT
            | HA_DEV_DIMMABLE_LIGHT
            | HA_DEV_COLOR_DIMMABLE_LIGHT
            | HA_DEV_ZLL_COLOR_LIGHT => DeviceType::Light,
            _ => DeviceType::Unknown,
        }
    }

    /// Wire encoding for the client protocol
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One known device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeEntry {
    pub device_type: DeviceType,
    pub device_id: u16,
    pub endpoint: u8,
    pub capability: u8,
    pub nwk_addr: u16,
    pub ext_addr: [u8; 8],
    pub in_group: bool,
}

impl NodeEntry {
    fn empty() -> Self {
        NodeEntry {
            device_type: DeviceType::Unknown,
            device_id: 0xFFFF,
            endpoint: 0xFF,
            capability: 0xFF,
            nwk_addr: EMPTY_NWK_ADDR,
            ext_addr: EMPTY_EXT_ADDR,
            in_group: false,
        }
    }

    /// True when this slot holds no device
    pub fn is_empty(&self) -> bool {
        self.nwk_addr == EMPTY_NWK_ADDR
    }
}

/// Outcome of a registry insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyKnown,
    Full,
}

/// Fixed-capacity device table
#[derive(Debug)]
pub struct NodeRegistry {
    entries: [NodeEntry; MAX_NODES],
    count: usize,
}

impl NodeRegistry {
    pub fn new() -> Self {
        NodeRegistry {
            entries: [NodeEntry::empty(); MAX_NODES],
            count: 0,
        }
    }

    /// Clear all entries to the empty sentinel
    pub fn reset(&mut self) {
        self.entries = [NodeEntry::empty(); MAX_NODES];
        self.count = 0;
    }

    /// Find the entry matching both addresses
    pub fn search(&self, nwk_addr: u16, ext_addr: &[u8; 8]) -> Option<&NodeEntry> {
        self.entries
            .iter()
            .find(|e| e.nwk_addr == nwk_addr && &e.ext_addr == ext_addr)
    }

    /// Insert a newly announced device
    ///
    /// Duplicates (same address pair) and a full table leave the registry
    /// unchanged; the outcome says which.
    pub fn add(
        &mut self,
        nwk_addr: u16,
        ext_addr: [u8; 8],
        capability: u8,
        device_id: u16,
        endpoint: u8,
    ) -> AddOutcome {
        if self.search(nwk_addr, &ext_addr).is_some() {
            return AddOutcome::AlreadyKnown;
        }

        let Some(slot) = self.entries.iter_mut().find(|e| e.is_empty()) else {
            return AddOutcome::Full;
        };

        *slot = NodeEntry {
            device_type: DeviceType::from_device_id(device_id),
            device_id,
            endpoint,
            capability,
            nwk_addr,
            ext_addr,
            in_group: false,
        };
        self.count += 1;
        AddOutcome::Added
    }

    /// Positional access for enumeration
    pub fn get(&self, index: usize) -> Option<&NodeEntry> {
        self.entries.get(index)
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.count
    }

    /// Iterate over occupied slots
    pub fn iter_occupied(&self) -> impl Iterator<Item = &NodeEntry> {
        self.entries.iter().filter(|e| !e.is_empty())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
