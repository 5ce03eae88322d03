use core::time::Duration;

use super::device::{ExtAddr, JoinConfig, PanId, ShortAddr, SHORT_ADDR_NONE};
use crate::jdllc::state::{JoinState, SubState};

/// Identity of this device inside a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceDescriptor {
    /// PAN the device belongs to
    pub pan_id: PanId,
    /// Short address assigned by the coordinator
    pub short_address: ShortAddr,
    /// Extended address
    pub ext_address: ExtAddr,
}

/// Identity of the parent coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParentInfo {
    /// Coordinator short address ([`SHORT_ADDR_NONE`] in FH networks)
    pub short_address: ShortAddr,
    /// Coordinator extended address (zero when only the short one is known)
    pub ext_address: ExtAddr,
    /// Logical channel in fixed-channel networks
    pub channel: Option<u8>,
    /// Parent was found through FH solicitation
    pub fh: bool,
}

/// Coordinator addressing as learnt from a beacon, advertisement or NV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoordinatorAddress {
    /// Short address, [`SHORT_ADDR_NONE`] if unknown
    pub short: ShortAddr,
    /// Extended address, zero if unknown
    pub ext: ExtAddr,
}

impl CoordinatorAddress {
    /// Coordinator known only by its short address
    pub fn short(short: ShortAddr) -> Self {
        Self { short, ext: [0; 8] }
    }

    /// Coordinator known only by its extended address
    pub fn extended(ext: ExtAddr) -> Self {
        Self {
            short: SHORT_ADDR_NONE,
            ext,
        }
    }
}

/// Mutable record of the current network membership
///
/// High-level state and sub-state are kept in pairs with their previous
/// values and only change through [`SessionState::set_state`] and
/// [`SessionState::set_sub_state`].
#[derive(Debug, Clone)]
pub struct SessionState {
    /// PAN joined or being joined ([`super::PAN_ID_ANY`] until one is adopted)
    pub network_id: PanId,
    /// Logical channel of the parent, unset until one is selected
    pub channel: Option<u8>,
    /// Beacon order in effect
    pub beacon_order: u8,
    /// Superframe order in effect
    pub superframe_order: u8,
    /// Selected coordinator, if any
    pub coordinator: Option<CoordinatorAddress>,
    /// Short address assigned to this device
    pub own_short: ShortAddr,
    /// This device's extended address
    pub own_ext: ExtAddr,
    /// Consecutive failed poll/data exchanges
    pub consecutive_data_failures: u8,
    /// Keep-alive poll interval
    pub poll_interval: Duration,
    state: JoinState,
    previous_state: JoinState,
    sub_state: SubState,
    previous_sub_state: SubState,
}

impl SessionState {
    /// Fresh session derived from the configuration
    pub fn new(config: &JoinConfig) -> Self {
        Self {
            network_id: config.pan_id,
            channel: None,
            beacon_order: config.beacon_order,
            superframe_order: config.superframe_order,
            coordinator: None,
            own_short: SHORT_ADDR_NONE,
            own_ext: config.ext_address,
            consecutive_data_failures: 0,
            poll_interval: config.poll_interval,
            state: JoinState::InitWaiting,
            previous_state: JoinState::InitWaiting,
            sub_state: SubState::Idle,
            previous_sub_state: SubState::Idle,
        }
    }

    /// Current high-level state
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// High-level state before the last change
    pub fn previous_state(&self) -> JoinState {
        self.previous_state
    }

    /// Current sub-state
    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    /// Sub-state before the last change
    pub fn previous_sub_state(&self) -> SubState {
        self.previous_sub_state
    }

    /// Move to `state`, remembering the current one
    pub(crate) fn set_state(&mut self, state: JoinState) {
        self.previous_state = self.state;
        self.state = state;
    }

    /// Move to `sub_state`, remembering the current one
    pub(crate) fn set_sub_state(&mut self, sub_state: SubState) {
        self.previous_sub_state = self.sub_state;
        self.sub_state = sub_state;
    }

    /// Forget the network, keeping only the device's own identity
    pub(crate) fn reset(&mut self, config: &JoinConfig) {
        *self = Self::new(config);
    }

    /// Descriptor of this device in the current network
    pub fn device_descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            pan_id: self.network_id,
            short_address: self.own_short,
            ext_address: self.own_ext,
        }
    }

    /// Descriptor of the selected parent, if any
    pub fn parent_info(&self, fh: bool) -> Option<ParentInfo> {
        self.coordinator.map(|coord| ParentInfo {
            short_address: coord.short,
            ext_address: coord.ext,
            channel: self.channel,
            fh,
        })
    }

    /// Record a failed data/poll exchange, returning the new count
    pub fn record_data_failure(&mut self) -> u8 {
        self.consecutive_data_failures = self.consecutive_data_failures.saturating_add(1);
        self.consecutive_data_failures
    }

    /// Record a successful data/poll exchange
    pub fn record_data_success(&mut self) {
        self.consecutive_data_failures = 0;
    }
}
