//! Device and network configuration
//!
//! This module contains the configuration inputs of the joining controller
//! and the session record it maintains:
//! - Join configuration (PAN id, beacon/superframe order, timers, FH options)
//! - Channel masks
//! - Session state and the device/parent descriptors

/// Channel bitsets
pub mod channels;

/// Join configuration and address types
pub mod device;

/// Session state and descriptors
pub mod session;

pub use channels::{ChannelMask, MaskKind};
pub use device::{
    ExtAddr, FhConfig, JoinConfig, PanId, ShortAddr, TrickleConfig, BEACON_ORDER_NON_BEACON,
    PAN_ID_ANY, SHORT_ADDR_NONE,
};
pub use session::{CoordinatorAddress, DeviceDescriptor, ParentInfo, SessionState};
