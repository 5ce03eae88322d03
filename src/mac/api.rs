use crate::config::{ChannelMask, ExtAddr, PanId, ShortAddr};

use super::types::{Address, DisassociateReason, FhFrameType, ScanType, SecurityDescriptor};

/// Scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanRequest {
    /// Kind of scan
    pub scan_type: ScanType,
    /// Channels to scan
    pub channels: ChannelMask,
    /// Scan duration exponent
    pub duration: u8,
    /// Channel page
    pub channel_page: u8,
    /// Security applied to beacon requests / orphan notifications
    pub security: SecurityDescriptor,
}

/// Capability information sent with an association request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapabilityInfo {
    /// Device is a full-function device
    pub ffd: bool,
    /// Device runs from mains power
    pub mains_powered: bool,
    /// Receiver stays on when idle
    pub rx_on_when_idle: bool,
    /// Device can secure frames
    pub security: bool,
    /// Ask the coordinator to allocate a short address
    pub allocate_address: bool,
}

/// Association request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AssociateRequest {
    /// Channel of the coordinator (ignored in FH mode)
    pub logical_channel: u8,
    /// Channel page
    pub channel_page: u8,
    /// Coordinator address
    pub coord_address: Address,
    /// Coordinator PAN
    pub coord_pan_id: PanId,
    /// Capabilities of this device
    pub capability: CapabilityInfo,
    /// Security of the request
    pub security: SecurityDescriptor,
}

/// Poll (data request) to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollRequest {
    /// Coordinator address
    pub coord_address: Address,
    /// Coordinator PAN
    pub coord_pan_id: PanId,
    /// Security of the request
    pub security: SecurityDescriptor,
}

/// Beacon synchronisation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncRequest {
    /// Channel to synchronise on
    pub logical_channel: u8,
    /// Channel page
    pub channel_page: u8,
    /// Keep tracking beacons after the first one
    pub track_beacon: bool,
}

/// Disassociation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisassociateRequest {
    /// Coordinator address
    pub device_address: Address,
    /// PAN
    pub device_pan_id: PanId,
    /// Reason
    pub reason: DisassociateReason,
    /// Send indirectly (sleepy device)
    pub tx_indirect: bool,
    /// Security of the request
    pub security: SecurityDescriptor,
}

/// Start or stop of an FH asynchronous transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AsyncOperation {
    /// Begin sending
    Start,
    /// Abort an ongoing transmission
    Stop,
}

/// FH asynchronous (solicitation) request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WsAsyncRequest {
    /// Start or stop
    pub operation: AsyncOperation,
    /// Frame to send
    pub frame_type: FhFrameType,
    /// Channels to send on
    pub channels: ChannelMask,
    /// Security of the frame
    pub security: SecurityDescriptor,
}

/// FH unicast channel functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelFunction {
    /// Stay on one channel
    Fixed,
    /// Direct hash channel function
    DirectHash,
}

/// PHY/MAC attributes written by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// PAN id
    PanId(PanId),
    /// Logical channel
    LogicalChannel(u8),
    /// Beacon order
    BeaconOrder(u8),
    /// Superframe order
    SuperframeOrder(u8),
    /// Receiver on when idle
    RxOnWhenIdle(bool),
    /// Automatically request pending data after beacons
    AutoRequest(bool),
    /// Own short address
    ShortAddress(ShortAddr),
    /// Coordinator short address
    CoordShortAddress(ShortAddr),
    /// Coordinator extended address
    CoordExtAddress(ExtAddr),
    /// FH unicast channel function
    FhUnicastChannelFunction(ChannelFunction),
    /// FH channels excluded from unicast hopping
    FhUnicastExcludedChannels(ChannelMask),
    /// FH channels used for asynchronous frames
    FhAsyncChannels(ChannelMask),
    /// FH PAN size advertised by the parent
    FhPanSize(u16),
    /// FH routing cost advertised by the parent
    FhRoutingCost(u16),
    /// FH PAN version from the PAN configuration
    FhPanVersion(u16),
    /// FH GTK hash slot from the PAN configuration
    FhGtkHash {
        /// Slot index (0..4)
        index: u8,
        /// Truncated key hash
        hash: [u8; 8],
    },
}

/// Interface of the MAC engine consumed by the controller
///
/// Requests return as soon as they are queued; their outcome arrives later as
/// a [`super::MacEvent`].
pub trait MacEngine {
    /// Error type for request submission
    type Error;

    /// Start a scan
    fn scan_request(&mut self, req: &ScanRequest) -> Result<(), Self::Error>;

    /// Send an association request
    fn associate_request(&mut self, req: &AssociateRequest) -> Result<(), Self::Error>;

    /// Poll the coordinator for pending data
    fn poll_request(&mut self, req: &PollRequest) -> Result<(), Self::Error>;

    /// Synchronise with the coordinator's beacons
    fn sync_request(&mut self, req: &SyncRequest) -> Result<(), Self::Error>;

    /// Leave the network
    fn disassociate_request(&mut self, req: &DisassociateRequest) -> Result<(), Self::Error>;

    /// Send or stop an FH asynchronous frame
    fn ws_async_request(&mut self, req: &WsAsyncRequest) -> Result<(), Self::Error>;

    /// Write a PHY/MAC attribute
    fn set_attribute(&mut self, attr: Attribute) -> Result<(), Self::Error>;

    /// Read the PAN id currently in effect
    fn pan_id(&mut self) -> Result<PanId, Self::Error>;
}
