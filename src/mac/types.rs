use heapless::Vec;

use crate::config::{ExtAddr, PanId, ShortAddr};

/// Largest MSDU carried in a data indication
pub const MAX_MSDU_SIZE: usize = 127;
/// Largest payload IE block carried in a WS-async indication
pub const MAX_IE_SIZE: usize = 128;

/// MAC status codes reported in confirms and indications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Operation completed
    Success = 0x00,
    /// Beacon tracking lost
    BeaconLoss = 0xE0,
    /// CSMA-CA could not find a clear channel
    ChannelAccessFailure = 0xE1,
    /// Security processing failed on an incoming frame
    SecurityError = 0xE4,
    /// Invalid parameter in the request
    InvalidParameter = 0xE8,
    /// No acknowledgement received
    NoAck = 0xE9,
    /// Scan found no beacon
    NoBeacon = 0xEA,
    /// Poll succeeded but the coordinator had nothing pending
    NoData = 0xEB,
    /// Indirect transaction expired
    TransactionExpired = 0xF0,
    /// Any other failure
    Other = 0xFF,
}

impl Status {
    /// Failure that counts towards the consecutive data-failure threshold
    pub fn is_delivery_failure(self) -> bool {
        matches!(self, Status::NoAck | Status::ChannelAccessFailure)
    }
}

/// Outcome of an association request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AssociateStatus {
    /// Association accepted
    Success,
    /// Coordinator has no room for more devices
    PanAtCapacity,
    /// Coordinator refuses this device
    PanAccessDenied,
    /// Request failed at the MAC level
    Mac(Status),
}

impl AssociateStatus {
    /// Refusal that must not be retried automatically
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AssociateStatus::PanAtCapacity | AssociateStatus::PanAccessDenied
        )
    }
}

/// Scan kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanType {
    /// Beacon requests sent on each channel
    Active,
    /// Listen for periodic beacons
    Passive,
    /// Orphan notification, answered by a coordinator realignment
    Orphan,
}

/// MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// 16-bit short address
    Short(ShortAddr),
    /// 64-bit extended address
    Extended(ExtAddr),
}

/// Disassociation reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisassociateReason {
    /// The coordinator asked the device to leave
    CoordinatorWishesLeave,
    /// The device asked to leave
    DeviceWishesLeave,
    /// Recovery gave up after repeated orphan scan failures (local only)
    LinkLost,
}

/// Superframe specification field of a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SuperframeSpec(pub u16);

impl SuperframeSpec {
    /// Build a superframe specification from its fields
    pub fn new(beacon_order: u8, superframe_order: u8, association_permit: bool) -> Self {
        let mut raw = u16::from(beacon_order & 0x0F) | (u16::from(superframe_order & 0x0F) << 4);
        if association_permit {
            raw |= 0x8000;
        }
        Self(raw)
    }

    /// Beacon order
    pub fn beacon_order(self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    /// Superframe order
    pub fn superframe_order(self) -> u8 {
        ((self.0 >> 4) & 0x0F) as u8
    }

    /// Coordinator is the PAN coordinator
    pub fn pan_coordinator(self) -> bool {
        self.0 & 0x4000 != 0
    }

    /// Coordinator accepts association requests
    pub fn association_permit(self) -> bool {
        self.0 & 0x8000 != 0
    }
}

/// Security parameters attached to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityDescriptor {
    /// Security level (0 = none)
    pub level: u8,
    /// Key identifier mode
    pub key_id_mode: u8,
    /// Key index
    pub key_index: u8,
    /// Key source
    pub key_source: [u8; 8],
}

/// Frame types exchanged through WS-async requests and indications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FhFrameType {
    /// PAN advertisement
    PanAdvert = 0x00,
    /// PAN advertisement solicit
    PanAdvertSolicit = 0x01,
    /// PAN configuration
    PanConfig = 0x02,
    /// PAN configuration solicit
    PanConfigSolicit = 0x03,
    /// Data
    Data = 0x04,
    /// Acknowledgement
    Ack = 0x05,
}

/// PAN descriptor reported with a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanDescriptor {
    /// Coordinator address
    pub coord_address: Address,
    /// Coordinator PAN id
    pub coord_pan_id: PanId,
    /// Logical channel the beacon was heard on
    pub logical_channel: u8,
    /// Channel page
    pub channel_page: u8,
    /// Superframe specification
    pub superframe_spec: SuperframeSpec,
    /// Link quality of the beacon
    pub link_quality: u8,
}

/// Beacon notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeaconNotify {
    /// Beacon sequence number
    pub bsn: u8,
    /// PAN descriptor of the sender
    pub pan: PanDescriptor,
}

/// Scan confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanConfirm {
    /// Outcome
    pub status: Status,
    /// Which scan completed
    pub scan_type: ScanType,
    /// Number of PAN descriptors found
    pub result_count: u8,
}

/// Association confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AssociateConfirm {
    /// Outcome
    pub status: AssociateStatus,
    /// Short address allocated by the coordinator
    pub short_address: ShortAddr,
}

/// Disassociation indication from the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisassociateIndication {
    /// Extended address of the device being disassociated
    pub device_address: ExtAddr,
    /// Why
    pub reason: DisassociateReason,
}

/// Confirm of a locally requested disassociation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisassociateConfirm {
    /// Outcome
    pub status: Status,
    /// Address the request was sent to
    pub device_address: Address,
}

/// Poll confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfirm {
    /// Outcome
    pub status: Status,
}

/// Data confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataConfirm {
    /// Outcome
    pub status: Status,
    /// MSDU handle of the request
    pub msdu_handle: u8,
}

/// Incoming data frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIndication {
    /// Sender
    pub src_address: Address,
    /// Sender PAN
    pub src_pan_id: PanId,
    /// Security the frame was received with
    pub security: SecurityDescriptor,
    /// Payload
    pub msdu: Vec<u8, MAX_MSDU_SIZE>,
}

/// Sync loss indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncLossIndication {
    /// Reason (normally [`Status::BeaconLoss`])
    pub reason: Status,
    /// PAN in effect
    pub pan_id: PanId,
    /// Channel in effect
    pub logical_channel: u8,
}

/// Incoming FH asynchronous frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsAsyncIndication {
    /// Kind of frame
    pub frame_type: FhFrameType,
    /// Sender extended address
    pub src_address: ExtAddr,
    /// Sender PAN
    pub src_pan_id: PanId,
    /// Security the frame was received with
    pub security: SecurityDescriptor,
    /// Raw payload IE block
    pub payload_ies: Vec<u8, MAX_IE_SIZE>,
}

/// WS-async request confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WsAsyncConfirm {
    /// Outcome
    pub status: Status,
}

/// Asynchronous completion or indication delivered by the MAC engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacEvent {
    /// Association confirm
    AssociateConfirm(AssociateConfirm),
    /// Beacon received during a scan
    BeaconNotify(BeaconNotify),
    /// Scan finished
    ScanConfirm(ScanConfirm),
    /// Coordinator disassociated this device
    DisassociateIndication(DisassociateIndication),
    /// Local disassociation finished
    DisassociateConfirm(DisassociateConfirm),
    /// Poll finished
    PollConfirm(PollConfirm),
    /// Data request finished
    DataConfirm(DataConfirm),
    /// Data frame received
    DataIndication(DataIndication),
    /// Beacon synchronisation lost
    SyncLoss(SyncLossIndication),
    /// FH asynchronous frame received
    WsAsyncIndication(WsAsyncIndication),
    /// WS-async request finished
    WsAsyncConfirm(WsAsyncConfirm),
}
