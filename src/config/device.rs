use core::time::Duration;

use heapless::Vec;

use super::channels::{ChannelMask, MaskKind};

/// IEEE extended (EUI-64) address
pub type ExtAddr = [u8; 8];
/// 16-bit short address
pub type ShortAddr = u16;
/// PAN identifier
pub type PanId = u16;

/// PAN id meaning "join whichever network answers first"
pub const PAN_ID_ANY: PanId = 0xFFFF;
/// Short address meaning "no short address assigned"
pub const SHORT_ADDR_NONE: ShortAddr = 0xFFFE;
/// Beacon order of a non-beacon network
pub const BEACON_ORDER_NON_BEACON: u8 = 15;
/// Longest network name carried in a network-name IE
pub const MAX_NETWORK_NAME: usize = 32;

/// Network name used to filter FH advertisements
pub type NetworkName = Vec<u8, MAX_NETWORK_NAME>;

/// Trickle timer bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrickleConfig {
    /// Smallest interval
    pub imin: Duration,
    /// Largest interval the doubling saturates at
    pub imax: Duration,
}

impl TrickleConfig {
    /// Create trickle bounds; `imax` is raised to `imin` if smaller
    pub fn new(imin: Duration, imax: Duration) -> Self {
        Self {
            imin,
            imax: imax.max(imin),
        }
    }
}

impl Default for TrickleConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(6_000), Duration::from_millis(96_000))
    }
}

/// Frequency-hopping join parameters
#[derive(Debug, Clone)]
pub struct FhConfig {
    /// Channels usable for unicast hopping
    pub unicast_mask: ChannelMask,
    /// Channels the solicitation frames are sent on
    pub async_mask: ChannelMask,
    /// Highest channel index of the band plan
    pub max_channel: u8,
    /// Failed association attempts retried before falling back to PAN config
    /// solicitation; the fallback happens once this many have been exceeded
    pub max_assoc_attempts: u8,
    /// Delay before the first association attempt after PAN config
    pub first_assoc_delay: Duration,
    /// Delay before later association attempts
    pub assoc_delay: Duration,
    /// PAN advertisement solicit trickle bounds
    pub pas_trickle: TrickleConfig,
    /// PAN configuration solicit trickle bounds
    pub pcs_trickle: TrickleConfig,
    /// Only accept advertisements carrying this network name
    pub network_name: Option<NetworkName>,
}

impl Default for FhConfig {
    fn default() -> Self {
        Self {
            unicast_mask: ChannelMask::range(0, 128),
            async_mask: ChannelMask::range(0, 128),
            max_channel: 128,
            max_assoc_attempts: 3,
            first_assoc_delay: Duration::from_millis(5_000),
            assoc_delay: Duration::from_millis(2_000),
            pas_trickle: TrickleConfig::default(),
            pcs_trickle: TrickleConfig::default(),
            network_name: None,
        }
    }
}

/// Controller configuration, read once at initialisation
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// This device's extended address
    pub ext_address: ExtAddr,
    /// PAN to join, or [`PAN_ID_ANY`]
    pub pan_id: PanId,
    /// Beacon order (15 for non-beacon networks)
    pub beacon_order: u8,
    /// Superframe order
    pub superframe_order: u8,
    /// Channels scanned in fixed-channel mode
    pub channel_mask: ChannelMask,
    /// Scan duration exponent passed to the MAC
    pub scan_duration: u8,
    /// Channel page
    pub channel_page: u8,
    /// Keep the receiver on when idle (always-on device, never polls)
    pub rx_on_idle: bool,
    /// Interval between keep-alive polls
    pub poll_interval: Duration,
    /// Shortened interval used after a poll failure
    pub poll_retry_interval: Duration,
    /// Consecutive poll/data failures before orphan recovery starts
    pub max_data_failures: u8,
    /// Receiver-off interval after a scan found no parent
    pub scan_backoff: Duration,
    /// Backoff between failed orphan scans
    pub orphan_backoff: Duration,
    /// Failed orphan scans before the device gives up the network
    pub max_orphan_attempts: u8,
    /// Join through FH solicitation instead of beacon scanning
    pub fh_enabled: bool,
    /// FH parameters (ignored unless `fh_enabled`)
    pub fh: FhConfig,
    /// Starting outgoing frame counter handed to the security manager
    pub frame_counter: u32,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            ext_address: [0; 8],
            pan_id: PAN_ID_ANY,
            beacon_order: BEACON_ORDER_NON_BEACON,
            superframe_order: BEACON_ORDER_NON_BEACON,
            channel_mask: ChannelMask::range(0, 10),
            scan_duration: 5,
            channel_page: 9,
            rx_on_idle: false,
            poll_interval: Duration::from_millis(2_000),
            poll_retry_interval: Duration::from_millis(500),
            max_data_failures: 3,
            scan_backoff: Duration::from_millis(5_000),
            orphan_backoff: Duration::from_millis(300_000),
            max_orphan_attempts: 5,
            fh_enabled: false,
            fh: FhConfig::default(),
            frame_counter: 0,
        }
    }
}

impl JoinConfig {
    /// Configuration for a non-beacon network scanned on `channels`
    pub fn new_non_beacon(ext_address: ExtAddr, pan_id: PanId, channels: ChannelMask) -> Self {
        Self {
            ext_address,
            pan_id,
            channel_mask: channels,
            ..Self::default()
        }
    }

    /// Configuration for a beacon-enabled network
    pub fn new_beacon(
        ext_address: ExtAddr,
        pan_id: PanId,
        channels: ChannelMask,
        beacon_order: u8,
        superframe_order: u8,
    ) -> Self {
        Self {
            ext_address,
            pan_id,
            channel_mask: channels,
            beacon_order,
            superframe_order,
            ..Self::default()
        }
    }

    /// Configuration for a frequency-hopping network
    pub fn new_fh(ext_address: ExtAddr, pan_id: PanId, fh: FhConfig) -> Self {
        Self {
            ext_address,
            pan_id,
            fh_enabled: true,
            fh,
            ..Self::default()
        }
    }

    /// True for a beacon-enabled (fixed-channel) network
    pub fn is_beacon_mode(&self) -> bool {
        !self.fh_enabled && self.beacon_order < BEACON_ORDER_NON_BEACON
    }

    /// True when the device keeps its receiver off and must poll
    pub fn is_sleepy(&self) -> bool {
        !self.rx_on_idle
    }

    /// Configured mask of the given kind
    pub fn mask(&self, kind: MaskKind) -> &ChannelMask {
        match kind {
            MaskKind::Default => &self.channel_mask,
            MaskKind::FhUnicast => &self.fh.unicast_mask,
            MaskKind::FhAsync => &self.fh.async_mask,
        }
    }

    /// Mutable access to the mask of the given kind
    pub fn mask_mut(&mut self, kind: MaskKind) -> &mut ChannelMask {
        match kind {
            MaskKind::Default => &mut self.channel_mask,
            MaskKind::FhUnicast => &mut self.fh.unicast_mask,
            MaskKind::FhAsync => &mut self.fh.async_mask,
        }
    }
}
