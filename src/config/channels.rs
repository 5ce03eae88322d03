//! Channel bitsets
//!
//! A fixed-size bitmap over channel indices 0..=135, enough for the 129
//! channels of the widest 802.15.4g band plan. Used for the fixed-channel scan
//! mask and for the two FH masks (unicast hopping and asynchronous
//! solicitation).

use core::fmt;

/// Number of bytes in a channel bitmap
pub const CHANNEL_MASK_BYTES: usize = 17;

/// Highest channel index representable in a [`ChannelMask`]
pub const MAX_CHANNEL: u8 = (CHANNEL_MASK_BYTES * 8 - 1) as u8;

/// Which of the three configured masks an operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskKind {
    /// Channels scanned in fixed-channel (beacon / non-beacon) mode
    Default,
    /// Channels used for FH unicast hopping
    FhUnicast,
    /// Channels used for FH asynchronous solicitation frames
    FhAsync,
}

/// Fixed-size channel bitset
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask([u8; CHANNEL_MASK_BYTES]);

impl ChannelMask {
    /// Empty mask
    pub const fn empty() -> Self {
        Self([0; CHANNEL_MASK_BYTES])
    }

    /// Mask with every channel in `first..=last` set
    pub fn range(first: u8, last: u8) -> Self {
        let mut mask = Self::empty();
        for ch in first..=last.min(MAX_CHANNEL) {
            mask.set(ch);
        }
        mask
    }

    /// Build a mask from raw bitmap bytes (LSB of byte 0 is channel 0)
    pub const fn from_bytes(bytes: [u8; CHANNEL_MASK_BYTES]) -> Self {
        Self(bytes)
    }

    /// Raw bitmap bytes
    pub fn as_bytes(&self) -> &[u8; CHANNEL_MASK_BYTES] {
        &self.0
    }

    /// Add a channel. Channels above [`MAX_CHANNEL`] are ignored.
    pub fn set(&mut self, channel: u8) {
        if channel <= MAX_CHANNEL {
            self.0[usize::from(channel / 8)] |= 1 << (channel % 8);
        }
    }

    /// Remove a channel
    pub fn clear(&mut self, channel: u8) {
        if channel <= MAX_CHANNEL {
            self.0[usize::from(channel / 8)] &= !(1 << (channel % 8));
        }
    }

    /// Whether a channel is present
    pub fn test(&self, channel: u8) -> bool {
        channel <= MAX_CHANNEL && self.0[usize::from(channel / 8)] & (1 << (channel % 8)) != 0
    }

    /// Complement of this mask over `0..=max_channel`.
    ///
    /// FH attributes are expressed as *excluded* channels; this turns a set of
    /// usable channels into the exclusion list the MAC expects.
    pub fn exclude(&self, max_channel: u8) -> Self {
        let mut excluded = Self::empty();
        for ch in 0..=max_channel.min(MAX_CHANNEL) {
            if !self.test(ch) {
                excluded.set(ch);
            }
        }
        excluded
    }

    /// Number of channels set
    pub fn count(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }

    /// True if no channel is set
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowest channel set, if any
    pub fn first(&self) -> Option<u8> {
        self.iter().next()
    }

    /// Iterate over the channels set, lowest first
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_CHANNEL).filter(move |&ch| self.test(ch))
    }
}

impl fmt::Debug for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
