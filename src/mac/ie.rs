//! Wi-SUN payload IE field extraction
//!
//! The MAC engine hands WS-async indications over with their payload IE block
//! untouched. The controller only needs a few sub-fields from the WP-IE group:
//! the PAN IE (PAN size, routing cost), the network name, the PAN version and
//! the GTK hashes. Everything else is skipped.

use heapless::Vec;

use crate::config::device::{NetworkName, MAX_NETWORK_NAME};

/// Payload IE group id of the Wi-SUN WP-IE
const GROUP_WISUN: u8 = 0x04;
/// Payload IE termination group id
const GROUP_TERMINATION: u8 = 0x0F;

/// Short-format WP sub-IE ids
const SUB_PAN: u8 = 0x04;
const SUB_NETNAME: u8 = 0x05;
const SUB_PAN_VERSION: u8 = 0x06;
const SUB_GTK_HASH: u8 = 0x07;

/// Number of GTK hash slots carried in a PAN configuration
pub const GTK_HASH_SLOTS: usize = 4;
/// Length of one truncated GTK hash
pub const GTK_HASH_LEN: usize = 8;

/// IE extraction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IeError {
    /// Descriptor or content runs past the end of the block
    Truncated,
    /// Sub-IE content length does not match its definition
    InvalidLength {
        /// Sub-IE id
        sub_id: u8,
    },
}

/// Contents of a PAN IE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanIe {
    /// Number of nodes in the PAN
    pub pan_size: u16,
    /// Routing cost of the sender to the border router
    pub routing_cost: u16,
    /// Raw flag byte
    pub flags: u8,
}

/// Sub-fields extracted from a WP-IE group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WpFields {
    /// PAN IE
    pub pan: Option<PanIe>,
    /// Network name IE
    pub network_name: Option<NetworkName>,
    /// PAN version IE
    pub pan_version: Option<u16>,
    /// GTK hash IE
    pub gtk_hashes: Option<[[u8; GTK_HASH_LEN]; GTK_HASH_SLOTS]>,
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, IeError> {
    match data.get(at..at + 2) {
        Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
        None => Err(IeError::Truncated),
    }
}

/// Extract the WP-IE sub-fields from a payload IE block
pub fn parse_payload_ies(data: &[u8]) -> Result<WpFields, IeError> {
    let mut fields = WpFields::default();
    let mut pos = 0;

    while pos < data.len() {
        let descriptor = read_u16(data, pos)?;
        let len = usize::from(descriptor & 0x07FF);
        let group = ((descriptor >> 11) & 0x0F) as u8;
        pos += 2;

        if group == GROUP_TERMINATION {
            break;
        }

        let content = data.get(pos..pos + len).ok_or(IeError::Truncated)?;
        if group == GROUP_WISUN {
            parse_wp_group(content, &mut fields)?;
        }
        pos += len;
    }

    Ok(fields)
}

fn parse_wp_group(data: &[u8], fields: &mut WpFields) -> Result<(), IeError> {
    let mut pos = 0;

    while pos < data.len() {
        let descriptor = read_u16(data, pos)?;
        pos += 2;

        // Long-format sub-IEs (schedules, vendor) carry nothing we need
        if descriptor & 0x8000 != 0 {
            let len = usize::from(descriptor & 0x07FF);
            data.get(pos..pos + len).ok_or(IeError::Truncated)?;
            pos += len;
            continue;
        }

        let len = usize::from(descriptor & 0x00FF);
        let sub_id = ((descriptor >> 8) & 0x7F) as u8;
        let content = data.get(pos..pos + len).ok_or(IeError::Truncated)?;

        match sub_id {
            SUB_PAN => {
                if len != 5 {
                    return Err(IeError::InvalidLength { sub_id });
                }
                fields.pan = Some(PanIe {
                    pan_size: read_u16(content, 0)?,
                    routing_cost: read_u16(content, 2)?,
                    flags: content[4],
                });
            }
            SUB_NETNAME => {
                if len > MAX_NETWORK_NAME {
                    return Err(IeError::InvalidLength { sub_id });
                }
                let mut name = Vec::new();
                name.extend_from_slice(content)
                    .map_err(|_| IeError::InvalidLength { sub_id })?;
                fields.network_name = Some(name);
            }
            SUB_PAN_VERSION => {
                if len != 2 {
                    return Err(IeError::InvalidLength { sub_id });
                }
                fields.pan_version = Some(read_u16(content, 0)?);
            }
            SUB_GTK_HASH => {
                if len != GTK_HASH_SLOTS * GTK_HASH_LEN {
                    return Err(IeError::InvalidLength { sub_id });
                }
                let mut hashes = [[0u8; GTK_HASH_LEN]; GTK_HASH_SLOTS];
                for (slot, chunk) in hashes.iter_mut().zip(content.chunks_exact(GTK_HASH_LEN)) {
                    slot.copy_from_slice(chunk);
                }
                fields.gtk_hashes = Some(hashes);
            }
            _ => {}
        }
        pos += len;
    }

    Ok(())
}

/// Helpers that assemble IE blocks, for tests and simulators
#[doc(hidden)]
pub mod build {
    use heapless::Vec;

    use super::{GROUP_WISUN, SUB_GTK_HASH, SUB_NETNAME, SUB_PAN, SUB_PAN_VERSION};
    use crate::mac::types::MAX_IE_SIZE;

    /// IE block under construction
    pub type IeBlock = Vec<u8, MAX_IE_SIZE>;

    /// The IE block has no room left
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct BlockFull;

    fn push(out: &mut IeBlock, bytes: &[u8]) -> Result<(), BlockFull> {
        out.extend_from_slice(bytes).map_err(|_| BlockFull)
    }

    fn short_sub_ie(out: &mut IeBlock, sub_id: u8, content: &[u8]) -> Result<(), BlockFull> {
        let descriptor = (u16::from(sub_id & 0x7F) << 8) | (content.len() as u16 & 0x00FF);
        push(out, &descriptor.to_le_bytes())?;
        push(out, content)
    }

    /// Wrap `sub_ies` in a WP-IE payload IE header
    pub fn wp_group(sub_ies: &[u8]) -> Result<IeBlock, BlockFull> {
        let mut out = IeBlock::new();
        let descriptor =
            0x8000 | (u16::from(GROUP_WISUN) << 11) | (sub_ies.len() as u16 & 0x07FF);
        push(&mut out, &descriptor.to_le_bytes())?;
        push(&mut out, sub_ies)?;
        Ok(out)
    }

    /// PAN IE sub-IE
    pub fn pan_ie(out: &mut IeBlock, pan_size: u16, routing_cost: u16) -> Result<(), BlockFull> {
        let mut content = [0u8; 5];
        content[..2].copy_from_slice(&pan_size.to_le_bytes());
        content[2..4].copy_from_slice(&routing_cost.to_le_bytes());
        short_sub_ie(out, SUB_PAN, &content)
    }

    /// Network name sub-IE
    pub fn netname_ie(out: &mut IeBlock, name: &[u8]) -> Result<(), BlockFull> {
        short_sub_ie(out, SUB_NETNAME, name)
    }

    /// PAN version sub-IE
    pub fn pan_version_ie(out: &mut IeBlock, version: u16) -> Result<(), BlockFull> {
        short_sub_ie(out, SUB_PAN_VERSION, &version.to_le_bytes())
    }

    /// GTK hash sub-IE
    pub fn gtk_hash_ie(out: &mut IeBlock, hashes: &[[u8; 8]; 4]) -> Result<(), BlockFull> {
        let mut content = [0u8; 32];
        for (chunk, hash) in content.chunks_exact_mut(8).zip(hashes.iter()) {
            chunk.copy_from_slice(hash);
        }
        short_sub_ie(out, SUB_GTK_HASH, &content)
    }
}
