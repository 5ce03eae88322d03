//! MAC engine interface
//!
//! This module describes the MAC engine the controller drives, without
//! implementing any of it:
//! - Request primitives and the [`MacEngine`] trait
//! - Confirm/indication primitives delivered back as [`MacEvent`]s
//! - Extraction of the few Wi-SUN payload IE fields the join process needs

/// Request primitives and the engine trait
pub mod api;

/// Payload IE field extraction
pub mod ie;

/// Status codes, confirms and indications
pub mod types;

pub use api::{
    AssociateRequest, AsyncOperation, Attribute, CapabilityInfo, ChannelFunction,
    DisassociateRequest, MacEngine, PollRequest, ScanRequest, SyncRequest, WsAsyncRequest,
};
pub use types::{
    Address, AssociateConfirm, AssociateStatus, BeaconNotify, DataConfirm, DataIndication,
    DisassociateConfirm, DisassociateIndication, DisassociateReason, FhFrameType, MacEvent,
    PanDescriptor, PollConfirm, ScanConfirm, ScanType, SecurityDescriptor, Status,
    SuperframeSpec, SyncLossIndication, WsAsyncConfirm, WsAsyncIndication,
};
