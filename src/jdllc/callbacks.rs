//! Application callbacks
//!
//! [`JoinCallbacks`] reports membership changes. [`MacCallbacks`] receives
//! every MAC completion after the controller has processed it; each method
//! defaults to doing nothing so an application only overrides what it uses.

use crate::config::session::{DeviceDescriptor, ParentInfo};
use crate::config::ExtAddr;
use crate::mac::types::{
    AssociateConfirm, BeaconNotify, DataConfirm, DataIndication, DisassociateConfirm,
    DisassociateIndication, DisassociateReason, PollConfirm, ScanConfirm, Status,
    SyncLossIndication, WsAsyncConfirm, WsAsyncIndication,
};

use super::state::JoinState;

/// Membership notifications
pub trait JoinCallbacks {
    /// Association completed
    ///
    /// Orphan realignment and rejoin confirmation are only reported through
    /// [`JoinCallbacks::state_changed`].
    fn joined(&mut self, device: &DeviceDescriptor, parent: &ParentInfo) {
        let _ = (device, parent);
    }

    /// Membership ended without the application asking for it
    fn disassociate_indication(&mut self, ext_address: &ExtAddr, reason: DisassociateReason) {
        let _ = (ext_address, reason);
    }

    /// A [`super::Jdllc::leave`] request completed
    fn disassociate_confirm(&mut self, ext_address: &ExtAddr, status: Status) {
        let _ = (ext_address, status);
    }

    /// High-level state changed
    fn state_changed(&mut self, state: JoinState) {
        let _ = state;
    }
}

/// Pass-through of MAC completions
#[allow(unused_variables)]
pub trait MacCallbacks {
    /// Association confirm
    fn associate_confirm(&mut self, cnf: &AssociateConfirm) {}
    /// Beacon notification
    fn beacon_notify(&mut self, ind: &BeaconNotify) {}
    /// Scan confirm
    fn scan_confirm(&mut self, cnf: &ScanConfirm) {}
    /// Disassociation indication
    fn disassociate_indication(&mut self, ind: &DisassociateIndication) {}
    /// Disassociation confirm
    fn disassociate_confirm(&mut self, cnf: &DisassociateConfirm) {}
    /// Poll confirm
    fn poll_confirm(&mut self, cnf: &PollConfirm) {}
    /// Data confirm
    fn data_confirm(&mut self, cnf: &DataConfirm) {}
    /// Data indication that passed the security check
    fn data_indication(&mut self, ind: &DataIndication) {}
    /// Sync loss
    fn sync_loss(&mut self, ind: &SyncLossIndication) {}
    /// WS-async indication that passed the security check
    fn ws_async_indication(&mut self, ind: &WsAsyncIndication) {}
    /// WS-async confirm
    fn ws_async_confirm(&mut self, cnf: &WsAsyncConfirm) {}
}

impl JoinCallbacks for () {}

impl MacCallbacks for () {}
