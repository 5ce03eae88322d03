use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::config::session::CoordinatorAddress;
use crate::config::{PanId, BEACON_ORDER_NON_BEACON, PAN_ID_ANY};
use crate::mac::api::{Attribute, MacEngine, ScanRequest, SyncRequest};
use crate::mac::types::{Address, BeaconNotify, ScanConfirm, ScanType, Status};
use crate::platform::timer::{Millis, TimerId};
use crate::security::SecurityManager;

use super::{Event, JdllcError, Jdllc, JoinCallbacks, JoinState, MacCallbacks, SubState};

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    /// Act on the current sub-state
    pub(super) fn process_sub_state(&mut self) -> Result<(), JdllcError<M::Error>> {
        let state = self.session.state();
        match self.session.sub_state() {
            SubState::ScanActive | SubState::ScanPassive
                if state == JoinState::Joining && self.session.coordinator.is_none() =>
            {
                let scan_type = if self.session.sub_state() == SubState::ScanPassive {
                    ScanType::Passive
                } else {
                    ScanType::Active
                };
                self.send_scan(scan_type)
            }
            SubState::SyncReq => self.on_parent_ready(),
            SubState::ScanOrphan if state == JoinState::Orphan => self.send_scan(ScanType::Orphan),
            _ => Ok(()),
        }
    }

    fn send_scan(&mut self, scan_type: ScanType) -> Result<(), JdllcError<M::Error>> {
        if self.scan_in_progress {
            return Ok(());
        }
        let req = ScanRequest {
            scan_type,
            channels: self.config.channel_mask,
            duration: self.config.scan_duration,
            channel_page: self.config.channel_page,
            security: self.security.secure(),
        };
        debug!("{} scan on {} channels", scan_type, req.channels.count());
        self.mac.scan_request(&req).map_err(JdllcError::Mac)?;
        self.scan_in_progress = true;

        if scan_type == ScanType::Orphan {
            self.orphan_attempts = self.orphan_attempts.saturating_add(1);
            self.stats.orphan_scans = self.stats.orphan_scans.saturating_add(1);
        } else {
            self.stats.scans = self.stats.scans.saturating_add(1);
        }
        Ok(())
    }

    /// Parent known: synchronise, then associate or start confirming
    fn on_parent_ready(&mut self) -> Result<(), JdllcError<M::Error>> {
        let state = self.session.state();
        if self.session.coordinator.is_none() {
            return Ok(());
        }

        match state {
            JoinState::Joining => {
                if self.assoc_pending {
                    return Ok(());
                }
                self.send_sync()?;
                self.send_associate_request()
            }
            JoinState::InitRestoring | JoinState::Joined | JoinState::Rejoined => {
                self.send_sync()?;
                self.session.set_sub_state(SubState::Idle);
                if state == JoinState::InitRestoring
                    && self.config.is_sleepy()
                    && !self.timers.is_running(TimerId::Poll)
                {
                    self.events.raise(Event::Poll);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Beacon synchronisation, beacon mode only
    pub(super) fn send_sync(&mut self) -> Result<(), JdllcError<M::Error>> {
        if !self.config.is_beacon_mode() {
            return Ok(());
        }
        let channel = match self.session.channel {
            Some(channel) => channel,
            None => return Ok(()),
        };
        let req = SyncRequest {
            logical_channel: channel,
            channel_page: self.config.channel_page,
            track_beacon: true,
        };
        debug!("sync request on channel {}", channel);
        self.mac.sync_request(&req).map_err(JdllcError::Mac)
    }

    /// PAN policy: any PAN while unconstrained, otherwise only ours
    pub(super) fn pan_acceptable(&self, pan_id: PanId) -> bool {
        self.session.network_id == PAN_ID_ANY || self.session.network_id == pan_id
    }

    /// Evaluate a beacon heard during a scan; the first acceptable one wins
    pub(super) fn on_beacon(&mut self, ind: &BeaconNotify) {
        if self.session.state() != JoinState::Joining
            || !matches!(
                self.session.sub_state(),
                SubState::ScanActive | SubState::ScanPassive
            )
        {
            return;
        }

        let pan = &ind.pan;
        let sfs = pan.superframe_spec;
        if !sfs.association_permit() {
            trace!("beacon without association permit");
            return;
        }
        let order_ok = if self.config.is_beacon_mode() {
            sfs.beacon_order() <= self.config.beacon_order
        } else {
            sfs.beacon_order() == BEACON_ORDER_NON_BEACON
        };
        if !order_ok || !self.pan_acceptable(pan.coord_pan_id) {
            trace!("beacon from PAN {=u16:#x} not acceptable", pan.coord_pan_id);
            return;
        }

        self.session.network_id = pan.coord_pan_id;
        self.session.channel = Some(pan.logical_channel);
        self.session.coordinator = Some(match pan.coord_address {
            Address::Short(short) => CoordinatorAddress::short(short),
            Address::Extended(ext) => CoordinatorAddress::extended(ext),
        });
        if self.config.is_beacon_mode() {
            self.session.beacon_order = sfs.beacon_order();
            self.session.superframe_order = sfs.superframe_order();
        }
        self.session.set_sub_state(SubState::SyncReq);
        info!(
            "parent selected: PAN {=u16:#x} channel {}",
            pan.coord_pan_id,
            pan.logical_channel
        );
        self.write_membership_attributes();
    }

    pub(super) fn on_scan_confirm(&mut self, cnf: &ScanConfirm) -> Result<(), JdllcError<M::Error>> {
        self.scan_in_progress = false;
        let state = self.session.state();

        match cnf.scan_type {
            ScanType::Orphan => {
                if state != JoinState::Orphan || self.session.sub_state() != SubState::ScanOrphan {
                    return Ok(());
                }
                if cnf.status == Status::Success {
                    self.events.raise(Event::CoordRealign);
                    Ok(())
                } else {
                    self.on_orphan_scan_failed()
                }
            }
            ScanType::Active | ScanType::Passive => {
                if state != JoinState::Joining {
                    return Ok(());
                }
                let selected = self.session.sub_state() == SubState::SyncReq
                    && self.session.coordinator.is_some();
                if cnf.status == Status::Success && selected {
                    self.events.raise(Event::StateChange);
                    return Ok(());
                }
                debug!("scan found no parent ({})", cnf.status);
                self.clear_parent();
                let resume = self.scan_sub_state();
                self.enter_backoff(resume, self.config.scan_backoff);
                Ok(())
            }
        }
    }

    /// Wait `period` before resuming `resume`, with the receiver off
    pub(super) fn enter_backoff(&mut self, resume: SubState, period: Duration) {
        if self.session.sub_state() != resume {
            self.session.set_sub_state(resume);
        }
        self.session.set_sub_state(SubState::ScanBackoff);
        self.set_attribute(Attribute::RxOnWhenIdle(false));
        self.timers.start(TimerId::ScanBackoff, period);
        debug!("backoff {} ms before {}", Millis::from(period).0, resume);
    }

    pub(super) fn on_backoff_expired(&mut self) -> Result<(), JdllcError<M::Error>> {
        if self.session.sub_state() != SubState::ScanBackoff {
            return Ok(());
        }
        let resume = self.session.previous_sub_state();
        self.session.set_sub_state(resume);
        self.set_attribute(Attribute::RxOnWhenIdle(self.config.rx_on_idle));
        self.events.raise(Event::StateChange);
        Ok(())
    }
}
