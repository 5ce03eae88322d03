use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::mac::api::MacEngine;
use crate::mac::types::{DisassociateReason, SyncLossIndication};
use crate::platform::timer::{Millis, TimerId};
use crate::security::SecurityManager;

use super::{Event, JdllcError, Jdllc, JoinCallbacks, JoinState, MacCallbacks, SubState, Trigger};

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    pub(super) fn on_sync_loss(
        &mut self,
        ind: &SyncLossIndication,
    ) -> Result<(), JdllcError<M::Error>> {
        self.stats.sync_losses = self.stats.sync_losses.saturating_add(1);
        let state = self.session.state();
        warn!("sync lost ({}) in {}", ind.reason, state);

        match state {
            JoinState::Joining => {
                // Look for a parent again; a pending association is abandoned
                self.assoc_pending = false;
                self.clear_parent();
                self.session.set_sub_state(SubState::ScanPassive);
                self.events.raise(Event::StateChange);
                Ok(())
            }
            s if s.is_member() => {
                self.sync_losses = self.sync_losses.saturating_add(1);
                if self.sync_losses == 1 {
                    self.session.set_sub_state(SubState::SyncReq);
                    self.events.raise(Event::StateChange);
                    Ok(())
                } else {
                    self.handle_max_failures()
                }
            }
            _ => Ok(()),
        }
    }

    /// Parent unreachable: stop polling and start orphan recovery
    pub(super) fn handle_max_failures(&mut self) -> Result<(), JdllcError<M::Error>> {
        self.timers.stop(TimerId::Poll);
        self.poll_pending = false;
        if self.apply(Trigger::LinkLost).is_none() {
            return Ok(());
        }
        self.orphan_attempts = 0;

        if self.config.fh_enabled {
            self.session.set_sub_state(SubState::Idle);
            self.start_pcs();
        } else {
            self.session.set_sub_state(SubState::ScanOrphan);
            self.events.raise(Event::StateChange);
        }
        Ok(())
    }

    /// Orphan scan answered: check the coordinator put us back in our PAN
    pub(super) fn on_coord_realign(&mut self) -> Result<(), JdllcError<M::Error>> {
        if self.session.state() != JoinState::Orphan
            || self.session.sub_state() != SubState::ScanOrphan
        {
            return Ok(());
        }
        let pan_id = self.mac.pan_id().map_err(JdllcError::Mac)?;
        if pan_id == self.session.network_id {
            self.realign()
        } else {
            warn!(
                "realigned into PAN {=u16:#x}, expected {=u16:#x}",
                pan_id,
                self.session.network_id
            );
            self.on_orphan_scan_failed()
        }
    }

    /// Parent found again
    pub(super) fn realign(&mut self) -> Result<(), JdllcError<M::Error>> {
        if self.apply(Trigger::Realigned).is_none() {
            return Ok(());
        }
        self.session.record_data_success();
        self.sync_losses = 0;
        self.orphan_attempts = 0;
        self.stats.orphan_recoveries = self.stats.orphan_recoveries.saturating_add(1);
        self.stop_trickles();
        self.session.set_sub_state(SubState::Idle);

        if let Some(coord) = self.session.coordinator {
            self.security
                .on_parent_selected(self.session.network_id, coord.short, coord.ext);
        }
        if self.config.is_sleepy() {
            self.timers.start(TimerId::Poll, self.session.poll_interval);
        }
        self.send_sync()
    }

    /// Orphan scan failed or led elsewhere: retry after a backoff, or give up
    pub(super) fn on_orphan_scan_failed(&mut self) -> Result<(), JdllcError<M::Error>> {
        if self.orphan_attempts >= self.config.max_orphan_attempts {
            self.give_up();
            return Ok(());
        }
        self.enter_backoff(SubState::ScanOrphan, self.config.orphan_backoff);
        Ok(())
    }

    /// Recovery exhausted: report the loss and start over
    fn give_up(&mut self) {
        // A parent known only by its short address is reported by our own address
        let ext = match self.session.coordinator {
            Some(coord) if coord.ext != [0; 8] => coord.ext,
            _ => self.config.ext_address,
        };
        error!("parent lost after {} orphan scans", self.orphan_attempts);
        self.apply(Trigger::Disassociated);
        self.teardown();
        JoinCallbacks::disassociate_indication(&mut self.app, &ext, DisassociateReason::LinkLost);
    }
}
