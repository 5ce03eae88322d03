use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::mac::api::{AssociateRequest, Attribute, CapabilityInfo, MacEngine};
use crate::mac::types::{AssociateConfirm, AssociateStatus};
use crate::platform::timer::{Millis, TimerId};
use crate::security::SecurityManager;

use super::{
    coord_address, JdllcError, Jdllc, JoinCallbacks, JoinState, MacCallbacks, SubState, Trigger,
};

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    fn capability(&mut self) -> CapabilityInfo {
        CapabilityInfo {
            ffd: false,
            mains_powered: self.config.rx_on_idle,
            rx_on_when_idle: self.config.rx_on_idle,
            security: self.security.secure().level != 0,
            allocate_address: !self.config.fh_enabled,
        }
    }

    pub(super) fn send_associate_request(&mut self) -> Result<(), JdllcError<M::Error>> {
        let coord = match self.session.coordinator {
            Some(coord) if !self.assoc_pending => coord,
            _ => return Ok(()),
        };
        let req = AssociateRequest {
            logical_channel: self.session.channel.unwrap_or_default(),
            channel_page: self.config.channel_page,
            coord_address: coord_address(&coord, self.config.fh_enabled),
            coord_pan_id: self.session.network_id,
            capability: self.capability(),
            security: self.security.secure(),
        };
        debug!("association request to PAN {=u16:#x}", req.coord_pan_id);
        self.mac.associate_request(&req).map_err(JdllcError::Mac)?;
        self.assoc_pending = true;
        Ok(())
    }

    /// FH association delay elapsed
    pub(super) fn on_associate_due(&mut self) -> Result<(), JdllcError<M::Error>> {
        if self.session.state() != JoinState::Joining {
            return Ok(());
        }
        self.send_associate_request()
    }

    pub(super) fn on_associate_confirm(&mut self, cnf: &AssociateConfirm) {
        if self.session.state() != JoinState::Joining || !self.assoc_pending {
            return;
        }
        self.assoc_pending = false;

        match cnf.status {
            AssociateStatus::Success => self.on_associated(cnf),
            status if status.is_terminal() => {
                warn!("association refused: {}", status);
                self.stats.join_failures = self.stats.join_failures.saturating_add(1);
                self.stop_trickles();
                self.timers.stop(TimerId::FhAssociate);
                self.session.set_sub_state(SubState::AccessDenied);
                self.apply(Trigger::AssociationDenied);
            }
            status => {
                debug!("association failed: {}", status);
                self.stats.join_failures = self.stats.join_failures.saturating_add(1);
                if self.config.fh_enabled {
                    self.retry_fh_association();
                } else {
                    self.clear_parent();
                    let resume = self.scan_sub_state();
                    self.enter_backoff(resume, self.config.scan_backoff);
                }
            }
        }
    }

    fn on_associated(&mut self, cnf: &AssociateConfirm) {
        self.session.own_short = cnf.short_address;
        self.session.record_data_success();
        self.sync_losses = 0;
        self.fh_assoc_attempts = 0;
        self.stop_trickles();
        self.timers.stop(TimerId::FhAssociate);
        self.session.set_sub_state(SubState::Idle);
        self.apply(Trigger::AssociationSucceeded);
        self.stats.join_successes = self.stats.join_successes.saturating_add(1);

        self.set_attribute(Attribute::ShortAddress(cnf.short_address));
        let device = self.session.device_descriptor();
        let parent = self.session.parent_info(self.config.fh_enabled);
        if let Some(parent) = &parent {
            self.security.on_parent_selected(
                device.pan_id,
                parent.short_address,
                parent.ext_address,
            );
        }

        if self.config.is_sleepy() {
            self.timers.start(TimerId::Poll, self.session.poll_interval);
        }
        if let Some(parent) = parent {
            self.app.joined(&device, &parent);
        }
    }

    /// Bounded FH retry; once exhausted, go back to soliciting PAN configuration
    fn retry_fh_association(&mut self) {
        self.fh_assoc_attempts = self.fh_assoc_attempts.saturating_add(1);
        if self.fh_assoc_attempts <= self.config.fh.max_assoc_attempts {
            self.timers.start(TimerId::FhAssociate, self.config.fh.assoc_delay);
        } else {
            warn!("FH association gave up after {} attempts", self.fh_assoc_attempts);
            self.fh_assoc_attempts = 0;
            self.start_pcs();
        }
    }
}
