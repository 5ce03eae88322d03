use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::mac::api::{MacEngine, PollRequest};
use crate::mac::types::{DataConfirm, PollConfirm, Status};
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
    fn polling_allowed(&self) -> bool {
        self.config.is_sleepy() && self.session.state().is_member()
    }

    pub(super) fn on_poll_due(&mut self) -> Result<(), JdllcError<M::Error>> {
        if !self.polling_allowed() || self.poll_pending || self.timers.is_running(TimerId::Poll) {
            return Ok(());
        }
        let coord = match self.session.coordinator {
            Some(coord) => coord,
            None => return Ok(()),
        };
        let req = PollRequest {
            coord_address: coord_address(&coord, self.config.fh_enabled),
            coord_pan_id: self.session.network_id,
            security: self.security.secure(),
        };
        trace!("poll");
        self.mac.poll_request(&req).map_err(JdllcError::Mac)?;
        self.poll_pending = true;
        self.stats.polls_sent = self.stats.polls_sent.saturating_add(1);
        Ok(())
    }

    pub(super) fn on_poll_confirm(&mut self, cnf: &PollConfirm) -> Result<(), JdllcError<M::Error>> {
        if !self.poll_pending {
            return Ok(());
        }
        self.poll_pending = false;
        if !self.session.state().is_member() {
            return Ok(());
        }

        match cnf.status {
            Status::Success | Status::NoData => {
                self.on_exchange_success();
                self.schedule_poll(false);
                Ok(())
            }
            status if status.is_delivery_failure() => {
                self.stats.poll_failures = self.stats.poll_failures.saturating_add(1);
                if self.on_exchange_failure(status)? {
                    self.schedule_poll(true);
                }
                Ok(())
            }
            _ => {
                self.schedule_poll(false);
                Ok(())
            }
        }
    }

    pub(super) fn on_data_confirm(&mut self, cnf: &DataConfirm) -> Result<(), JdllcError<M::Error>> {
        let state = self.session.state();
        match cnf.status {
            Status::Success if state.is_member() => {
                self.on_exchange_success();
                Ok(())
            }
            // An FH device recovers by reaching its parent again
            Status::Success if state == JoinState::Orphan && self.config.fh_enabled => {
                self.realign()
            }
            status if status.is_delivery_failure() && state.is_member() => {
                self.stats.data_failures = self.stats.data_failures.saturating_add(1);
                self.on_exchange_failure(status)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn schedule_poll(&mut self, retry: bool) {
        if !self.polling_allowed() {
            return;
        }
        let period = if retry {
            self.config.poll_retry_interval
        } else {
            self.session.poll_interval
        };
        self.timers.start(TimerId::Poll, period);
    }

    fn on_exchange_success(&mut self) {
        self.session.record_data_success();
        self.sync_losses = 0;
        if self.session.state() == JoinState::InitRestoring {
            self.confirm_rejoin();
        }
    }

    /// Count a failure; returns `false` if it escalated to orphan recovery
    fn on_exchange_failure(&mut self, status: Status) -> Result<bool, JdllcError<M::Error>> {
        let failures = self.session.record_data_failure();
        debug!("exchange failed ({}), {} in a row", status, failures);
        if failures >= self.config.max_data_failures {
            self.handle_max_failures()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// First successful exchange after a rejoin
    pub(super) fn confirm_rejoin(&mut self) {
        if self.apply(Trigger::RejoinConfirmed).is_none() {
            return;
        }
        if let Some(started) = self.rejoin_started.take() {
            self.stats.rejoin_delay = Some(self.now.saturating_sub(started));
        }
        self.session.set_sub_state(SubState::Idle);
        if self.config.is_sleepy() && !self.timers.is_running(TimerId::Poll) && !self.poll_pending
        {
            self.timers.start(TimerId::Poll, self.session.poll_interval);
        }
    }
}
