use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::mac::api::MacEngine;
use crate::mac::types::{Address, DisassociateConfirm, DisassociateIndication, MacEvent};
use crate::platform::timer::Millis;
use crate::security::SecurityManager;

use super::{JdllcError, Jdllc, JoinCallbacks, JoinState, MacCallbacks, Trigger};

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    /// Controller bookkeeping for one MAC completion, then pass it on
    ///
    /// The event is forwarded even when the bookkeeping fails.
    pub(super) fn dispatch(&mut self, event: MacEvent) -> Result<(), JdllcError<M::Error>> {
        match event {
            MacEvent::AssociateConfirm(cnf) => {
                self.on_associate_confirm(&cnf);
                self.app.associate_confirm(&cnf);
                Ok(())
            }
            MacEvent::BeaconNotify(ind) => {
                self.on_beacon(&ind);
                self.app.beacon_notify(&ind);
                Ok(())
            }
            MacEvent::ScanConfirm(cnf) => {
                let result = self.on_scan_confirm(&cnf);
                self.app.scan_confirm(&cnf);
                result
            }
            MacEvent::DisassociateIndication(ind) => {
                self.on_disassociate_indication(&ind);
                MacCallbacks::disassociate_indication(&mut self.app, &ind);
                Ok(())
            }
            MacEvent::DisassociateConfirm(cnf) => {
                self.on_disassociate_confirm(&cnf);
                MacCallbacks::disassociate_confirm(&mut self.app, &cnf);
                Ok(())
            }
            MacEvent::PollConfirm(cnf) => {
                let result = self.on_poll_confirm(&cnf);
                self.app.poll_confirm(&cnf);
                result
            }
            MacEvent::DataConfirm(cnf) => {
                let result = self.on_data_confirm(&cnf);
                self.app.data_confirm(&cnf);
                result
            }
            MacEvent::DataIndication(ind) => {
                if self.security.accept(&ind.security) {
                    self.app.data_indication(&ind);
                }
                Ok(())
            }
            MacEvent::SyncLoss(ind) => {
                let result = self.on_sync_loss(&ind);
                self.app.sync_loss(&ind);
                result
            }
            MacEvent::WsAsyncIndication(ind) => {
                if !self.security.accept(&ind.security) {
                    return Ok(());
                }
                let result = self.on_async_frame(&ind);
                self.app.ws_async_indication(&ind);
                result
            }
            MacEvent::WsAsyncConfirm(cnf) => {
                trace!("async confirm {}", cnf.status);
                self.app.ws_async_confirm(&cnf);
                Ok(())
            }
        }
    }

    fn on_disassociate_indication(&mut self, ind: &DisassociateIndication) {
        // Nothing to leave; AccessDenied only ends with a new join
        if matches!(
            self.session.state(),
            JoinState::InitWaiting | JoinState::AccessDenied
        ) {
            return;
        }
        info!("disassociated by coordinator ({})", ind.reason);
        self.apply(Trigger::Disassociated);
        self.teardown();
        JoinCallbacks::disassociate_indication(&mut self.app, &ind.device_address, ind.reason);
    }

    fn on_disassociate_confirm(&mut self, cnf: &DisassociateConfirm) {
        if !self.leaving {
            return;
        }
        info!("left network ({})", cnf.status);
        let ext_address = match cnf.device_address {
            Address::Extended(ext) => ext,
            Address::Short(_) => self.config.ext_address,
        };
        self.apply(Trigger::Disassociated);
        self.teardown();
        JoinCallbacks::disassociate_confirm(&mut self.app, &ext_address, cnf.status);
    }
}
