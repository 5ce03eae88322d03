use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::config::session::CoordinatorAddress;
use crate::config::TrickleConfig;
use crate::mac::api::{AsyncOperation, Attribute, MacEngine, WsAsyncRequest};
use crate::mac::ie::{parse_payload_ies, WpFields};
use crate::mac::types::{FhFrameType, WsAsyncIndication};
use crate::platform::timer::{Millis, TimerId};
use crate::security::SecurityManager;

use super::{JdllcError, Jdllc, JoinCallbacks, JoinState, MacCallbacks};

/// Trickle timer state
///
/// The interval `I` starts at `imin`. Within each interval the timer fires
/// once at a random point in `[I/2, I)`; the broadcast is sent only if no
/// consistent frame was heard since the previous firing. After firing, `I`
/// doubles up to `imax`.
#[derive(Debug, Clone, Copy)]
pub struct Trickle {
    config: TrickleConfig,
    interval: Duration,
    fire_at: Duration,
    heard: u8,
    active: bool,
}

impl Trickle {
    /// Stopped trickle with the given bounds
    pub fn new(config: TrickleConfig) -> Self {
        Self {
            config,
            interval: config.imin,
            fire_at: Duration::ZERO,
            heard: 0,
            active: false,
        }
    }

    /// (Re)start from `imin`; returns the delay until the first firing
    pub fn start<R: RngCore>(&mut self, rng: &mut R) -> Duration {
        self.interval = self.config.imin;
        self.heard = 0;
        self.active = true;
        self.fire_at = random_point(self.interval, rng);
        self.fire_at
    }

    /// Stop; later firings are ignored until the next start
    pub fn stop(&mut self) {
        self.active = false;
        self.heard = 0;
    }

    /// Whether the trickle is running
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current interval length
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Count a consistent frame heard in the current interval
    pub fn hear(&mut self) {
        if self.active {
            self.heard = self.heard.saturating_add(1);
        }
    }

    /// Fire: returns whether to transmit and the delay until the next firing
    pub fn fire<R: RngCore>(&mut self, rng: &mut R) -> (bool, Duration) {
        let transmit = self.heard == 0;
        self.heard = 0;

        let rest = self.interval.saturating_sub(self.fire_at);
        self.interval = (self.interval * 2).min(self.config.imax);
        self.fire_at = random_point(self.interval, rng);
        (transmit, rest + self.fire_at)
    }
}

/// Uniform point in `[interval/2, interval)`
fn random_point<R: RngCore>(interval: Duration, rng: &mut R) -> Duration {
    let half = interval / 2;
    let span = (interval - half).as_millis() as u64;
    if span == 0 {
        return half;
    }
    half + Duration::from_millis(u64::from(rng.next_u32()) % span)
}

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    pub(super) fn start_pas(&mut self) {
        let first = self.pas.start(&mut self.rng);
        self.timers.start(TimerId::PasTrickle, first);
        debug!("PAS trickle started, first in {} ms", Millis::from(first).0);
    }

    pub(super) fn start_pcs(&mut self) {
        let first = self.pcs.start(&mut self.rng);
        self.timers.start(TimerId::PcsTrickle, first);
        debug!("PCS trickle started, first in {} ms", Millis::from(first).0);
    }

    pub(super) fn stop_trickles(&mut self) {
        self.pas.stop();
        self.pcs.stop();
        self.timers.stop(TimerId::PasTrickle);
        self.timers.stop(TimerId::PcsTrickle);
    }

    fn send_async(&mut self, frame_type: FhFrameType) -> Result<(), JdllcError<M::Error>> {
        let req = WsAsyncRequest {
            operation: AsyncOperation::Start,
            frame_type,
            channels: self.config.fh.async_mask,
            security: self.security.secure(),
        };
        debug!("async {} request", frame_type);
        self.mac.ws_async_request(&req).map_err(JdllcError::Mac)
    }

    pub(super) fn on_pas_timer(&mut self) -> Result<(), JdllcError<M::Error>> {
        if !self.pas.is_active() {
            return Ok(());
        }
        let (transmit, next) = self.pas.fire(&mut self.rng);
        if transmit {
            self.send_async(FhFrameType::PanAdvertSolicit)?;
            self.stats.pas_sent = self.stats.pas_sent.saturating_add(1);
        } else {
            self.stats.pas_suppressed = self.stats.pas_suppressed.saturating_add(1);
        }
        self.timers.start(TimerId::PasTrickle, next);
        Ok(())
    }

    pub(super) fn on_pcs_timer(&mut self) -> Result<(), JdllcError<M::Error>> {
        if !self.pcs.is_active() {
            return Ok(());
        }
        let (transmit, next) = self.pcs.fire(&mut self.rng);
        if transmit {
            self.send_async(FhFrameType::PanConfigSolicit)?;
            self.stats.pcs_sent = self.stats.pcs_sent.saturating_add(1);
        } else {
            self.stats.pcs_suppressed = self.stats.pcs_suppressed.saturating_add(1);
        }
        self.timers.start(TimerId::PcsTrickle, next);
        Ok(())
    }

    /// Bookkeeping for an incoming WS-async frame
    pub(super) fn on_async_frame(
        &mut self,
        ind: &WsAsyncIndication,
    ) -> Result<(), JdllcError<M::Error>> {
        match ind.frame_type {
            FhFrameType::PanAdvertSolicit => {
                self.stats.pas_received = self.stats.pas_received.saturating_add(1);
                self.pas.hear();
                Ok(())
            }
            FhFrameType::PanConfigSolicit => {
                self.stats.pcs_received = self.stats.pcs_received.saturating_add(1);
                self.pcs.hear();
                Ok(())
            }
            FhFrameType::PanAdvert => {
                self.stats.pa_received = self.stats.pa_received.saturating_add(1);
                self.pas.hear();
                self.on_pan_advert(ind);
                Ok(())
            }
            FhFrameType::PanConfig => {
                self.stats.pc_received = self.stats.pc_received.saturating_add(1);
                self.pcs.hear();
                self.on_pan_config(ind)
            }
            FhFrameType::Data | FhFrameType::Ack => Ok(()),
        }
    }

    fn parse_ies(&mut self, ind: &WsAsyncIndication) -> Option<WpFields> {
        match parse_payload_ies(&ind.payload_ies) {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!("IEs from {} ignored: {}", ind.src_address, e);
                self.stats.ie_parse_failures = self.stats.ie_parse_failures.saturating_add(1);
                None
            }
        }
    }

    fn on_pan_advert(&mut self, ind: &WsAsyncIndication) {
        let state = self.session.state();
        if !self.config.fh_enabled
            || !matches!(state, JoinState::Joining | JoinState::InitRestoring)
            || self.session.coordinator.is_some()
            || !self.pas.is_active()
        {
            return;
        }
        if !self.pan_acceptable(ind.src_pan_id) {
            return;
        }
        let fields = match self.parse_ies(ind) {
            Some(fields) => fields,
            None => return,
        };
        if let Some(wanted) = &self.config.fh.network_name {
            if fields.network_name.as_ref() != Some(wanted) {
                debug!("advertisement for another network name ignored");
                return;
            }
        }

        if let Some(pan) = fields.pan {
            self.set_attribute(Attribute::FhPanSize(pan.pan_size));
            self.set_attribute(Attribute::FhRoutingCost(pan.routing_cost));
        }
        self.session.network_id = ind.src_pan_id;
        self.session.coordinator = Some(CoordinatorAddress::extended(ind.src_address));
        self.set_attribute(Attribute::PanId(ind.src_pan_id));
        self.set_attribute(Attribute::CoordExtAddress(ind.src_address));
        info!("candidate parent in PAN {=u16:#x}", ind.src_pan_id);

        self.pas.stop();
        self.timers.stop(TimerId::PasTrickle);
        self.start_pcs();
    }

    fn on_pan_config(&mut self, ind: &WsAsyncIndication) -> Result<(), JdllcError<M::Error>> {
        if !self.config.fh_enabled {
            return Ok(());
        }
        let state = self.session.state();
        let wanted = match state {
            // With or without an earlier advertisement, unless already associating
            JoinState::Joining => {
                self.pan_acceptable(ind.src_pan_id)
                    && !self.assoc_pending
                    && !self.timers.is_running(TimerId::FhAssociate)
            }
            JoinState::InitRestoring | JoinState::Orphan => {
                ind.src_pan_id == self.session.network_id && self.pcs.is_active()
            }
            _ => false,
        };
        if !wanted {
            return Ok(());
        }
        let fields = match self.parse_ies(ind) {
            Some(fields) => fields,
            None => return Ok(()),
        };

        if let Some(version) = fields.pan_version {
            self.set_attribute(Attribute::FhPanVersion(version));
        }
        if let Some(hashes) = fields.gtk_hashes {
            for (index, hash) in hashes.iter().enumerate() {
                self.set_attribute(Attribute::FhGtkHash {
                    index: index as u8,
                    hash: *hash,
                });
            }
        }
        self.stop_trickles();

        match state {
            JoinState::Joining => {
                self.session.network_id = ind.src_pan_id;
                self.session.coordinator = Some(CoordinatorAddress::extended(ind.src_address));
                self.set_attribute(Attribute::PanId(ind.src_pan_id));
                self.set_attribute(Attribute::CoordExtAddress(ind.src_address));
                let delay = if self.fh_assoc_attempts == 0 {
                    self.config.fh.first_assoc_delay
                } else {
                    self.config.fh.assoc_delay
                };
                self.timers.start(TimerId::FhAssociate, delay);
                info!(
                    "PAN {=u16:#x} configuration received, associating in {} ms",
                    ind.src_pan_id,
                    Millis::from(delay).0
                );
            }
            JoinState::InitRestoring => self.confirm_rejoin(),
            _ => self.realign()?,
        }
        Ok(())
    }
}
