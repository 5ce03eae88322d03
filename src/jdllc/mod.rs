//! Joining logical link controller
//!
//! Drives a device through network membership:
//! - Scan, beacon selection and association in beacon / non-beacon networks
//! - PAN advertisement / configuration solicitation and association in
//!   frequency-hopping networks
//! - Rejoin from stored descriptors, sync-loss handling and orphan recovery
//! - Keep-alive polling for devices whose receiver sleeps
//!
//! The controller is a single-task state machine. MAC completions arrive
//! through the callback queue (see [`crate::platform::signal`]) and timers are
//! polled; both are turned into work by [`Jdllc::process`].

use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

use crate::config::session::{CoordinatorAddress, DeviceDescriptor, ParentInfo, SessionState};
use crate::config::{ChannelMask, JoinConfig, MaskKind, PanId, SHORT_ADDR_NONE};
use crate::mac::api::{Attribute, ChannelFunction, DisassociateRequest, MacEngine};
use crate::mac::types::{Address, DisassociateReason};
use crate::platform::nv::NvStore;
use crate::platform::signal::MacEventConsumer;
use crate::platform::timer::{Millis, TimerBank, TimerId};
use crate::security::{NoSecurity, SecurityBinding, SecurityManager};

mod assoc;
mod dispatch;
mod poll;
mod recovery;
mod scan;

/// Application callbacks
pub mod callbacks;

/// Event queue
pub mod events;

/// States, sub-states and the transition table
pub mod state;

/// Counters
pub mod stats;

/// Trickle timer arithmetic and FH solicitation
pub mod trickle;

pub use callbacks::{JoinCallbacks, MacCallbacks};
pub use events::Event;
pub use state::{JoinState, SubState, Trigger};
pub use stats::JoinStats;
pub use trickle::Trickle;

use events::EventQueue;

/// Controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JdllcError<E> {
    /// The MAC engine refused a request
    Mac(E),
    /// The call is not allowed in the current state
    InvalidTransition {
        /// State the controller was in
        from: JoinState,
        /// What was attempted
        trigger: Trigger,
    },
    /// Operation only allowed before joining
    InvalidState,
}

/// Joining logical link controller
///
/// - `M`: MAC engine
/// - `T`: platform timer, one per [`TimerId`]
/// - `R`: random source for trickle jitter
/// - `A`: application callbacks
/// - `S`: security manager, [`NoSecurity`] unless secured
pub struct Jdllc<'q, M, T, R, A, S = NoSecurity> {
    mac: M,
    timers: TimerBank<T>,
    rng: R,
    app: A,
    security: SecurityBinding<S>,
    mac_events: MacEventConsumer<'q>,
    config: JoinConfig,
    session: SessionState,
    events: EventQueue,
    stats: JoinStats,
    /// Scan request issued, confirm not yet received
    scan_in_progress: bool,
    /// Association request issued, confirm not yet received
    assoc_pending: bool,
    /// Poll request issued, confirm not yet received
    poll_pending: bool,
    /// Disassociation request issued by `leave`
    leaving: bool,
    fh_assoc_attempts: u8,
    sync_losses: u8,
    orphan_attempts: u8,
    pas: Trickle,
    pcs: Trickle,
    now: Duration,
    rejoin_started: Option<Duration>,
}

impl<'q, M, T, R, A, S> Jdllc<'q, M, T, R, A, S>
where
    M: MacEngine,
    T: CountDown<Time = Millis> + Cancel,
    R: RngCore,
    A: JoinCallbacks + MacCallbacks,
    S: SecurityManager,
{
    /// Create a controller in `InitWaiting`
    pub fn new(
        config: JoinConfig,
        mac: M,
        timers: TimerBank<T>,
        rng: R,
        app: A,
        security: S,
        mac_events: MacEventConsumer<'q>,
    ) -> Self {
        let session = SessionState::new(&config);
        let security = SecurityBinding::new(security, config.frame_counter);
        let pas = Trickle::new(config.fh.pas_trickle);
        let pcs = Trickle::new(config.fh.pcs_trickle);
        Self {
            mac,
            timers,
            rng,
            app,
            security,
            mac_events,
            config,
            session,
            events: EventQueue::new(),
            stats: JoinStats::default(),
            scan_in_progress: false,
            assoc_pending: false,
            poll_pending: false,
            leaving: false,
            fh_assoc_attempts: 0,
            sync_losses: 0,
            orphan_attempts: 0,
            pas,
            pcs,
            now: Duration::ZERO,
            rejoin_started: None,
        }
    }

    /// Start joining a network
    ///
    /// Allowed from `InitWaiting` and `AccessDenied`.
    pub fn join(&mut self) -> Result<(), JdllcError<M::Error>> {
        self.apply_checked(Trigger::Join)?;
        self.stats.join_attempts = self.stats.join_attempts.saturating_add(1);
        self.clear_parent();
        self.fh_assoc_attempts = 0;
        self.security.on_start();
        self.configure_mac();

        if self.config.fh_enabled {
            self.session.set_sub_state(SubState::Idle);
            self.start_pas();
        } else {
            let scan = self.scan_sub_state();
            self.session.set_sub_state(scan);
            self.events.raise(Event::StateChange);
        }
        Ok(())
    }

    /// Restore a stored membership without scanning
    ///
    /// Allowed from `InitWaiting` only.
    pub fn rejoin(
        &mut self,
        device: DeviceDescriptor,
        parent: ParentInfo,
    ) -> Result<(), JdllcError<M::Error>> {
        self.apply_checked(Trigger::Rejoin)?;
        self.rejoin_started = Some(self.now);

        self.session.network_id = device.pan_id;
        self.session.own_short = device.short_address;
        self.session.channel = parent.channel;
        self.session.coordinator = Some(CoordinatorAddress {
            short: parent.short_address,
            ext: parent.ext_address,
        });

        self.security.on_start();
        self.security
            .on_parent_selected(device.pan_id, parent.short_address, parent.ext_address);
        self.configure_mac();
        self.write_membership_attributes();

        if self.config.fh_enabled {
            self.session.set_sub_state(SubState::Idle);
            self.start_pcs();
        } else {
            self.session.set_sub_state(SubState::SyncReq);
            self.events.raise(Event::StateChange);
        }
        Ok(())
    }

    /// Restore the membership stored in `nv`, or join if there is none
    ///
    /// Returns `true` if a stored membership was found.
    pub fn resume<N: NvStore>(&mut self, nv: &mut N) -> Result<bool, JdllcError<M::Error>> {
        match nv.load_network() {
            Ok(Some((device, parent))) => {
                info!("resuming PAN {=u16:#x}", device.pan_id);
                self.rejoin(device, parent)?;
                Ok(true)
            }
            Ok(None) => {
                self.join()?;
                Ok(false)
            }
            Err(_) => {
                warn!("stored network unreadable, joining");
                self.join()?;
                Ok(false)
            }
        }
    }

    /// Store the current membership in `nv`
    ///
    /// Returns `false` without writing anything unless the device is joined
    /// or rejoined.
    pub fn save_network<N: NvStore>(&self, nv: &mut N) -> Result<bool, N::Error> {
        if !matches!(self.session.state(), JoinState::Joined | JoinState::Rejoined) {
            return Ok(false);
        }
        match self.session.parent_info(self.config.fh_enabled) {
            Some(parent) => {
                nv.store_network(&self.session.device_descriptor(), &parent)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Erase the membership stored in `nv`
    pub fn forget_network<N: NvStore>(&self, nv: &mut N) -> Result<(), N::Error> {
        nv.clear_network()
    }

    /// Leave the network
    pub fn leave(&mut self) -> Result<(), JdllcError<M::Error>> {
        let state = self.session.state();
        let coord = match self.session.coordinator {
            Some(coord) if state.is_member() || state == JoinState::Orphan => coord,
            _ => return Err(JdllcError::InvalidState),
        };

        let req = DisassociateRequest {
            device_address: coord_address(&coord, self.config.fh_enabled),
            device_pan_id: self.session.network_id,
            reason: DisassociateReason::DeviceWishesLeave,
            tx_indirect: self.config.is_sleepy(),
            security: self.security.secure(),
        };
        debug!("disassociation request");
        self.mac.disassociate_request(&req).map_err(JdllcError::Mac)?;
        self.leaving = true;
        Ok(())
    }

    /// Abandon everything and go back to `InitWaiting`
    pub fn reset(&mut self) {
        self.apply(Trigger::Reset);
        self.teardown();
    }

    /// Run one scheduler pass
    ///
    /// Drains the MAC callback queue, turns expired timers into events and
    /// handles every event pending at the start of the pass. Events raised
    /// while handling wait for the next pass.
    ///
    /// Every MAC completion reaches the application even if the controller's
    /// own handling of it fails; that failure is returned after the queue
    /// has been drained.
    pub fn process(&mut self) -> Result<(), JdllcError<M::Error>> {
        let mut failed = None;
        while let Some(event) = self.mac_events.dequeue() {
            if let Err(e) = self.dispatch(event) {
                failed.get_or_insert(e);
            }
        }

        for id in self.timers.poll_expired() {
            self.events.raise(Event::from(id));
        }

        let batch = self.events.take_all();
        for (i, event) in batch.iter().enumerate() {
            if let Err(e) = self.handle_event(*event) {
                // The failed event and the rest are retried on the next pass
                for rest in &batch[i..] {
                    self.events.raise(*rest);
                }
                return Err(e);
            }
        }
        failed.map_or(Ok(()), Err)
    }

    /// Whether events are waiting for the next pass
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Update the controller's notion of time
    pub fn update_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Replace one of the channel masks. Only allowed in `InitWaiting`.
    pub fn set_channel_mask(
        &mut self,
        kind: MaskKind,
        mask: ChannelMask,
    ) -> Result<(), JdllcError<M::Error>> {
        if self.session.state() != JoinState::InitWaiting {
            return Err(JdllcError::InvalidState);
        }
        *self.config.mask_mut(kind) = mask;
        Ok(())
    }

    /// Restrict joining to `pan_id` ([`crate::config::PAN_ID_ANY`] for any).
    /// Only allowed in `InitWaiting`.
    pub fn set_pan_id(&mut self, pan_id: PanId) -> Result<(), JdllcError<M::Error>> {
        if self.session.state() != JoinState::InitWaiting {
            return Err(JdllcError::InvalidState);
        }
        self.config.pan_id = pan_id;
        self.session.network_id = pan_id;
        Ok(())
    }

    /// Current high-level state
    pub fn state(&self) -> JoinState {
        self.session.state()
    }

    /// Current sub-state
    pub fn sub_state(&self) -> SubState {
        self.session.sub_state()
    }

    /// Session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Configuration in effect
    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Counters
    pub fn stats(&self) -> JoinStats {
        let mut stats = self.stats;
        stats.security_drops = self.security.dropped();
        stats
    }

    /// MAC engine
    pub fn mac(&self) -> &M {
        &self.mac
    }

    /// MAC engine, mutably
    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }

    /// Application callbacks
    pub fn application(&self) -> &A {
        &self.app
    }

    /// Application callbacks, mutably
    pub fn application_mut(&mut self) -> &mut A {
        &mut self.app
    }

    /// Security manager
    pub fn security(&self) -> &S {
        self.security.manager()
    }

    /// Whether `id` is armed
    pub fn timer_running(&self, id: TimerId) -> bool {
        self.timers.is_running(id)
    }

    fn handle_event(&mut self, event: Event) -> Result<(), JdllcError<M::Error>> {
        trace!("event {}", event);
        match event {
            Event::PasTrickle => self.on_pas_timer(),
            Event::PcsTrickle => self.on_pcs_timer(),
            Event::Poll => self.on_poll_due(),
            Event::AssociateRequest => self.on_associate_due(),
            Event::CoordRealign => self.on_coord_realign(),
            Event::ScanBackoff => self.on_backoff_expired(),
            Event::StateChange => self.process_sub_state(),
        }
    }

    /// Apply `trigger`, notifying the application. Rejections are logged.
    fn apply(&mut self, trigger: Trigger) -> Option<JoinState> {
        let from = self.session.state();
        match state::transition(from, trigger, self.session.previous_state()) {
            Some(to) => {
                self.session.set_state(to);
                info!("state {} -> {} ({})", from, to, trigger);
                self.app.state_changed(to);
                Some(to)
            }
            None => {
                warn!("{} rejected in {}", trigger, from);
                None
            }
        }
    }

    fn apply_checked(&mut self, trigger: Trigger) -> Result<JoinState, JdllcError<M::Error>> {
        let from = self.session.state();
        self.apply(trigger)
            .ok_or(JdllcError::InvalidTransition { from, trigger })
    }

    /// Stop all activity and forget the network
    fn teardown(&mut self) {
        self.timers.stop_all();
        self.pas.stop();
        self.pcs.stop();
        self.events.clear();
        self.scan_in_progress = false;
        self.assoc_pending = false;
        self.poll_pending = false;
        self.leaving = false;
        self.fh_assoc_attempts = 0;
        self.sync_losses = 0;
        self.orphan_attempts = 0;
        self.rejoin_started = None;
        self.session.reset(&self.config);
    }

    /// Forget the selected parent, keeping the high-level state
    fn clear_parent(&mut self) {
        self.session.coordinator = None;
        self.session.channel = None;
        self.session.network_id = self.config.pan_id;
        self.session.beacon_order = self.config.beacon_order;
        self.session.superframe_order = self.config.superframe_order;
    }

    fn scan_sub_state(&self) -> SubState {
        if self.config.is_beacon_mode() {
            SubState::ScanPassive
        } else {
            SubState::ScanActive
        }
    }

    /// Write one attribute. A refusal is logged and counted, never fatal.
    fn set_attribute(&mut self, attr: Attribute) {
        if self.mac.set_attribute(attr).is_err() {
            warn!("attribute {} refused", attr);
            self.stats.attribute_failures = self.stats.attribute_failures.saturating_add(1);
        }
    }

    /// Attributes that do not depend on the parent
    fn configure_mac(&mut self) {
        self.set_attribute(Attribute::RxOnWhenIdle(self.config.rx_on_idle));
        self.set_attribute(Attribute::AutoRequest(false));
        if self.config.fh_enabled {
            let fh = &self.config.fh;
            let function = if fh.unicast_mask.count() == 1 {
                ChannelFunction::Fixed
            } else {
                ChannelFunction::DirectHash
            };
            let excluded = fh.unicast_mask.exclude(fh.max_channel);
            let asynchronous = fh.async_mask;
            self.set_attribute(Attribute::FhUnicastChannelFunction(function));
            self.set_attribute(Attribute::FhUnicastExcludedChannels(excluded));
            self.set_attribute(Attribute::FhAsyncChannels(asynchronous));
        }
    }

    /// Attributes describing the network and the parent
    fn write_membership_attributes(&mut self) {
        self.set_attribute(Attribute::PanId(self.session.network_id));
        if let Some(channel) = self.session.channel {
            self.set_attribute(Attribute::LogicalChannel(channel));
        }
        if let Some(coord) = self.session.coordinator {
            if coord.short != SHORT_ADDR_NONE {
                self.set_attribute(Attribute::CoordShortAddress(coord.short));
            }
            self.set_attribute(Attribute::CoordExtAddress(coord.ext));
        }
        if self.session.own_short != SHORT_ADDR_NONE {
            self.set_attribute(Attribute::ShortAddress(self.session.own_short));
        }
        if self.config.is_beacon_mode() {
            self.set_attribute(Attribute::BeaconOrder(self.session.beacon_order));
            self.set_attribute(Attribute::SuperframeOrder(self.session.superframe_order));
        }
    }
}

/// Address to reach the coordinator with
fn coord_address(coord: &CoordinatorAddress, fh: bool) -> Address {
    if fh || coord.short == SHORT_ADDR_NONE {
        Address::Extended(coord.ext)
    } else {
        Address::Short(coord.short)
    }
}
