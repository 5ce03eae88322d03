#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use rand::rngs::mock::StepRng;
use wpan_node::{
    config::{
        session::{DeviceDescriptor, ParentInfo},
        ExtAddr, PanId, ShortAddr, PAN_ID_ANY,
    },
    jdllc::{JoinCallbacks, JoinState, Jdllc, MacCallbacks},
    mac::{
        api::{
            AssociateRequest, Attribute, DisassociateRequest, MacEngine, PollRequest,
            ScanRequest, SyncRequest, WsAsyncRequest,
        },
        ie::build::{netname_ie, pan_ie, pan_version_ie, gtk_hash_ie, wp_group, IeBlock},
        types::{
            Address, AssociateConfirm, BeaconNotify, DataConfirm, DataIndication, DisassociateReason, FhFrameType,
            MacEvent, PanDescriptor, PollConfirm, ScanConfirm, ScanType, SecurityDescriptor,
            Status, SuperframeSpec, WsAsyncIndication,
        },
    },
    platform::{MacEventConsumer, Millis, NvStore, TimerBank},
    security::{NoSecurity, SecurityManager},
};

/// Mock MAC error type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockError {
    /// Request refused
    Rejected,
}

/// Request recorded by the mock MAC
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Scan(ScanRequest),
    Associate(AssociateRequest),
    Poll(PollRequest),
    Sync(SyncRequest),
    Disassociate(DisassociateRequest),
    WsAsync(WsAsyncRequest),
}

/// Mock MAC engine for testing
pub struct MockMac {
    pub requests: Vec<Request>,
    pub attributes: Vec<Attribute>,
    pub pan_id: PanId,
    pub reject_requests: bool,
    pub reject_attributes: bool,
}

impl MockMac {
    /// Create new mock MAC
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            attributes: Vec::new(),
            pan_id: PAN_ID_ANY,
            reject_requests: false,
            reject_attributes: false,
        }
    }

    fn record(&mut self, req: Request) -> Result<(), MockError> {
        if self.reject_requests {
            return Err(MockError::Rejected);
        }
        self.requests.push(req);
        Ok(())
    }

    /// Forget recorded requests and attributes
    pub fn clear(&mut self) {
        self.requests.clear();
        self.attributes.clear();
    }

    pub fn scans(&self) -> Vec<ScanRequest> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::Scan(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn associations(&self) -> Vec<AssociateRequest> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::Associate(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    pub fn poll_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| matches!(r, Request::Poll(_)))
            .count()
    }

    pub fn sync_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| matches!(r, Request::Sync(_)))
            .count()
    }

    pub fn async_frames(&self) -> Vec<FhFrameType> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::WsAsync(w) => Some(w.frame_type),
                _ => None,
            })
            .collect()
    }

    pub fn has_attribute(&self, attr: &Attribute) -> bool {
        self.attributes.contains(attr)
    }
}

impl MacEngine for MockMac {
    type Error = MockError;

    fn scan_request(&mut self, req: &ScanRequest) -> Result<(), MockError> {
        self.record(Request::Scan(*req))
    }

    fn associate_request(&mut self, req: &AssociateRequest) -> Result<(), MockError> {
        self.record(Request::Associate(*req))
    }

    fn poll_request(&mut self, req: &PollRequest) -> Result<(), MockError> {
        self.record(Request::Poll(*req))
    }

    fn sync_request(&mut self, req: &SyncRequest) -> Result<(), MockError> {
        self.record(Request::Sync(*req))
    }

    fn disassociate_request(&mut self, req: &DisassociateRequest) -> Result<(), MockError> {
        self.record(Request::Disassociate(*req))
    }

    fn ws_async_request(&mut self, req: &WsAsyncRequest) -> Result<(), MockError> {
        self.record(Request::WsAsync(*req))
    }

    fn set_attribute(&mut self, attr: Attribute) -> Result<(), MockError> {
        if self.reject_attributes {
            return Err(MockError::Rejected);
        }
        if let Attribute::PanId(pan) = attr {
            self.pan_id = pan;
        }
        self.attributes.push(attr);
        Ok(())
    }

    fn pan_id(&mut self) -> Result<PanId, MockError> {
        Ok(self.pan_id)
    }
}

/// Shared millisecond clock driving the mock timers
#[derive(Clone, Default)]
pub struct MockClock(Rc<Cell<u32>>);

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u32 {
        self.0.get()
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get() + ms);
    }
}

/// Count-down timer reading the mock clock
pub struct MockTimer {
    clock: MockClock,
    deadline: Option<u32>,
}

impl embedded_hal::timer::CountDown for MockTimer {
    type Time = Millis;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Millis>,
    {
        self.deadline = Some(self.clock.now() + count.into().0);
    }

    fn wait(&mut self) -> nb::Result<(), void::Void> {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => Ok(()),
            _ => Err(nb::Error::WouldBlock),
        }
    }
}

impl embedded_hal::timer::Cancel for MockTimer {
    type Error = MockError;

    fn cancel(&mut self) -> Result<(), MockError> {
        self.deadline.take().map(|_| ()).ok_or(MockError::Rejected)
    }
}

/// One mock timer per controller timer
pub fn timers(clock: &MockClock) -> TimerBank<MockTimer> {
    let timer = || MockTimer {
        clock: clock.clone(),
        deadline: None,
    };
    TimerBank::new([timer(), timer(), timer(), timer(), timer()])
}

/// Application recording every callback
#[derive(Default)]
pub struct MockApp {
    pub joined: Vec<(DeviceDescriptor, ParentInfo)>,
    pub states: Vec<JoinState>,
    pub disassociated: Vec<(ExtAddr, DisassociateReason)>,
    pub left: Vec<(ExtAddr, Status)>,
    pub forwarded: usize,
    pub associate_confirms: usize,
    pub data_indications: usize,
    pub async_indications: usize,
}

impl JoinCallbacks for MockApp {
    fn joined(&mut self, device: &DeviceDescriptor, parent: &ParentInfo) {
        self.joined.push((*device, *parent));
    }

    fn disassociate_indication(&mut self, ext_address: &ExtAddr, reason: DisassociateReason) {
        self.disassociated.push((*ext_address, reason));
    }

    fn disassociate_confirm(&mut self, ext_address: &ExtAddr, status: Status) {
        self.left.push((*ext_address, status));
    }

    fn state_changed(&mut self, state: JoinState) {
        self.states.push(state);
    }
}

impl MacCallbacks for MockApp {
    fn associate_confirm(&mut self, _cnf: &AssociateConfirm) {
        self.associate_confirms += 1;
    }

    fn beacon_notify(&mut self, _ind: &BeaconNotify) {
        self.forwarded += 1;
    }

    fn scan_confirm(&mut self, _cnf: &ScanConfirm) {
        self.forwarded += 1;
    }

    fn poll_confirm(&mut self, _cnf: &PollConfirm) {
        self.forwarded += 1;
    }

    fn data_confirm(&mut self, _cnf: &DataConfirm) {
        self.forwarded += 1;
    }

    fn data_indication(&mut self, _ind: &DataIndication) {
        self.forwarded += 1;
        self.data_indications += 1;
    }

    fn ws_async_indication(&mut self, _ind: &WsAsyncIndication) {
        self.forwarded += 1;
        self.async_indications += 1;
    }
}

/// In-memory NV store
#[derive(Default)]
pub struct MockNv {
    pub stored: Option<(DeviceDescriptor, ParentInfo)>,
}

impl NvStore for MockNv {
    type Error = MockError;

    fn load_network(&mut self) -> Result<Option<(DeviceDescriptor, ParentInfo)>, MockError> {
        Ok(self.stored)
    }

    fn store_network(
        &mut self,
        device: &DeviceDescriptor,
        parent: &ParentInfo,
    ) -> Result<(), MockError> {
        self.stored = Some((*device, *parent));
        Ok(())
    }

    fn clear_network(&mut self) -> Result<(), MockError> {
        self.stored = None;
        Ok(())
    }
}

/// Controller wired to the mocks
pub type TestJdllc<'q, S = NoSecurity> = Jdllc<'q, MockMac, MockTimer, StepRng, MockApp, S>;

/// Build a controller with zero trickle jitter
pub fn controller<'q, S: SecurityManager>(
    config: wpan_node::config::JoinConfig,
    clock: &MockClock,
    security: S,
    consumer: MacEventConsumer<'q>,
) -> TestJdllc<'q, S> {
    Jdllc::new(
        config,
        MockMac::new(),
        timers(clock),
        StepRng::new(0, 0),
        MockApp::default(),
        security,
        consumer,
    )
}

/// Run scheduler passes until no event is left
pub fn settle<S: SecurityManager>(jdllc: &mut TestJdllc<'_, S>) {
    for _ in 0..16 {
        jdllc.process().unwrap();
        if !jdllc.has_pending_events() {
            return;
        }
    }
    panic!("controller did not settle");
}

/// Advance the clock by `ms` and settle
pub fn advance<S: SecurityManager>(jdllc: &mut TestJdllc<'_, S>, clock: &MockClock, ms: u32) {
    clock.advance(ms);
    jdllc.update_time(core::time::Duration::from_millis(u64::from(clock.now())));
    settle(jdllc);
}

pub const OWN_EXT: ExtAddr = [0x10; 8];
pub const COORD_EXT: ExtAddr = [0xC0; 8];

/// Beacon from a coordinator known by its short address
pub fn beacon(pan: PanId, coord: ShortAddr, channel: u8, beacon_order: u8, permit: bool) -> MacEvent {
    MacEvent::BeaconNotify(BeaconNotify {
        bsn: 0,
        pan: PanDescriptor {
            coord_address: Address::Short(coord),
            coord_pan_id: pan,
            logical_channel: channel,
            channel_page: 0,
            superframe_spec: SuperframeSpec::new(beacon_order, beacon_order, permit),
            link_quality: 200,
        },
    })
}

pub fn scan_confirm(scan_type: ScanType, status: Status) -> MacEvent {
    MacEvent::ScanConfirm(ScanConfirm {
        status,
        scan_type,
        result_count: 0,
    })
}

pub fn poll_confirm(status: Status) -> MacEvent {
    MacEvent::PollConfirm(PollConfirm { status })
}

fn async_indication(frame_type: FhFrameType, src: ExtAddr, pan: PanId, ies: IeBlock) -> MacEvent {
    MacEvent::WsAsyncIndication(WsAsyncIndication {
        frame_type,
        src_address: src,
        src_pan_id: pan,
        security: SecurityDescriptor::default(),
        payload_ies: ies,
    })
}

/// PAN advertisement carrying a PAN IE and a network name
pub fn pan_advert(src: ExtAddr, pan: PanId, name: &[u8]) -> MacEvent {
    let mut subs = IeBlock::new();
    pan_ie(&mut subs, 10, 256).unwrap();
    netname_ie(&mut subs, name).unwrap();
    async_indication(FhFrameType::PanAdvert, src, pan, wp_group(&subs).unwrap())
}

/// PAN configuration carrying a PAN version and GTK hashes
pub fn pan_config(src: ExtAddr, pan: PanId) -> MacEvent {
    let mut subs = IeBlock::new();
    pan_version_ie(&mut subs, 3).unwrap();
    gtk_hash_ie(&mut subs, &[[0xA1; 8], [0xA2; 8], [0xA3; 8], [0xA4; 8]]).unwrap();
    async_indication(FhFrameType::PanConfig, src, pan, wp_group(&subs).unwrap())
}

/// Solicit frame from a neighbour
pub fn solicit(frame_type: FhFrameType, src: ExtAddr, pan: PanId) -> MacEvent {
    async_indication(frame_type, src, pan, IeBlock::new())
}

/// Frame with a truncated IE block
pub fn malformed(frame_type: FhFrameType, src: ExtAddr, pan: PanId) -> MacEvent {
    let mut ies = IeBlock::new();
    ies.extend_from_slice(&[0x05, 0xA0, 0x01]).unwrap();
    async_indication(frame_type, src, pan, ies)
}
