use wpan_node::{
    config::{ChannelMask, JoinConfig, MaskKind, PAN_ID_ANY},
    jdllc::{JdllcError, JoinState, SubState, Trigger},
    mac::{
        api::Attribute,
        types::{
            Address, AssociateConfirm, AssociateStatus, DataIndication, DisassociateConfirm,
            MacEvent, ScanType, SecurityDescriptor, Status,
        },
    },
    platform::{CallbackSink, MacEventQueue, TimerId},
    security::{NoSecurity, SecurityManager},
};

mod mock;
use mock::*;

fn non_beacon_config() -> JoinConfig {
    JoinConfig::new_non_beacon(OWN_EXT, PAN_ID_ANY, ChannelMask::range(11, 14))
}

fn associate_confirm(status: AssociateStatus, short: u16) -> MacEvent {
    MacEvent::AssociateConfirm(AssociateConfirm {
        status,
        short_address: short,
    })
}

#[test]
fn test_non_beacon_join_adopts_first_beacon() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    assert_eq!(jdllc.state(), JoinState::Joining);
    assert_eq!(jdllc.sub_state(), SubState::ScanActive);

    settle(&mut jdllc);
    let scans = jdllc.mac().scans();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].scan_type, ScanType::Active);

    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(beacon(0x5678, 0x0001, 13, 15, true)).unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.sub_state(), SubState::SyncReq);
    assert_eq!(jdllc.session().network_id, 0x1234);
    assert_eq!(jdllc.session().channel, Some(12));

    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    let assocs = jdllc.mac().associations();
    assert_eq!(assocs.len(), 1);
    assert_eq!(assocs[0].coord_address, Address::Short(0x0000));
    assert_eq!(assocs[0].coord_pan_id, 0x1234);
    assert_eq!(assocs[0].logical_channel, 12);
    // Non-beacon networks never synchronise
    assert_eq!(jdllc.mac().sync_count(), 0);

    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0042))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.state(), JoinState::Joined);
    assert!(jdllc.mac().has_attribute(&Attribute::ShortAddress(0x0042)));
    assert!(jdllc.timer_running(TimerId::Poll));

    let app = jdllc.application();
    assert_eq!(app.joined.len(), 1);
    assert_eq!(app.joined[0].0.short_address, 0x0042);
    assert_eq!(app.joined[0].1.channel, Some(12));
    assert_eq!(app.states, [JoinState::Joining, JoinState::Joined]);
    assert_eq!(jdllc.stats().join_successes, 1);
}

#[test]
fn test_beacon_mode_filters_on_beacon_order() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let config = JoinConfig::new_beacon(OWN_EXT, 0x2222, ChannelMask::range(11, 11), 8, 6);
    let mut jdllc = controller(config, &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().scans()[0].scan_type, ScanType::Passive);

    // Non-beacon coordinator, foreign PAN, closed association: all rejected
    sink.deliver(beacon(0x2222, 0x0001, 11, 15, true)).unwrap();
    sink.deliver(beacon(0x3333, 0x0002, 11, 8, true)).unwrap();
    sink.deliver(beacon(0x2222, 0x0003, 11, 8, false)).unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.sub_state(), SubState::ScanPassive);

    sink.deliver(beacon(0x2222, 0x0004, 11, 7, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Passive, Status::Success))
        .unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.session().beacon_order, 7);
    assert_eq!(jdllc.mac().sync_count(), 1);
    let assocs = jdllc.mac().associations();
    assert_eq!(assocs.len(), 1);
    assert_eq!(assocs[0].coord_address, Address::Short(0x0004));
}

#[test]
fn test_empty_scan_backs_off_with_receiver_off() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let config = non_beacon_config();
    let backoff = config.scan_backoff.as_millis() as u32;
    let mut jdllc = controller(config, &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    jdllc.mac_mut().clear();

    sink.deliver(scan_confirm(ScanType::Active, Status::NoBeacon))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.sub_state(), SubState::ScanBackoff);
    assert!(jdllc.timer_running(TimerId::ScanBackoff));
    assert!(jdllc.mac().has_attribute(&Attribute::RxOnWhenIdle(false)));
    assert!(jdllc.mac().scans().is_empty());

    advance(&mut jdllc, &clock, backoff - 1);
    assert!(jdllc.mac().scans().is_empty());

    advance(&mut jdllc, &clock, 1);
    assert_eq!(jdllc.sub_state(), SubState::ScanActive);
    assert_eq!(jdllc.mac().scans().len(), 1);
    assert_eq!(jdllc.stats().scans, 2);
}

#[test]
fn test_access_denied_is_terminal() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    sink.deliver(associate_confirm(AssociateStatus::PanAccessDenied, 0xFFFF))
        .unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.state(), JoinState::AccessDenied);
    assert_eq!(jdllc.sub_state(), SubState::AccessDenied);
    jdllc.mac_mut().clear();

    // Nothing happens on its own
    advance(&mut jdllc, &clock, 600_000);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    settle(&mut jdllc);
    assert!(jdllc.mac().requests.is_empty());
    assert_eq!(jdllc.state(), JoinState::AccessDenied);

    // An explicit join starts over
    jdllc.join().unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.state(), JoinState::Joining);
    assert_eq!(jdllc.mac().scans().len(), 1);
    assert_eq!(jdllc.stats().join_attempts, 2);
}

#[test]
fn test_association_failure_retries_scan() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    sink.deliver(associate_confirm(AssociateStatus::Mac(Status::NoAck), 0xFFFF))
        .unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.state(), JoinState::Joining);
    assert_eq!(jdllc.sub_state(), SubState::ScanBackoff);
    assert!(jdllc.session().coordinator.is_none());
    assert_eq!(jdllc.session().network_id, PAN_ID_ANY);
    assert_eq!(jdllc.stats().join_failures, 1);
}

#[test]
fn test_join_rejected_while_joined() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    assert_eq!(
        jdllc.join(),
        Err(JdllcError::InvalidTransition {
            from: JoinState::Joining,
            trigger: Trigger::Join,
        })
    );

    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0001))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.state(), JoinState::Joined);
    assert!(matches!(
        jdllc.join(),
        Err(JdllcError::InvalidTransition { from: JoinState::Joined, .. })
    ));
}

#[test]
fn test_duplicate_confirm_is_ignored() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().associations().len(), 1);

    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0001))
        .unwrap();
    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0002))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.session().own_short, 0x0001);
    assert_eq!(jdllc.application().joined.len(), 1);
}

#[test]
fn test_events_forwarded_to_application() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(beacon(0x1234, 0x0001, 13, 15, false)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.application().forwarded, 3);
}

#[test]
fn test_leave_resets_session() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    assert_eq!(jdllc.leave(), Err(JdllcError::InvalidState));

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0001))
        .unwrap();
    settle(&mut jdllc);

    jdllc.leave().unwrap();
    assert!(jdllc
        .mac()
        .requests
        .iter()
        .any(|r| matches!(r, Request::Disassociate(d) if d.tx_indirect)));

    sink.deliver(MacEvent::DisassociateConfirm(DisassociateConfirm {
        status: Status::Success,
        device_address: Address::Short(0x0000),
    }))
    .unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.state(), JoinState::InitWaiting);
    assert!(jdllc.session().coordinator.is_none());
    assert!(!jdllc.timer_running(TimerId::Poll));
    assert_eq!(jdllc.application().left, [(OWN_EXT, Status::Success)]);
}

#[test]
fn test_masks_only_change_before_joining() {
    let mut queue = MacEventQueue::new();
    let (_producer, consumer) = queue.split();
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc
        .set_channel_mask(MaskKind::Default, ChannelMask::range(20, 21))
        .unwrap();
    jdllc.set_pan_id(0x4321).unwrap();
    assert_eq!(jdllc.config().channel_mask.count(), 2);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().scans()[0].channels, ChannelMask::range(20, 21));
    assert_eq!(jdllc.session().network_id, 0x4321);

    assert_eq!(
        jdllc.set_channel_mask(MaskKind::FhAsync, ChannelMask::empty()),
        Err(JdllcError::InvalidState)
    );
    assert_eq!(jdllc.set_pan_id(PAN_ID_ANY), Err(JdllcError::InvalidState));
}

#[test]
fn test_mac_rejection_surfaces_as_error() {
    let mut queue = MacEventQueue::new();
    let (_producer, consumer) = queue.split();
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    jdllc.mac_mut().reject_requests = true;
    assert_eq!(jdllc.process(), Err(JdllcError::Mac(MockError::Rejected)));

    // The scan is attempted again on the next pass
    jdllc.mac_mut().reject_requests = false;
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().scans().len(), 1);
}

#[test]
fn test_refused_attributes_do_not_stall_the_join() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().associations().len(), 1);

    jdllc.mac_mut().reject_attributes = true;
    sink.deliver(associate_confirm(AssociateStatus::Success, 0x0042))
        .unwrap();
    assert_eq!(jdllc.process(), Ok(()));

    assert_eq!(jdllc.state(), JoinState::Joined);
    assert_eq!(jdllc.sub_state(), SubState::Idle);
    assert_eq!(jdllc.session().own_short, 0x0042);
    assert!(jdllc.timer_running(TimerId::Poll));
    assert_eq!(jdllc.stats().attribute_failures, 1);
    let app = jdllc.application();
    assert_eq!(app.joined.len(), 1);
    assert_eq!(app.associate_confirms, 1);
}

#[test]
fn test_refused_attributes_during_scan_are_not_fatal() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, NoSecurity, consumer);
    jdllc.mac_mut().reject_attributes = true;

    jdllc.join().unwrap();
    settle(&mut jdllc);
    sink.deliver(beacon(0x1234, 0x0000, 12, 15, true)).unwrap();
    sink.deliver(scan_confirm(ScanType::Active, Status::Success))
        .unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.sub_state(), SubState::SyncReq);
    assert_eq!(jdllc.mac().associations().len(), 1);
    assert!(jdllc.stats().attribute_failures > 0);
    assert_eq!(jdllc.application().forwarded, 2);
}

/// Rejects every unsecured frame
#[derive(Default)]
struct RequireSecurity;

impl SecurityManager for RequireSecurity {
    fn init(&mut self, _frame_counter: u32) {}

    fn add_device(&mut self, _pan: u16, _short: u16, _ext: [u8; 8], _fc: u32) {}

    fn fill_descriptor(&mut self, descriptor: &mut SecurityDescriptor) {
        descriptor.level = 5;
    }

    fn validate_level(&mut self, descriptor: &SecurityDescriptor) -> bool {
        descriptor.level >= 5
    }
}

#[test]
fn test_insecure_frames_dropped() {
    let mut queue = MacEventQueue::new();
    let (producer, consumer) = queue.split();
    let mut sink = CallbackSink::new(producer, || {});
    let clock = MockClock::new();
    let mut jdllc = controller(non_beacon_config(), &clock, RequireSecurity, consumer);

    jdllc.join().unwrap();
    settle(&mut jdllc);
    assert_eq!(jdllc.mac().scans()[0].security.level, 5);

    let frame = |level| {
        MacEvent::DataIndication(DataIndication {
            src_address: Address::Short(0),
            src_pan_id: 0x1234,
            security: SecurityDescriptor {
                level,
                ..Default::default()
            },
            msdu: heapless::Vec::new(),
        })
    };
    sink.deliver(frame(0)).unwrap();
    sink.deliver(frame(5)).unwrap();
    settle(&mut jdllc);

    assert_eq!(jdllc.application().data_indications, 1);
    assert_eq!(jdllc.stats().security_drops, 1);
}
