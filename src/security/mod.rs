//! Link-layer security binding
//!
//! The controller does not implement any cipher. It owns a
//! [`SecurityManager`] and calls it at fixed points of the join process:
//! - when joining starts, to seed the outgoing frame counter
//! - when a parent is selected, to register it as a security peer
//! - before every outgoing request, to fill the security descriptor
//! - on every incoming data or FH frame, to check the security level
//!
//! [`NoSecurity`] is the default and compiles all of this away.

use crate::config::{ExtAddr, PanId, ShortAddr};
use crate::mac::types::SecurityDescriptor;

/// Key and device table management supplied by the application
pub trait SecurityManager {
    /// Reset the security tables and seed the outgoing frame counter
    fn init(&mut self, frame_counter: u32);

    /// Register the parent as a security peer
    fn add_device(&mut self, pan_id: PanId, short: ShortAddr, ext: ExtAddr, frame_counter: u32);

    /// Fill the security descriptor of an outgoing request
    fn fill_descriptor(&mut self, descriptor: &mut SecurityDescriptor);

    /// Whether an incoming frame's security level is acceptable
    fn validate_level(&mut self, descriptor: &SecurityDescriptor) -> bool {
        let _ = descriptor;
        true
    }
}

/// Security disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecurity;

impl SecurityManager for NoSecurity {
    fn init(&mut self, _frame_counter: u32) {}

    fn add_device(&mut self, _pan_id: PanId, _short: ShortAddr, _ext: ExtAddr, _fc: u32) {}

    fn fill_descriptor(&mut self, descriptor: &mut SecurityDescriptor) {
        *descriptor = SecurityDescriptor::default();
    }
}

/// Controller-side wrapper around a [`SecurityManager`]
pub struct SecurityBinding<S> {
    manager: S,
    frame_counter: u32,
    dropped: u32,
}

impl<S: SecurityManager> SecurityBinding<S> {
    /// Bind `manager`, seeding it with `frame_counter` on every start
    pub fn new(manager: S, frame_counter: u32) -> Self {
        Self {
            manager,
            frame_counter,
            dropped: 0,
        }
    }

    /// Joining or rejoining is starting
    pub fn on_start(&mut self) {
        self.manager.init(self.frame_counter);
    }

    /// A parent was selected
    pub fn on_parent_selected(&mut self, pan_id: PanId, short: ShortAddr, ext: ExtAddr) {
        debug!("security: parent {=u16:#x} added", short);
        self.manager.add_device(pan_id, short, ext, 0);
    }

    /// Descriptor for an outgoing request
    pub fn secure(&mut self) -> SecurityDescriptor {
        let mut descriptor = SecurityDescriptor::default();
        self.manager.fill_descriptor(&mut descriptor);
        descriptor
    }

    /// Check an incoming frame, counting it if it has to be dropped
    pub fn accept(&mut self, descriptor: &SecurityDescriptor) -> bool {
        let ok = self.manager.validate_level(descriptor);
        if !ok {
            self.dropped = self.dropped.saturating_add(1);
            warn!("security: frame dropped, level {}", descriptor.level);
        }
        ok
    }

    /// Incoming frames rejected so far
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Underlying manager
    pub fn manager(&self) -> &S {
        &self.manager
    }

    /// Underlying manager, mutably
    pub fn manager_mut(&mut self) -> &mut S {
        &mut self.manager
    }
}
