//! Joining logical link controller for low-power wireless nodes
//!
//! This crate implements the device side of network membership in an
//! IEEE 802.15.4-style network. It drives a MAC engine through scanning,
//! parent selection, association, rejoin and orphan recovery, and keeps the
//! membership alive with polling.
//!
//! # Features
//! - Beacon-enabled, non-beacon and frequency-hopping (FH) networks
//! - Trickle-timed PAN advertisement / configuration solicitation in FH mode
//! - Rejoin from stored descriptors without scanning
//! - Bounded orphan recovery with application-visible give-up
//! - Pluggable security manager, compiled out by default
//! - `no_std`, no allocation, no unsafe code
//!
//! # Example
//! ```ignore
//! use wpan_node::{
//!     config::{ChannelMask, JoinConfig},
//!     jdllc::Jdllc,
//!     platform::{CallbackSink, MacEventQueue, TimerBank},
//!     security::NoSecurity,
//! };
//!
//! let mut queue = MacEventQueue::new();
//! let (producer, consumer) = queue.split();
//!
//! // Hand the producer half to the MAC engine's callback context
//! let sink = CallbackSink::new(producer, || wake_task());
//!
//! let config = JoinConfig::new_non_beacon(EXT_ADDR, 0x1234, ChannelMask::range(11, 26));
//! let mut jdllc = Jdllc::new(config, mac, TimerBank::new(timers), rng, app, NoSecurity, consumer);
//!
//! jdllc.join()?;
//! loop {
//!     wait_for_wake();
//!     jdllc.update_time(now());
//!     jdllc.process()?;
//! }
//! ```

#![warn(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

/// Join configuration, channel masks and session state
pub mod config;

/// Joining logical link controller
pub mod jdllc;

/// MAC engine interface
pub mod mac;

/// Timers, callback queue and storage
pub mod platform;

/// Security manager binding
pub mod security;
