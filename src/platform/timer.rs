//! One-shot timers
//!
//! The controller owns one platform timer per purpose. Platform timers are
//! `embedded-hal` count-downs; the bank turns them into one-shot timers by
//! cancelling a count-down as soon as it reports expiry, so a timer only runs
//! again when a handler explicitly re-arms it.

use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use heapless::Vec;

/// Number of timers the controller uses
pub const TIMER_COUNT: usize = 5;

/// Timer period in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl From<Duration> for Millis {
    fn from(duration: Duration) -> Self {
        Millis(u32::try_from(duration.as_millis()).unwrap_or(u32::MAX))
    }
}

impl From<Millis> for Duration {
    fn from(ms: Millis) -> Self {
        Duration::from_millis(u64::from(ms.0))
    }
}

/// Timers owned by the controller, in event priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    /// PAN advertisement solicit trickle
    PasTrickle = 0,
    /// PAN configuration solicit trickle
    PcsTrickle = 1,
    /// Keep-alive poll
    Poll = 2,
    /// Delay before an FH association attempt
    FhAssociate = 3,
    /// Scan / orphan backoff
    ScanBackoff = 4,
}

impl TimerId {
    /// Every timer, in priority order
    pub const ALL: [TimerId; TIMER_COUNT] = [
        TimerId::PasTrickle,
        TimerId::PcsTrickle,
        TimerId::Poll,
        TimerId::FhAssociate,
        TimerId::ScanBackoff,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Set of one-shot timers indexed by [`TimerId`]
pub struct TimerBank<T> {
    timers: [T; TIMER_COUNT],
    armed: [bool; TIMER_COUNT],
}

impl<T> TimerBank<T>
where
    T: CountDown<Time = Millis> + Cancel,
{
    /// Build a bank from one platform timer per [`TimerId`], in `ALL` order
    pub fn new(timers: [T; TIMER_COUNT]) -> Self {
        Self {
            timers,
            armed: [false; TIMER_COUNT],
        }
    }

    /// Arm `id` to fire once after `period`, replacing any pending expiry
    pub fn start(&mut self, id: TimerId, period: Duration) {
        let timer = &mut self.timers[id.index()];
        if self.armed[id.index()] {
            // Cancel reports an error if the count-down already elapsed
            timer.cancel().ok();
        }
        timer.start(Millis::from(period));
        self.armed[id.index()] = true;
        trace!("timer {} armed for {} ms", id, Millis::from(period).0);
    }

    /// Cancel `id`; a no-op if it is not running
    pub fn stop(&mut self, id: TimerId) {
        if self.armed[id.index()] {
            self.timers[id.index()].cancel().ok();
            self.armed[id.index()] = false;
            trace!("timer {} stopped", id);
        }
    }

    /// Cancel every timer
    pub fn stop_all(&mut self) {
        for id in TimerId::ALL {
            self.stop(id);
        }
    }

    /// Whether `id` is armed and has not fired yet
    pub fn is_running(&self, id: TimerId) -> bool {
        self.armed[id.index()]
    }

    /// Collect the timers that fired since the last call, in priority order
    pub fn poll_expired(&mut self) -> Vec<TimerId, TIMER_COUNT> {
        let mut fired = Vec::new();
        for id in TimerId::ALL {
            if !self.armed[id.index()] {
                continue;
            }
            let timer = &mut self.timers[id.index()];
            match timer.wait() {
                Ok(()) => {
                    timer.cancel().ok();
                    self.armed[id.index()] = false;
                    // Capacity equals the number of timers
                    fired.push(id).ok();
                }
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(never)) => match never {},
            }
        }
        fired
    }
}
