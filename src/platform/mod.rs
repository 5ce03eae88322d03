//! Platform services the controller depends on
//!
//! - One-shot timers built on `embedded-hal` count-downs
//! - The callback queue and task wake-up
//! - Non-volatile storage of the network membership

/// Persistent network membership
pub mod nv;

/// Callback queue and task signal
pub mod signal;

/// One-shot timers
pub mod timer;

pub use nv::NvStore;
pub use signal::{
    CallbackSink, MacEventConsumer, MacEventProducer, MacEventQueue, QueueFull, TaskSignal,
    MAC_QUEUE_LEN,
};
pub use timer::{Millis, TimerBank, TimerId, TIMER_COUNT};
