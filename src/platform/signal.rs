//! Callback context to task context hand-off
//!
//! The MAC engine reports completions from its own context (often an
//! interrupt). Those reports are copied into a bounded single-producer,
//! single-consumer queue and the application task is woken; the controller
//! drains the queue from [`crate::jdllc::Jdllc::process`].

use heapless::spsc::{Consumer, Producer, Queue};

use crate::mac::types::{
    AssociateConfirm, BeaconNotify, DataConfirm, DataIndication, DisassociateConfirm,
    DisassociateIndication, MacEvent, PollConfirm, ScanConfirm, SyncLossIndication,
    WsAsyncConfirm, WsAsyncIndication,
};

/// Queue capacity parameter; the queue holds one less than this
pub const MAC_QUEUE_LEN: usize = 8;

/// Queue carrying MAC completions to the controller
pub type MacEventQueue = Queue<MacEvent, MAC_QUEUE_LEN>;

/// Producer half handed to the callback context
pub type MacEventProducer<'q> = Producer<'q, MacEvent, MAC_QUEUE_LEN>;

/// Consumer half owned by the controller
pub type MacEventConsumer<'q> = Consumer<'q, MacEvent, MAC_QUEUE_LEN>;

/// Wakes the application task
pub trait TaskSignal {
    /// Signal that work is pending
    fn post(&mut self);
}

impl<F: FnMut()> TaskSignal for F {
    fn post(&mut self) {
        self()
    }
}

/// The queue was full; the event is handed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFull(pub MacEvent);

/// Entry points the MAC engine calls from its callback context
pub struct CallbackSink<'q, W> {
    producer: MacEventProducer<'q>,
    signal: W,
}

impl<'q, W: TaskSignal> CallbackSink<'q, W> {
    /// Wrap the producer half of a [`MacEventQueue`]
    pub fn new(producer: MacEventProducer<'q>, signal: W) -> Self {
        Self { producer, signal }
    }

    /// Enqueue `event` and wake the task
    pub fn deliver(&mut self, event: MacEvent) -> Result<(), QueueFull> {
        self.producer.enqueue(event).map_err(QueueFull)?;
        self.signal.post();
        Ok(())
    }

    /// Association confirm
    pub fn associate_confirm(&mut self, cnf: AssociateConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::AssociateConfirm(cnf))
    }

    /// Beacon notification
    pub fn beacon_notify(&mut self, ind: BeaconNotify) -> Result<(), QueueFull> {
        self.deliver(MacEvent::BeaconNotify(ind))
    }

    /// Scan confirm
    pub fn scan_confirm(&mut self, cnf: ScanConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::ScanConfirm(cnf))
    }

    /// Disassociation indication
    pub fn disassociate_indication(
        &mut self,
        ind: DisassociateIndication,
    ) -> Result<(), QueueFull> {
        self.deliver(MacEvent::DisassociateIndication(ind))
    }

    /// Disassociation confirm
    pub fn disassociate_confirm(&mut self, cnf: DisassociateConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::DisassociateConfirm(cnf))
    }

    /// Poll confirm
    pub fn poll_confirm(&mut self, cnf: PollConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::PollConfirm(cnf))
    }

    /// Data confirm
    pub fn data_confirm(&mut self, cnf: DataConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::DataConfirm(cnf))
    }

    /// Data indication
    pub fn data_indication(&mut self, ind: DataIndication) -> Result<(), QueueFull> {
        self.deliver(MacEvent::DataIndication(ind))
    }

    /// Sync loss indication
    pub fn sync_loss(&mut self, ind: SyncLossIndication) -> Result<(), QueueFull> {
        self.deliver(MacEvent::SyncLoss(ind))
    }

    /// WS-async indication
    pub fn ws_async_indication(&mut self, ind: WsAsyncIndication) -> Result<(), QueueFull> {
        self.deliver(MacEvent::WsAsyncIndication(ind))
    }

    /// WS-async confirm
    pub fn ws_async_confirm(&mut self, cnf: WsAsyncConfirm) -> Result<(), QueueFull> {
        self.deliver(MacEvent::WsAsyncConfirm(cnf))
    }
}
