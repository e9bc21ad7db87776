use crate::node::Node;
use futures::channel::mpsc;
use libndn::delayed_call_table::DelayedCallTable;
use log::*;
use std::time::{Duration, Instant};

/// Work that runs later on the thread that owns the [`Node`].
pub type NodeCallback = Box<dyn FnOnce(&mut Node) + Send>;

/// Arms one-shot callbacks for a [`Node`], e.g. interest timeouts.
pub trait Scheduler: Send {
    fn call_later(&mut self, delay: Duration, callback: NodeCallback);

    /// Callbacks that are due and should be run by [`Node::process_events`]. Schedulers that deliver their own
    /// callbacks return nothing.
    fn take_due(&mut self, _now: Instant) -> Vec<NodeCallback> {
        Vec::new()
    }

    /// Drop every callback that has not run yet.
    fn clear(&mut self) {}
}

/// A polled scheduler. Due calls run when the node processes events.
impl Scheduler for DelayedCallTable<NodeCallback> {
    fn call_later(&mut self, delay: Duration, callback: NodeCallback) {
        DelayedCallTable::call_later(self, delay, callback);
    }

    fn take_due(&mut self, now: Instant) -> Vec<NodeCallback> {
        DelayedCallTable::take_due(self, now)
    }

    fn clear(&mut self) {
        DelayedCallTable::clear(self);
    }
}

/// Passes one-shot callbacks to the [`crate::EventLoop`], which arms a timer for each.
pub(crate) struct LoopScheduler {
    sender: mpsc::UnboundedSender<(Duration, NodeCallback)>,
}

impl LoopScheduler {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<(Duration, NodeCallback)>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }
}

impl Scheduler for LoopScheduler {
    fn call_later(&mut self, delay: Duration, callback: NodeCallback) {
        if self.sender.unbounded_send((delay, callback)).is_err() {
            warn!("The event loop has gone away. A delayed call will never run.");
        }
    }
}
