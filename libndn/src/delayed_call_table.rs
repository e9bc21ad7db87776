use std::time::{Duration, Instant};

struct DelayedCall<F> {
    due: Instant,
    callback: F,
}

/// Callbacks waiting for their deadline, for clients that poll instead of running a timer-driven loop.
///
/// Calls are kept sorted by deadline. Calls sharing a deadline come out in the order they were added.
pub struct DelayedCallTable<F> {
    calls: Vec<DelayedCall<F>>,
}

impl<F> Default for DelayedCallTable<F> {
    fn default() -> Self {
        Self { calls: Vec::new() }
    }
}

impl<F> DelayedCallTable<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn call_later(&mut self, delay: Duration, callback: F) {
        self.call_at(Instant::now() + delay, callback);
    }

    pub fn call_at(&mut self, due: Instant, callback: F) {
        let index = self.calls.partition_point(|c| c.due <= due);
        self.calls.insert(index, DelayedCall { due, callback });
    }

    /// Remove and return every callback whose deadline is at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<F> {
        let split = self.calls.partition_point(|c| c.due <= now);
        self.calls.drain(..split).map(|c| c.callback).collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
