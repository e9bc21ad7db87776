use crate::config::FaceConfig;
use crate::errors::FaceError;
use crate::scheduler::{NodeCallback, Scheduler};
use crate::transport::{RegistrationOptions, Transport};
use libndn::delayed_call_table::DelayedCallTable;
use libndn::interest_filter_table::InterestFilterTable;
use libndn::registered_prefix_table::RegisteredPrefixTable;
use libndn::wire::{JsonWireFormat, Packet, WireFormat};
use libndn::{
    CallbackOutcome, CallbackResult, Data, EntryId, Interest, InterestFilter, Name, OnData, OnTimeout, PendingInterest,
    PendingInterestTable,
};
use log::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Called for each incoming interest that matches an interest filter, with the filter's prefix, the interest, the
/// node (to answer with [`Node::put_data`]), the filter id and the filter itself.
pub type OnInterest =
    Box<dyn Fn(&Name, &Interest, &mut Node, EntryId, &InterestFilter) -> CallbackResult + Send + Sync>;
/// Called with the prefix when the transport refuses a registration.
pub type OnRegisterFailed = Box<dyn Fn(&Name) -> CallbackResult + Send + Sync>;

/// The base client.
///
/// The node owns the protocol tables and decides when to consult them. It is single threaded: every method must be
/// called from the thread that owns it. [`crate::ThreadsafeFace`] provides the cross-thread entry point.
pub struct Node {
    pending_interest_table: PendingInterestTable,
    interest_filter_table: InterestFilterTable<OnInterest>,
    registered_prefix_table: RegisteredPrefixTable,
    scheduler: Box<dyn Scheduler>,
    transport: Box<dyn Transport>,
    wire_format: Box<dyn WireFormat>,
    config: FaceConfig,
}

impl Node {
    /// Create a node whose delayed calls, including interest timeouts, run from [`Node::process_events`].
    pub fn new<T: Transport + 'static>(transport: T, config: FaceConfig) -> Self {
        Self::with_scheduler(Box::new(transport), Box::new(DelayedCallTable::<NodeCallback>::new()), config)
    }

    pub fn with_scheduler(transport: Box<dyn Transport>, scheduler: Box<dyn Scheduler>, config: FaceConfig) -> Self {
        Self {
            pending_interest_table: PendingInterestTable::new(),
            interest_filter_table: InterestFilterTable::new(),
            registered_prefix_table: RegisteredPrefixTable::new(),
            scheduler,
            transport,
            wire_format: Box::new(JsonWireFormat),
            config,
        }
    }

    pub fn with_wire_format<W: WireFormat + 'static>(mut self, wire_format: W) -> Self {
        self.wire_format = Box::new(wire_format);
        self
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    pub fn pending_interest_count(&self) -> usize {
        self.pending_interest_table.len()
    }

    pub fn interest_filter_count(&self) -> usize {
        self.interest_filter_table.len()
    }

    pub fn registered_prefix_count(&self) -> usize {
        self.registered_prefix_table.len()
    }

    /// Send `interest` and remember it until matching data arrives or its lifetime runs out.
    ///
    /// `interest` must be the caller's own copy. A missing lifetime or nonce is filled in before sending. If the
    /// encoded interest is too large, nothing is added and an error is returned.
    pub fn express_interest(
        &mut self,
        id: EntryId,
        interest: Interest,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    ) -> Result<(), FaceError> {
        let lifetime = interest.interest_lifetime().unwrap_or_else(|| self.config.default_interest_lifetime());
        let mut interest = interest.with_interest_lifetime(lifetime);
        if interest.nonce().is_none() {
            interest = interest.with_nonce(rand::random());
        }
        let encoding = self.wire_format.encode(&Packet::Interest(interest.clone()))?;
        self.check_size(encoding.len())?;

        trace!("Expressing interest {id} for {}", interest.name());
        let entry = self.pending_interest_table.add(id, interest, on_data, on_timeout);
        self.arm_interest_timeout(entry, lifetime);
        self.transport.send(&encoding)?;
        Ok(())
    }

    fn arm_interest_timeout(&mut self, entry: Arc<PendingInterest>, lifetime: Duration) {
        self.scheduler.call_later(lifetime, Box::new(move |node: &mut Node| node.process_interest_timeout(&entry)));
    }

    /// Runs when an interest's lifetime is up. The entry may already have been satisfied or cancelled, in which case
    /// this does nothing.
    fn process_interest_timeout(&mut self, entry: &Arc<PendingInterest>) {
        if entry.is_removed() {
            return;
        }
        if self.pending_interest_table.remove_entry(entry) {
            debug!("Interest {} for {} timed out", entry.id(), entry.interest().name());
            entry.call_timeout();
        }
    }

    /// Cancel the pending interest with this id. Its callbacks will not be called. Unknown ids are ignored.
    pub fn remove_pending_interest(&mut self, id: EntryId) {
        self.pending_interest_table.remove_by_id(id);
    }

    /// Register `prefix` with the forwarder.
    ///
    /// If `on_interest` is given, an interest filter for the prefix is installed as well and removed together with
    /// the registration. If the transport refuses the registration, `on_register_failed` is called and nothing is
    /// kept.
    pub fn register_prefix(
        &mut self,
        id: EntryId,
        prefix: Name,
        on_interest: Option<OnInterest>,
        on_register_failed: OnRegisterFailed,
        options: RegistrationOptions,
    ) {
        let filter_id = on_interest.map(|on_interest| {
            let filter_id = EntryId::next();
            self.interest_filter_table.set_interest_filter(filter_id, InterestFilter::new(prefix.clone()), on_interest);
            filter_id
        });
        match self.transport.register_prefix(&prefix, options) {
            Ok(()) => {
                debug!("Registered prefix {prefix} with id {id}");
                self.registered_prefix_table.add(id, prefix, filter_id);
            }
            Err(e) => {
                warn!("Register prefix failed for {prefix}. {e}");
                if let Some(filter_id) = filter_id {
                    self.interest_filter_table.unset_interest_filter(filter_id);
                }
                CallbackOutcome::inspect(on_register_failed(&prefix), "onRegisterFailed");
            }
        }
    }

    /// Remove the registration with this id along with any interest filter that was installed with it.
    pub fn remove_registered_prefix(&mut self, id: EntryId) {
        for filter_id in self.registered_prefix_table.remove_registered_prefix(id) {
            self.interest_filter_table.unset_interest_filter(filter_id);
        }
    }

    pub fn set_interest_filter(&mut self, id: EntryId, filter: InterestFilter, on_interest: OnInterest) {
        self.interest_filter_table.set_interest_filter(id, filter, on_interest);
    }

    pub fn unset_interest_filter(&mut self, id: EntryId) {
        self.interest_filter_table.unset_interest_filter(id);
    }

    /// Encode `data` and send it.
    pub fn put_data(&mut self, data: &Data) -> Result<(), FaceError> {
        let encoding = self.wire_format.encode(&Packet::Data(data.clone()))?;
        self.send(&encoding)
    }

    /// Send an already encoded element.
    pub fn send(&mut self, encoding: &[u8]) -> Result<(), FaceError> {
        self.check_size(encoding.len())?;
        self.transport.send(encoding)?;
        Ok(())
    }

    fn check_size(&self, size: usize) -> Result<(), FaceError> {
        let max = self.config.max_ndn_packet_size;
        if size > max {
            return Err(FaceError::PacketTooLarge { size, max });
        }
        Ok(())
    }

    /// Arm a one-shot callback with this node's scheduler.
    pub fn call_later(&mut self, delay: Duration, callback: NodeCallback) {
        self.scheduler.call_later(delay, callback);
    }

    /// Read everything waiting on the transport and dispatch it, then run delayed calls that are due.
    pub fn process_events(&mut self) {
        loop {
            match self.transport.receive() {
                Ok(Some(element)) => self.on_received_element(&element),
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not read from the transport. {e}");
                    break;
                }
            }
        }
        for callback in self.scheduler.take_due(Instant::now()) {
            callback(self);
        }
    }

    /// Dispatch one element that arrived from the transport.
    pub fn on_received_element(&mut self, element: &[u8]) {
        match self.wire_format.decode(element) {
            Ok(Packet::Interest(interest)) => self.dispatch_interest(&interest),
            Ok(Packet::Data(data)) => self.dispatch_data(&data),
            Err(e) => warn!("Dropping an element that could not be decoded. {e}"),
        }
    }

    fn dispatch_interest(&mut self, interest: &Interest) {
        let filters = self.interest_filter_table.matching_filters(interest.name());
        if filters.is_empty() {
            trace!("No interest filter for {}", interest.name());
        }
        for entry in filters {
            let result = (entry.on_interest())(entry.filter().prefix(), interest, self, entry.id(), entry.filter());
            CallbackOutcome::inspect(result, "onInterest");
        }
    }

    fn dispatch_data(&mut self, data: &Data) {
        let mut entries = Vec::new();
        self.pending_interest_table.extract_matching(data.name(), &mut entries);
        if entries.is_empty() {
            trace!("No pending interest for {}", data.name());
        }
        for entry in entries {
            entry.call_on_data(data);
        }
    }

    /// Close the transport and forget every pending interest, filter, registration and delayed call.
    pub fn shutdown(&mut self) {
        debug!("Shutting down node");
        self.transport.close();
        self.pending_interest_table.clear();
        self.interest_filter_table.clear();
        self.registered_prefix_table.clear();
        self.scheduler.clear();
    }
}
