//! The table of interests that have been expressed and are still waiting for data.
//!
//! The table is owned by a single thread (the face's loop thread). It never arms or fires timers itself: whoever
//! arms a timeout for an entry must check [`PendingInterest::is_removed`] when the timer fires, because a matching
//! data packet or an explicit cancellation may already have resolved the entry.

use crate::data::Data;
use crate::entry_id::EntryId;
use crate::error::{CallbackOutcome, CallbackResult};
use crate::interest::Interest;
use crate::name::Name;
use log::*;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type OnData = Box<dyn Fn(&Interest, &Data) -> CallbackResult + Send + Sync>;
pub type OnTimeout = Box<dyn Fn(&Interest) -> CallbackResult + Send + Sync>;

/// An outstanding interest together with its callbacks.
pub struct PendingInterest {
    id: EntryId,
    interest: Interest,
    on_data: OnData,
    on_timeout: Option<OnTimeout>,
    removed: AtomicBool,
}

impl PendingInterest {
    fn new(id: EntryId, interest: Interest, on_data: OnData, on_timeout: Option<OnTimeout>) -> Self {
        Self { id, interest, on_data, on_timeout, removed: AtomicBool::new(false) }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The copy of the interest taken when it was expressed.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn on_data(&self) -> &OnData {
        &self.on_data
    }

    /// Deliver `data` to the `on_data` callback.
    pub fn call_on_data(&self, data: &Data) -> CallbackOutcome {
        CallbackOutcome::inspect((self.on_data)(&self.interest, data), "onData")
    }

    /// Call `on_timeout`, if there is one. A failing callback is logged and never propagated.
    pub fn call_timeout(&self) -> CallbackOutcome {
        match &self.on_timeout {
            Some(on_timeout) => CallbackOutcome::inspect(on_timeout(&self.interest), "onTimeout"),
            None => CallbackOutcome::Skipped,
        }
    }

    pub fn set_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

impl Debug for PendingInterest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingInterest")
            .field("id", &self.id)
            .field("name", &self.interest.name().to_string())
            .field("removed", &self.is_removed())
            .finish()
    }
}

/// Interests waiting for data, in the order they were expressed.
#[derive(Default)]
pub struct PendingInterestTable {
    table: Vec<Arc<PendingInterest>>,
}

impl PendingInterestTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Add a new entry. `id` should come from [`EntryId::next`] and `interest` should already be a copy owned by the
    /// table. Uniqueness of `id` is not checked here.
    pub fn add(
        &mut self,
        id: EntryId,
        interest: Interest,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    ) -> Arc<PendingInterest> {
        let entry = Arc::new(PendingInterest::new(id, interest, on_data, on_timeout));
        self.table.push(Arc::clone(&entry));
        entry
    }

    /// Move every entry whose interest matches `name` out of the table and into `entries`, marking each one removed.
    ///
    /// Entries are appended from the most recently expressed to the oldest. Entries that don't match keep their
    /// relative order.
    pub fn extract_matching(&mut self, name: &Name, entries: &mut Vec<Arc<PendingInterest>>) {
        let mut retained = Vec::with_capacity(self.table.len());
        for entry in self.table.drain(..).rev() {
            if entry.interest().matches_name(name) {
                // A timeout may still fire for this entry later. Marking it lets that callback return right away.
                entry.set_removed();
                entries.push(entry);
            } else {
                retained.push(entry);
            }
        }
        retained.reverse();
        self.table = retained;
    }

    /// Remove every entry with the given id. Ids should be unique, but all matches are removed regardless. If there
    /// is no such entry this does nothing.
    pub fn remove_by_id(&mut self, id: EntryId) {
        let before = self.table.len();
        self.table.retain(|entry| {
            if entry.id() == id {
                entry.set_removed();
                false
            } else {
                true
            }
        });
        if self.table.len() == before {
            debug!("remove_by_id: Didn't find pending interest id {id}");
        }
    }

    /// Remove this specific entry and mark it removed.
    ///
    /// Returns false, and does nothing, if the entry was already removed or is no longer in the table.
    pub fn remove_entry(&mut self, entry: &Arc<PendingInterest>) -> bool {
        if entry.is_removed() {
            return false;
        }
        match self.table.iter().position(|e| Arc::ptr_eq(e, entry)) {
            Some(index) => {
                entry.set_removed();
                self.table.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove all entries, marking each one removed.
    pub fn clear(&mut self) {
        for entry in self.table.drain(..) {
            entry.set_removed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallbackError;
    use std::sync::atomic::AtomicUsize;

    fn name(uri: &str) -> Name {
        uri.parse().unwrap()
    }

    fn no_data() -> OnData {
        Box::new(|_: &Interest, _: &Data| Ok(()))
    }

    fn add(table: &mut PendingInterestTable, id: u64, uri: &str) -> Arc<PendingInterest> {
        table.add(EntryId::from(id), Interest::new(name(uri)), no_data(), None)
    }

    fn ids(entries: &[Arc<PendingInterest>]) -> Vec<u64> {
        entries.iter().map(|e| e.id().value()).collect()
    }

    #[test]
    fn extract_in_reverse_submission_order() {
        let mut table = PendingInterestTable::new();
        let e1 = add(&mut table, 1, "/a/b");
        let e2 = add(&mut table, 2, "/a/c");
        let e3 = add(&mut table, 3, "/a/b/d");

        let mut out = Vec::new();
        table.extract_matching(&name("/a/b/d"), &mut out);
        assert_eq!(ids(&out), vec![3, 1]);
        assert_eq!(table.len(), 1);
        assert!(e1.is_removed());
        assert!(e3.is_removed());
        assert!(!e2.is_removed());

        let mut again = Vec::new();
        table.extract_matching(&name("/a/b/d"), &mut again);
        assert!(again.is_empty());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn extract_keeps_order_of_remaining_entries() {
        let mut table = PendingInterestTable::new();
        for (id, uri) in [(1, "/x/1"), (2, "/y"), (3, "/x/2"), (4, "/y"), (5, "/x/3")] {
            add(&mut table, id, uri);
        }
        let mut out = Vec::new();
        table.extract_matching(&name("/y"), &mut out);
        assert_eq!(ids(&out), vec![4, 2]);
        assert_eq!(ids(&table.table), vec![1, 3, 5]);
        assert!(table.table.iter().all(|e| !e.is_removed()));
    }

    #[test]
    fn remove_by_id_removes_every_duplicate() {
        let mut table = PendingInterestTable::new();
        let a = add(&mut table, 7, "/a");
        add(&mut table, 8, "/b");
        let b = add(&mut table, 7, "/c");
        table.remove_by_id(EntryId::from(7));
        assert_eq!(ids(&table.table), vec![8]);
        assert!(a.is_removed() && b.is_removed());

        // Unknown id is a no-op
        table.remove_by_id(EntryId::from(99));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_entry_is_idempotent() {
        let mut table = PendingInterestTable::new();
        add(&mut table, 4, "/other");
        let entry = add(&mut table, 5, "/a");
        assert!(table.remove_entry(&entry));
        assert_eq!(table.len(), 1);
        assert!(!table.remove_entry(&entry));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_entry_after_extraction_returns_false() {
        let mut table = PendingInterestTable::new();
        let entry = add(&mut table, 1, "/a");
        let mut out = Vec::new();
        table.extract_matching(&name("/a/b"), &mut out);
        assert_eq!(out.len(), 1);
        assert!(!table.remove_entry(&entry));
    }

    #[test]
    fn remove_entry_not_in_table() {
        let mut table = PendingInterestTable::new();
        let mut other = PendingInterestTable::new();
        let stranger = add(&mut other, 1, "/a");
        add(&mut table, 1, "/a");
        assert!(!table.remove_entry(&stranger));
        assert!(!stranger.is_removed());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn failing_timeout_is_contained() {
        let _ = env_logger::try_init();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut table = PendingInterestTable::new();
        let entry = table.add(
            EntryId::from(1),
            Interest::new(name("/a")),
            no_data(),
            Some(Box::new(move |interest: &Interest| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CallbackError::msg(format!("no luck with {}", interest.name())))
            })),
        );
        assert_eq!(entry.call_timeout(), CallbackOutcome::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let quiet = add(&mut table, 2, "/b");
        assert_eq!(quiet.call_timeout(), CallbackOutcome::Skipped);
    }

    #[test]
    fn on_data_receives_stored_interest() {
        let mut table = PendingInterestTable::new();
        let entry = table.add(
            EntryId::from(1),
            Interest::new(name("/a")).with_must_be_fresh(true),
            Box::new(|interest: &Interest, data: &Data| {
                assert!(interest.must_be_fresh());
                assert_eq!(data.content(), b"hi");
                Ok(())
            }),
            None,
        );
        let data = Data::new(name("/a/1"), b"hi".to_vec());
        assert_eq!(entry.call_on_data(&data), CallbackOutcome::Completed);
    }

    #[test]
    fn clear_marks_everything_removed() {
        let mut table = PendingInterestTable::new();
        let a = add(&mut table, 1, "/a");
        let b = add(&mut table, 2, "/b");
        table.clear();
        assert!(table.is_empty());
        assert!(a.is_removed() && b.is_removed());
    }
}
