use crate::entry_id::EntryId;
use crate::interest_filter::InterestFilter;
use crate::name::Name;
use log::*;
use std::sync::Arc;

pub struct InterestFilterEntry<F> {
    id: EntryId,
    filter: InterestFilter,
    on_interest: F,
}

impl<F> InterestFilterEntry<F> {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn filter(&self) -> &InterestFilter {
        &self.filter
    }

    pub fn on_interest(&self) -> &F {
        &self.on_interest
    }
}

/// Interest filters and the callbacks that receive matching incoming interests. `F` is the callback type.
pub struct InterestFilterTable<F> {
    table: Vec<Arc<InterestFilterEntry<F>>>,
}

impl<F> Default for InterestFilterTable<F> {
    fn default() -> Self {
        Self { table: Vec::new() }
    }
}

impl<F> InterestFilterTable<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn set_interest_filter(&mut self, id: EntryId, filter: InterestFilter, on_interest: F) {
        self.table.push(Arc::new(InterestFilterEntry { id, filter, on_interest }));
    }

    /// All entries whose filter matches `name`, in the order they were set. The returned handles stay valid even if
    /// the table is modified while they are being used.
    pub fn matching_filters(&self, name: &Name) -> Vec<Arc<InterestFilterEntry<F>>> {
        self.table.iter().filter(|e| e.filter.matches_name(name)).cloned().collect()
    }

    /// Remove every entry with the given id. If there is none, this does nothing.
    pub fn unset_interest_filter(&mut self, id: EntryId) {
        let before = self.table.len();
        self.table.retain(|e| e.id != id);
        if self.table.len() == before {
            debug!("unset_interest_filter: Didn't find interest filter id {id}");
        }
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
