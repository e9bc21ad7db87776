use crate::entry_id::EntryId;
use crate::name::Name;
use log::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredPrefix {
    pub id: EntryId,
    pub prefix: Name,
    /// The interest filter that was installed along with this registration, if any.
    pub related_interest_filter_id: Option<EntryId>,
}

/// Prefixes that have been registered with the forwarder.
#[derive(Default)]
pub struct RegisteredPrefixTable {
    table: Vec<RegisteredPrefix>,
}

impl RegisteredPrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn add(&mut self, id: EntryId, prefix: Name, related_interest_filter_id: Option<EntryId>) {
        self.table.push(RegisteredPrefix { id, prefix, related_interest_filter_id });
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &Name> {
        self.table.iter().map(|e| &e.prefix)
    }

    /// Remove every registration with the given id and return the ids of the interest filters that were installed
    /// with them. The caller is responsible for unsetting those filters.
    pub fn remove_registered_prefix(&mut self, id: EntryId) -> Vec<EntryId> {
        let mut related = Vec::new();
        let before = self.table.len();
        self.table.retain(|e| {
            if e.id == id {
                related.extend(e.related_interest_filter_id);
                false
            } else {
                true
            }
        });
        if self.table.len() == before {
            debug!("remove_registered_prefix: Didn't find registered prefix id {id}");
        }
        related
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
