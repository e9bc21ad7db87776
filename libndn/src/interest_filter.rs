use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Selects which incoming interests are delivered to an `on_interest` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestFilter {
    prefix: Name,
}

impl InterestFilter {
    pub fn new(prefix: Name) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn matches_name(&self, name: &Name) -> bool {
        self.prefix.is_prefix_of(name)
    }
}

impl From<Name> for InterestFilter {
    fn from(prefix: Name) -> Self {
        Self::new(prefix)
    }
}

impl Display for InterestFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix)
    }
}
