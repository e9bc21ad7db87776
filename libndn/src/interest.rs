use crate::name::{Name, NameComponent};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request for named data, qualified by selectors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    name: Name,
    min_suffix_components: Option<usize>,
    max_suffix_components: Option<usize>,
    exclude: Vec<NameComponent>,
    child_selector: Option<u8>,
    must_be_fresh: bool,
    interest_lifetime: Option<Duration>,
    nonce: Option<u32>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self { name, ..Default::default() }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn min_suffix_components(&self) -> Option<usize> {
        self.min_suffix_components
    }

    pub fn max_suffix_components(&self) -> Option<usize> {
        self.max_suffix_components
    }

    pub fn exclude(&self) -> &[NameComponent] {
        &self.exclude
    }

    pub fn child_selector(&self) -> Option<u8> {
        self.child_selector
    }

    pub fn must_be_fresh(&self) -> bool {
        self.must_be_fresh
    }

    pub fn interest_lifetime(&self) -> Option<Duration> {
        self.interest_lifetime
    }

    pub fn nonce(&self) -> Option<u32> {
        self.nonce
    }

    pub fn with_min_suffix_components(mut self, min: usize) -> Self {
        self.min_suffix_components = Some(min);
        self
    }

    pub fn with_max_suffix_components(mut self, max: usize) -> Self {
        self.max_suffix_components = Some(max);
        self
    }

    pub fn with_exclude(mut self, component: impl Into<NameComponent>) -> Self {
        self.exclude.push(component.into());
        self
    }

    pub fn with_child_selector(mut self, child_selector: u8) -> Self {
        self.child_selector = Some(child_selector);
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    pub fn with_interest_lifetime(mut self, lifetime: Duration) -> Self {
        self.interest_lifetime = Some(lifetime);
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Check whether `name` satisfies this interest's name and selectors.
    ///
    /// Suffix component counts include the implicit digest component, so a data name equal to the interest name has
    /// one suffix component.
    pub fn matches_name(&self, name: &Name) -> bool {
        if !self.name.is_prefix_of(name) {
            return false;
        }
        let suffix_components = name.len() + 1 - self.name.len();
        if let Some(min) = self.min_suffix_components {
            if suffix_components < min {
                return false;
            }
        }
        if let Some(max) = self.max_suffix_components {
            if suffix_components > max {
                return false;
            }
        }
        if !self.exclude.is_empty() {
            if let Some(next) = name.get(self.name.len()) {
                if self.exclude.contains(next) {
                    return false;
                }
            }
        }
        true
    }
}
