use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A named unit of content that satisfies matching interests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    name: Name,
    content: Vec<u8>,
    freshness_period: Option<Duration>,
}

impl Data {
    pub fn new(name: Name, content: impl Into<Vec<u8>>) -> Self {
        Self { name, content: content.into(), freshness_period: None }
    }

    pub fn with_freshness_period(mut self, period: Duration) -> Self {
        self.freshness_period = Some(period);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn freshness_period(&self) -> Option<Duration> {
        self.freshness_period
    }
}
