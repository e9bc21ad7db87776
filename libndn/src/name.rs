use crate::error::NameError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single component of a [`Name`]. Components are opaque byte strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameComponent(Vec<u8>);

impl NameComponent {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a single percent-escaped URI component.
    pub fn from_escaped(escaped: &str) -> Result<Self, NameError> {
        let bytes = escaped.as_bytes();
        let mut value = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = escaped
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .ok_or_else(|| NameError::InvalidEscape(escaped.to_string()))?;
                let byte = u8::from_str_radix(hex, 16).map_err(|_| NameError::InvalidEscape(escaped.to_string()))?;
                value.push(byte);
                i += 3;
            } else {
                value.push(bytes[i]);
                i += 1;
            }
        }
        Ok(Self(value))
    }

    fn is_unreserved(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
    }
}

impl From<&str> for NameComponent {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl Display for NameComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            if Self::is_unreserved(b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{b:02X}")?;
            }
        }
        Ok(())
    }
}

/// A hierarchical NDN name, e.g. `/example/videos/1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, component: impl Into<NameComponent>) -> Self {
        self.components.push(component.into());
        self
    }

    pub fn push(&mut self, component: impl Into<NameComponent>) {
        self.components.push(component.into());
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    /// The first `n` components of this name. If `n` exceeds the length, the whole name is returned.
    pub fn prefix(&self, n: usize) -> Name {
        let n = n.min(self.components.len());
        Name { components: self.components[..n].to_vec() }
    }

    /// True if every component of `self` matches the leading components of `other`. The empty name is a prefix of
    /// every name.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self.components.iter().zip(other.components.iter()).all(|(a, b)| a == b)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let uri = uri.trim();
        let path = match uri.find(':') {
            Some(i) if !uri[..i].contains('/') => {
                if &uri[..i] != "ndn" {
                    return Err(NameError::UnsupportedScheme(uri.to_string()));
                }
                &uri[i + 1..]
            }
            _ => uri,
        };
        // Skip an authority section, e.g. ndn://host/a/b
        let path = path.strip_prefix("//").map(|rest| rest.find('/').map(|i| &rest[i..]).unwrap_or("")).unwrap_or(path);
        let components = path
            .split('/')
            .filter(|c| !c.is_empty())
            .map(NameComponent::from_escaped)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Name { components })
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for c in &self.components {
            write!(f, "/{c}")?;
        }
        Ok(())
    }
}
