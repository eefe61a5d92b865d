use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Destination key of an object in the remote container.
///
/// Keys always use `/` as the separator, whatever the host path separator
/// is, and are never empty: the root of a synchronized tree has no key and
/// is never materialized as an object.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a key, rejecting the empty string.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::EmptyKey);
        }
        Ok(Self(key))
    }

    /// Append a relative, already `/`-separated path below this key.
    pub fn join(&self, relative: &str) -> Self {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return self.clone();
        }
        Self(format!("{}/{}", self.0, relative))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:?})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ObjectKey {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}
