use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Credentials presented to a backend during authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Location of the backend (auth URL or storage root).
    pub endpoint: String,
    pub tenant: String,
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        tenant: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            tenant: tenant.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Build credentials from an identity of the form `<tenant>:<username>`.
    ///
    /// Both halves must be non-empty. Anything after the first `:` belongs
    /// to the username.
    pub fn from_identity(
        endpoint: impl Into<String>,
        identity: &str,
        secret: impl Into<String>,
    ) -> StoreResult<Self> {
        let (tenant, username) = identity
            .split_once(':')
            .filter(|(t, u)| !t.is_empty() && !u.is_empty())
            .ok_or_else(|| StoreError::InvalidIdentity(identity.to_string()))?;
        Ok(Self::new(endpoint, tenant, username, secret))
    }

    /// The `<tenant>:<username>` identity string.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.tenant, self.username)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
