use std::fmt;

use uuid::Uuid;

use super::errors::DomainError;

const MAX_SESSION_ID_LEN: usize = 100;

/// Opaque, client-persisted identifier partitioning carts, addresses and
/// estimates between anonymous shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidInput("session id is blank".to_string()));
        }
        if trimmed.len() > MAX_SESSION_ID_LEN {
            return Err(DomainError::InvalidInput(format!(
                "session id is longer than {MAX_SESSION_ID_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// A fresh `sid-<uuid>` identifier.
    pub fn generate() -> Self {
        Self(format!("sid-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
