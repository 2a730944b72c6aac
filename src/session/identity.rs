//! Identity resolution: a logical session name maps deterministically to a
//! stable, opaque session id. The core never interprets the id beyond using
//! it as the registry and snapshot key.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Derive the stable id for a logical session name.
    ///
    /// Same name, same id — across processes and restarts.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        Self(hex::encode(digest))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        assert_eq!(
            SessionId::from_name("compliance_session_1"),
            SessionId::from_name("compliance_session_1")
        );
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(SessionId::from_name("a"), SessionId::from_name("b"));
    }

    #[test]
    fn id_is_lowercase_hex() {
        let id = SessionId::from_name("default");
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
