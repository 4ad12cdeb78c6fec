//! User display identity.

use common::UserId;
use serde::{Deserialize, Serialize};

/// Display identity projected into single-order reads.
///
/// Only name and email are exposed; the full user record belongs to the
/// auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl UserProfile {
    /// Creates a profile for an existing user id.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}
