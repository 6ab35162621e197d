use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// An employee account. Owned by the account system; attendance only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}
