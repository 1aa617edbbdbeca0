// Stockroom - User accounts
// Passwords are stored as salted SHA-256 digests. The salt is per-user and
// random, so equal passwords never share a stored hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_salt: String,
    pub password_hash: String,
    pub role: Role,
}

impl User {
    /// New account with a fresh identity and a random salt.
    pub fn new(username: impl Into<String>, password: &str, role: Role) -> Self {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&salt, password);
        User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            password_salt: salt,
            password_hash,
            role,
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(&self.password_salt, password) == self.password_hash
    }
}

/// Hex digest of `salt:password`.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{salt}:{password}").as_bytes());
    format!("{:x}", hasher.finalize())
}
