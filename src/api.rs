// Stockroom - API wire types
// Shapes shared by the server handlers and the query wrapper. List endpoints
// return bare JSON arrays of the entity models; only the payloads that exist
// solely on the wire live here.

use serde::{Deserialize, Serialize};

use crate::schema::Role;

pub const TEST_MESSAGE: &str = "API is working correctly";

/// Body of every non-2xx response: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Payload of `GET /api/test`. The timestamp is RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResponse {
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account data exposed on the wire. Never carries salts or hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Payload of `POST /api/login`. Both fields are populated on success;
/// clients must treat either as optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub user: Option<UserInfo>,
}

/// Payload of `GET /api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
}
