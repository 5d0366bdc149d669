use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub token_version: i32,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
}

/// What a verified token vouches for. The caller still has to compare
/// `token_version` with the stored user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub token_version: i32,
}

impl From<Claims> for TokenSubject {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.user_id,
            token_version: c.token_version,
        }
    }
}
