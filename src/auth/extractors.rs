use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{auth::repo_types::User, error::AppError, state::AppState};

/// The authenticated caller. Extraction validates the bearer token and
/// re-checks its `token_version` against the stored user, so a handler that
/// takes this never runs for a revoked or forged token.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized("Invalid Authorization header"))?;

        let subject = state.jwt.validate_token(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthorized("Invalid or expired token")
        })?;

        let user = match state.users.get_by_id(subject.user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(user_id = %subject.user_id, "token for unknown user");
                return Err(AppError::Unauthorized("Invalid or expired token"));
            }
            Err(e) => {
                error!(error = %e, user_id = %subject.user_id, "user lookup failed");
                return Err(e.into());
            }
        };

        if user.token_version != subject.token_version {
            warn!(
                user_id = %user.id,
                token_version = subject.token_version,
                current = user.token_version,
                "revoked token"
            );
            return Err(AppError::Unauthorized("Invalid or expired token"));
        }

        Ok(AuthUser(user))
    }
}
