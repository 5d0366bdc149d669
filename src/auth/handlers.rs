use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        password::{hash_password, verify_dummy, verify_password},
        repo_types::NewUser,
    },
    error::{method_not_allowed, AppError, RepoError},
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register).fallback(method_not_allowed("POST")))
        .route("/auth/login", post(login).fallback(method_not_allowed("POST")))
        .route("/auth/logout-all", post(logout_all).fallback(method_not_allowed("POST")))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).fallback(method_not_allowed("GET, HEAD")))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if let Err(msg) = payload.normalize_and_validate() {
        warn!(reason = %msg, "invalid registration");
        return Err(AppError::Validation(msg));
    }

    if state.users.exists_by_email(&payload.email).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password, state.config.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Internal(e)
    })?;

    let draft = NewUser::new(payload.name, payload.email, hash);
    let user = match state.users.insert(draft).await {
        Ok(u) => u,
        Err(RepoError::DuplicateEmail) => {
            // lost a race with a concurrent registration
            warn!("email already registered");
            return Err(AppError::Conflict("Email already registered"));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    let token = state.jwt.mint_token(user.id, user.token_version)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload
        .normalize_and_validate()
        .map_err(AppError::Validation)?;

    let user = match state.users.get_by_email(&payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            verify_dummy(&payload.password, state.config.password);
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = %user.id, "verify_password failed");
        AppError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let token = state.jwt.mint_token(user.id, user.token_version)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(auth))]
pub async fn get_me(auth: AuthUser) -> Json<PublicUser> {
    Json(auth.0.into())
}

/// Revokes every token issued to the caller, including the one used here.
#[instrument(skip(state, auth), fields(user_id = %auth.id()))]
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    let version = state.users.bump_token_version(auth.id()).await?;
    info!(token_version = version, "tokens revoked");
    Ok(StatusCode::NO_CONTENT)
}
