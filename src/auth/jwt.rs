use std::sync::Arc;

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, TokenSubject},
    config::JwtConfig,
};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// HS256 signing and verification keys, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<KeysInner>,
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
                decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
                ttl: TimeDuration::hours(cfg.ttl_hours),
                validation,
            }),
        }
    }

    pub fn mint_token(&self, user_id: Uuid, token_version: i32) -> anyhow::Result<String> {
        self.mint_at(user_id, token_version, OffsetDateTime::now_utc())
    }

    pub(crate) fn mint_at(
        &self,
        user_id: Uuid,
        token_version: i32,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            user_id,
            token_version,
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.inner.ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.inner.encoding)
            .context("sign jwt")?;
        debug!(%user_id, token_version, "jwt signed");
        Ok(token)
    }

    /// Checks signature, algorithm and expiry.
    pub fn validate_token(&self, token: &str) -> anyhow::Result<TokenSubject> {
        let data = decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)
            .context("verify jwt")?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims.into())
    }
}
