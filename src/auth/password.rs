use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Hashes `plain` with Argon2id. The PHC output carries its own salt and cost,
/// so verification does not need the config.
pub fn hash_password(plain: &str, cost: PasswordConfig) -> anyhow::Result<String> {
    let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
        .map_err(|e| {
            error!(error = %e, "argon2 params rejected");
            anyhow::anyhow!(e.to_string())
        })?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Runs a full verification against a fixed hash at the configured cost, so
/// an unknown account costs the same as a wrong password. Always `false`.
pub fn verify_dummy(plain: &str, cost: PasswordConfig) -> bool {
    let dummy = format!(
        "$argon2id$v=19$m={},t={},p={}$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        cost.memory_kib,
        cost.iterations,
        Params::DEFAULT_P_COST
    );
    let _ = verify_password(plain, &dummy);
    false
}

#[cfg(test)]
pub(crate) fn cheap_cost() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 256,
        iterations: 1,
    }
}
