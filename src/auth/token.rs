use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "shipway";
const SECRET_BYTES: usize = 16;
const SECRET_LENGTH: usize = SECRET_BYTES * 2;

/// Generates a new token with the format: shipway_<user_id>_<secret>
#[must_use]
pub fn generate_token(user_id: i64) -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    build_token(user_id, &hex::encode(bytes))
}

/// Digest stored in place of the raw token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[must_use]
fn build_token(user_id: i64, secret: &str) -> String {
    format!("{TOKEN_PREFIX}_{user_id}_{secret}")
}

/// Parses a token string and returns the user id it was issued to.
pub fn parse_token(token: &str) -> Result<i64> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let (user_id, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;

    let user_id: i64 = user_id.parse().map_err(|_| Error::InvalidTokenFormat)?;
    if user_id <= 0 {
        return Err(Error::InvalidTokenFormat);
    }
    if secret.len() != SECRET_LENGTH || !secret.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(user_id)
}
