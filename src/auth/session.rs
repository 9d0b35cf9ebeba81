//! Per-user bearer credentials: at most one live token row per user.

use chrono::{DateTime, Duration, Utc};

use super::token::{generate_token, hash_token};
use crate::error::{Error, Result, ResultExt};
use crate::store::{Field, Filter, Store};
use crate::types::{TokenUpdate, UserToken, timestamp_now};

#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expire_time: DateTime<Utc>,
}

/// Stores `token` for `user_id`, overwriting the user's existing row if any.
///
/// This is a read-then-write; two concurrent calls for the same user can
/// both miss the lookup and insert.
pub fn create_or_update(
    store: &dyn Store,
    user_id: i64,
    token: &str,
    expire_time: DateTime<Utc>,
) -> Result<()> {
    let clauses = Filter::new().eq(Field::UserId, user_id).into_clauses();
    let existing = store
        .find_token(&clauses)
        .op_err("get user token detail failed")?;

    match existing {
        None => {
            store
                .create_token(&UserToken {
                    id: 0,
                    user_id,
                    token_hash: hash_token(token),
                    expire_time,
                    created_at: timestamp_now(),
                })
                .op_err("user token create failed")?;
        }
        Some(row) => {
            let update = TokenUpdate {
                token_hash: Some(hash_token(token)),
                expire_time: Some(expire_time),
            };
            if !store
                .update_token(row.id, &update)
                .op_err("user token update failed")?
            {
                return Err(Error::Failed("user token update failed"));
            }
        }
    }
    Ok(())
}

/// Finds the row matching both `user_id` and `token`.
pub fn lookup(store: &dyn Store, user_id: i64, token: &str) -> Result<Option<UserToken>> {
    let clauses = Filter::new()
        .eq(Field::UserId, user_id)
        .text_eq(Field::TokenHash, &hash_token(token))
        .into_clauses();
    store.find_token(&clauses).op_err("get user token detail failed")
}

/// True when `token` is the credential currently stored for `user_id`.
///
/// Missing input returns false without touching the store. Expiry is not
/// checked here; request authentication enforces it.
pub fn validate_token(store: &dyn Store, user_id: i64, token: &str) -> bool {
    if user_id == 0 || token.is_empty() {
        return false;
    }
    matches!(lookup(store, user_id, token), Ok(Some(_)))
}

/// Revokes every credential held by `user_id`.
pub fn delete_by_user_id(store: &dyn Store, user_id: i64) -> Result<()> {
    if user_id == 0 {
        return Err(Error::bad_request("user_id can not be empty"));
    }
    let removed = store
        .delete_user_tokens(user_id)
        .op_err("token delete failed")?;
    tracing::info!(user_id, removed, "user tokens revoked");
    Ok(())
}

/// Generates a fresh token for `user_id` valid for `ttl`, replacing any previous one.
pub fn issue(store: &dyn Store, user_id: i64, ttl: Duration) -> Result<IssuedToken> {
    if user_id <= 0 {
        return Err(Error::bad_request("user_id can not be empty"));
    }
    let expire_time = timestamp_now()
        .checked_add_signed(ttl)
        .ok_or_else(|| Error::bad_request("token ttl out of range"))?;
    let token = generate_token(user_id);
    create_or_update(store, user_id, &token, expire_time)?;
    Ok(IssuedToken { token, expire_time })
}
