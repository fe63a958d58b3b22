use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;

use super::crypto::{generate_token, hash_token};

pub const SESSION_LIFETIME_DAYS: i64 = 30;

/// Creates a session for the user and returns the plaintext token. Only its
/// hash is stored.
pub fn create_session(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<String, diesel::result::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

/// The active user owning an unexpired session for `token`. Storage failures
/// are errors, not a missing session.
pub async fn get_user_from_token(pool: &DbPool, token: &str) -> Result<Option<User>, ApiError> {
    let mut conn = pool.get()?;
    let token_hash = hash_token(token);

    sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(&mut conn)
        .optional()
        .map_err(ApiError::from)
}

/// Deletes the session behind `token`. Returns the number of rows removed.
pub fn revoke_session(conn: &mut PgConnection, token: &str) -> QueryResult<usize> {
    diesel::delete(sessions::table.filter(sessions::token_hash.eq(hash_token(token)))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::r2d2::{ConnectionManager, Pool};
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_database_is_an_error() {
        let manager = ConnectionManager::<PgConnection>::new("postgres://nobody@127.0.0.1:1/foodgram");
        let pool = Pool::builder()
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);

        let result = get_user_from_token(&pool, "abc123").await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
