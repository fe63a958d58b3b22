use crate::api::extract::AppJson;
use crate::api::ErrorResponse;
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::schema::users;
use crate::validation::check_password;
use axum::{extract::State, http::StatusCode};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or blank new password", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn set_password(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    AppJson(req): AppJson<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let mut errors = FieldErrors::new();
    check_password(&mut errors, "new_password", &req.new_password);
    check_password(&mut errors, "current_password", &req.current_password);
    if errors.get("current_password").is_none()
        && !verify_password(&req.current_password, &user.password_hash)
    {
        errors.add("current_password", "Invalid password.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&req.new_password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    let mut conn = get_conn!(pool);
    diesel::update(users::table.find(user.id))
        .set(users::password_hash.eq(&password_hash))
        .execute(&mut conn)?;

    tracing::info!(user_id = user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
