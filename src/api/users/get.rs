use crate::api::representation::{user_response, UserResponse};
use crate::api::ErrorResponse;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut conn = get_conn!(pool);

    let user: User = users::table
        .find(id)
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let viewer_id = viewer.as_ref().map(|v| v.id);
    Ok(Json(user_response(
        &mut conn,
        viewer_id,
        &user,
        &config.public_base_url,
    )?))
}

#[utoipa::path(
    get,
    path = "/api/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn me(
    AuthUser(user): AuthUser,
    State(config): State<Arc<Config>>,
) -> Json<UserResponse> {
    Json(UserResponse::new(&user, false, &config.public_base_url))
}
