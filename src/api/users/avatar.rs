use crate::api::extract::AppJson;
use crate::api::representation::media_url;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::photos::{decode_field, delete_photo, store_photo};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// `data:image/<ext>;base64,...` URI
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "Missing or invalid image", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    AppJson(req): AppJson<AvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let payload = req
        .avatar
        .ok_or_else(|| ApiError::Validation(FieldErrors::single("avatar", "This field is required.")))?;
    let image = decode_field("avatar", &payload)?;

    let mut conn = get_conn!(pool);
    let photo_id = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let photo_id = store_photo(conn, user.id, &image)?;
        diesel::update(users::table.find(user.id))
            .set(users::avatar_id.eq(Some(photo_id)))
            .execute(conn)?;
        if let Some(old) = user.avatar_id {
            delete_photo(conn, old)?;
        }
        Ok(photo_id)
    })?;

    Ok(Json(AvatarResponse {
        avatar: media_url(&config.public_base_url, photo_id),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(users::table.find(user.id))
            .set(users::avatar_id.eq(None::<uuid::Uuid>))
            .execute(conn)?;
        if let Some(old) = user.avatar_id {
            delete_photo(conn, old)?;
        }
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}
