use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::Photo;
use crate::schema::photos;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Photo bytes never change under an id, so clients may cache forever.
const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";

#[utoipa::path(
    get,
    path = "/media/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Photo not found", body = ErrorResponse)
    )
)]
pub async fn get_media(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);

    let photo: Photo = photos::table
        .find(id)
        .select(Photo::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Photo"))?;

    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (header::CACHE_CONTROL, CACHE_FOREVER.to_string()),
        ],
        photo.data,
    ))
}
