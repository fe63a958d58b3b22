use crate::api::ErrorResponse;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::schema::recipes;
use crate::short_link::{recipe_page_url, SHORT_TOKEN_LENGTH};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/s/{token}/",
    tag = "recipes",
    params(
        ("token" = String, Path, description = "Short token issued by get-link")
    ),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
pub async fn follow_short_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if token.len() != SHORT_TOKEN_LENGTH {
        return Err(ApiError::not_found("Short link"));
    }

    let mut conn = get_conn!(pool);
    let recipe_id: i64 = recipes::table
        .filter(recipes::short.eq(&token))
        .select(recipes::id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Short link"))?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, recipe_page_url(&config.public_base_url, recipe_id))],
    ))
}
