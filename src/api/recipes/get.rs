use crate::api::recipes::payload::load_recipe;
use crate::api::representation::{recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_recipe(&mut conn, id)?;

    let viewer_id = viewer.as_ref().map(|v| v.id);
    Ok(Json(recipe_response(
        &mut conn,
        viewer_id,
        &recipe,
        &config.public_base_url,
    )?))
}
