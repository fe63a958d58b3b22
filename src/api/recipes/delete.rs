use crate::api::recipes::payload::load_own_recipe;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::Recipe;
use crate::photos::delete_photo;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use std::sync::Arc;

/// Deletes a recipe together with its picture. Ingredient rows, favorites
/// and cart entries go with it through the foreign keys.
pub fn delete_recipe_row(conn: &mut PgConnection, recipe: &Recipe) -> QueryResult<()> {
    conn.transaction(|conn| {
        diesel::delete(recipes::table.find(recipe.id)).execute(conn)?;
        delete_photo(conn, recipe.image_id)?;
        Ok(())
    })
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_own_recipe(&mut conn, id, user.id)?;

    delete_recipe_row(&mut conn, &recipe)?;
    tracing::info!(recipe_id = recipe.id, "recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}
