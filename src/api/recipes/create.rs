use crate::api::extract::AppJson;
use crate::api::recipes::payload::{replace_ingredients, Mode, RecipeInput, RecipePayload};
use crate::api::representation::{recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{NewRecipe, Recipe};
use crate::photos::store_photo;
use crate::schema::recipes;
use crate::short_link::short_token;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes/",
    tag = "recipes",
    request_body(content = RecipePayload, example = json!({
        "ingredients": [{"id": 1123, "amount": 10}],
        "image": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABAgMAAABieywaAAAACVBMVEUAAAD///9fX1/S0ecCAAAACXBIWXMAAA7EAAAOxAGVKw4bAAAACklEQVQImWNoAAAAggCByxOyYQAAAABJRU5ErkJggg==",
        "name": "Borscht",
        "text": "Beetroot soup",
        "cooking_time": 90
    })),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failed", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Short token collision", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    AppJson(request): AppJson<RecipePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);
    let input = request.validate(&mut conn, Mode::Create)?;
    let recipe = insert_recipe(&mut conn, user.id, &input)?;

    tracing::info!(recipe_id = recipe.id, author = user.id, "recipe created");

    let response = recipe_response(&mut conn, Some(user.id), &recipe, &config.public_base_url)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Stores a validated recipe for `author_id`. The row is inserted, then its
/// short token is derived from the assigned id, in one transaction.
pub fn insert_recipe(
    conn: &mut PgConnection,
    author_id: i64,
    input: &RecipeInput,
) -> Result<Recipe, ApiError> {
    let (Some(name), Some(text), Some(cooking_time), Some(image)) = (
        input.name.as_deref(),
        input.text.as_deref(),
        input.cooking_time,
        input.image.as_ref(),
    ) else {
        return Err(ApiError::Internal(
            "validated recipe is missing fields".to_string(),
        ));
    };

    conn.transaction::<_, ApiError, _>(|conn| {
        let image_id = store_photo(conn, author_id, image)?;

        let created: Recipe = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                author_id,
                name,
                image_id,
                text,
                cooking_time,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        let token = short_token(created.id, &created.name, &created.text);
        let recipe: Recipe = diesel::update(recipes::table.find(created.id))
            .set(recipes::short.eq(&token))
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        replace_ingredients(conn, recipe.id, &input.ingredients)?;
        Ok(recipe)
    })
}
