use crate::api::extract::AppJson;
use crate::api::recipes::payload::{
    load_own_recipe, replace_ingredients, Mode, RecipeInput, RecipePayload,
};
use crate::api::representation::{recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{Recipe, RecipeChanges};
use crate::photos::{delete_photo, store_photo};
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

/// Handles both `PUT` and `PATCH`. The ingredient list is required and
/// replaces the old one entirely; other absent fields keep their values. The
/// short token is never recomputed.
#[utoipa::path(
    method(put, patch),
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation failed", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    AppJson(request): AppJson<RecipePayload>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = get_conn!(pool);
    let existing = load_own_recipe(&mut conn, id, user.id)?;
    let input = request.validate(&mut conn, Mode::Update)?;
    let recipe = apply_update(&mut conn, &existing, &input)?;

    tracing::info!(recipe_id = recipe.id, "recipe updated");

    Ok(Json(recipe_response(
        &mut conn,
        Some(user.id),
        &recipe,
        &config.public_base_url,
    )?))
}

/// Writes a validated update over `existing`. A new image replaces and
/// deletes the old photo.
pub fn apply_update(
    conn: &mut PgConnection,
    existing: &Recipe,
    input: &RecipeInput,
) -> Result<Recipe, ApiError> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let new_image_id = input
            .image
            .as_ref()
            .map(|image| store_photo(conn, existing.author_id, image))
            .transpose()?;

        let changes = RecipeChanges {
            name: input.name.as_deref(),
            image_id: new_image_id,
            text: input.text.as_deref(),
            cooking_time: input.cooking_time,
        };

        let recipe = if changes.is_empty() {
            existing.clone()
        } else {
            diesel::update(recipes::table.find(existing.id))
                .set(&changes)
                .returning(Recipe::as_returning())
                .get_result(conn)?
        };

        replace_ingredients(conn, recipe.id, &input.ingredients)?;

        if new_image_id.is_some() {
            delete_photo(conn, existing.image_id)?;
        }

        Ok(recipe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ingredients_in_recipe, photos};
    use crate::short_link::short_token;
    use crate::test_support::{fixtures, test_conn};
    use crate::validation::IngredientAmount;

    fn ingredient_ids(conn: &mut PgConnection, recipe_id: i64) -> Vec<i64> {
        ingredients_in_recipe::table
            .filter(ingredients_in_recipe::recipe_id.eq(recipe_id))
            .select(ingredients_in_recipe::ingredient_id)
            .load(conn)
            .unwrap()
    }

    #[test]
    fn test_update_keeps_short_token_and_replaces_ingredients() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let cook = fixtures::user(&mut conn, "update_cook");
        let salt = fixtures::ingredient(&mut conn, "Update test salt", "g");
        let pepper = fixtures::ingredient(&mut conn, "Update test pepper", "g");
        let created = fixtures::recipe(&mut conn, &cook, "Update soup", salt.id);

        let token = created.short.clone().expect("short token set on create");
        assert_eq!(token, short_token(created.id, &created.name, &created.text));

        let input = RecipeInput {
            ingredients: vec![IngredientAmount {
                id: pepper.id,
                amount: 3,
            }],
            name: Some("Renamed soup".to_string()),
            ..Default::default()
        };
        let updated = apply_update(&mut conn, &created, &input).unwrap();

        assert_eq!(updated.name, "Renamed soup");
        assert_eq!(updated.text, created.text);
        assert_eq!(updated.cooking_time, created.cooking_time);
        assert_eq!(updated.short.as_deref(), Some(token.as_str()));
        assert_eq!(ingredient_ids(&mut conn, created.id), vec![pepper.id]);
    }

    #[test]
    fn test_new_image_deletes_old_photo() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let cook = fixtures::user(&mut conn, "photo_cook");
        let salt = fixtures::ingredient(&mut conn, "Photo test salt", "g");
        let created = fixtures::recipe(&mut conn, &cook, "Photo soup", salt.id);

        let input = RecipeInput {
            ingredients: vec![IngredientAmount {
                id: salt.id,
                amount: 5,
            }],
            image: Some(fixtures::image()),
            ..Default::default()
        };
        let updated = apply_update(&mut conn, &created, &input).unwrap();

        assert_ne!(updated.image_id, created.image_id);
        let old: i64 = photos::table
            .find(created.image_id)
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(old, 0);
        assert_eq!(updated.short, created.short);
    }
}
