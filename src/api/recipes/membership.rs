//! Favorite and shopping-cart toggles. Both are a (user, recipe) pair with a
//! unique constraint; they differ only in the table they write to.

use crate::api::recipes::payload::load_recipe;
use crate::api::representation::RecipeShort;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{unique_violation, ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{NewFavorite, NewShoppingListEntry};
use crate::schema::{favorites, shopping_lists};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::dsl::exists;
use diesel::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum List {
    Favorites,
    ShoppingCart,
}

impl List {
    fn already_added(self) -> ApiError {
        let message = match self {
            List::Favorites => "Recipe is already in favorites.",
            List::ShoppingCart => "Recipe is already in the shopping cart.",
        };
        ApiError::Validation(FieldErrors::single(FieldErrors::NON_FIELD, message))
    }

    fn not_present(self) -> ApiError {
        let message = match self {
            List::Favorites => "Recipe is not in favorites.",
            List::ShoppingCart => "Recipe is not in the shopping cart.",
        };
        ApiError::Validation(FieldErrors::single(FieldErrors::NON_FIELD, message))
    }

    pub fn contains(self, conn: &mut PgConnection, user_id: i64, recipe_id: i64) -> QueryResult<bool> {
        match self {
            List::Favorites => diesel::select(exists(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            ))
            .get_result(conn),
            List::ShoppingCart => diesel::select(exists(
                shopping_lists::table
                    .filter(shopping_lists::user_id.eq(user_id))
                    .filter(shopping_lists::recipe_id.eq(recipe_id)),
            ))
            .get_result(conn),
        }
    }

    fn insert(self, conn: &mut PgConnection, user_id: i64, recipe_id: i64) -> QueryResult<usize> {
        match self {
            List::Favorites => diesel::insert_into(favorites::table)
                .values(&NewFavorite { user_id, recipe_id })
                .execute(conn),
            List::ShoppingCart => diesel::insert_into(shopping_lists::table)
                .values(&NewShoppingListEntry { user_id, recipe_id })
                .execute(conn),
        }
    }

    fn remove(self, conn: &mut PgConnection, user_id: i64, recipe_id: i64) -> QueryResult<usize> {
        match self {
            List::Favorites => diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(conn),
            List::ShoppingCart => diesel::delete(
                shopping_lists::table
                    .filter(shopping_lists::user_id.eq(user_id))
                    .filter(shopping_lists::recipe_id.eq(recipe_id)),
            )
            .execute(conn),
        }
    }

    /// Adds the recipe to this list. A second add is rejected, including when
    /// a concurrent insert wins the race on the unique constraint.
    pub fn add(
        self,
        conn: &mut PgConnection,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), ApiError> {
        if self.contains(conn, user_id, recipe_id)? {
            return Err(self.already_added());
        }
        self.insert(conn, user_id, recipe_id)
            .map_err(|e| match unique_violation(&e) {
                Some(_) => self.already_added(),
                None => ApiError::from(e),
            })?;
        Ok(())
    }

    pub fn delete(
        self,
        conn: &mut PgConnection,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), ApiError> {
        match self.remove(conn, user_id, recipe_id)? {
            0 => Err(self.not_present()),
            _ => Ok(()),
        }
    }
}

async fn add_to(
    list: List,
    user_id: i64,
    pool: &DbPool,
    config: &Config,
    recipe_id: i64,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_recipe(&mut conn, recipe_id)?;
    list.add(&mut conn, user_id, recipe.id)?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeShort::new(&recipe, &config.public_base_url)),
    ))
}

async fn remove_from(
    list: List,
    user_id: i64,
    pool: &DbPool,
    recipe_id: i64,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_recipe(&mut conn, recipe_id)?;
    list.delete(&mut conn, user_id, recipe.id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShort),
        (status = 400, description = "Already in favorites", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_to(List::Favorites, user.id, &pool, &config, id).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    remove_from(List::Favorites, user.id, &pool, id).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = RecipeShort),
        (status = 400, description = "Already in the cart", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_to(List::ShoppingCart, user.id, &pool, &config, id).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Not in the cart", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    remove_from(List::ShoppingCart, user.id, &pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, test_conn};

    #[test]
    fn test_duplicate_and_missing_are_bad_requests() {
        for list in [List::Favorites, List::ShoppingCart] {
            assert_eq!(list.already_added().status(), StatusCode::BAD_REQUEST);
            assert_eq!(list.not_present().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_messages_name_the_list() {
        let ApiError::Validation(errors) = List::ShoppingCart.already_added() else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get(FieldErrors::NON_FIELD),
            Some(&["Recipe is already in the shopping cart.".to_string()][..])
        );
    }

    fn rows(conn: &mut PgConnection, list: List, user_id: i64, recipe_id: i64) -> i64 {
        match list {
            List::Favorites => favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq(recipe_id))
                .count()
                .get_result::<i64>(conn),
            List::ShoppingCart => shopping_lists::table
                .filter(shopping_lists::user_id.eq(user_id))
                .filter(shopping_lists::recipe_id.eq(recipe_id))
                .count()
                .get_result::<i64>(conn),
        }
        .unwrap()
    }

    #[test]
    fn test_add_twice_then_delete_twice() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let author = fixtures::user(&mut conn, "toggle_author");
        let reader = fixtures::user(&mut conn, "toggle_reader");
        let salt = fixtures::ingredient(&mut conn, "Toggle test salt", "g");
        let recipe = fixtures::recipe(&mut conn, &author, "Toggle soup", salt.id);

        for list in [List::Favorites, List::ShoppingCart] {
            list.add(&mut conn, reader.id, recipe.id).unwrap();
            let again = list.add(&mut conn, reader.id, recipe.id).unwrap_err();
            assert_eq!(again.status(), StatusCode::BAD_REQUEST);
            assert_eq!(rows(&mut conn, list, reader.id, recipe.id), 1);
            assert!(!list.contains(&mut conn, author.id, recipe.id).unwrap());

            list.delete(&mut conn, reader.id, recipe.id).unwrap();
            let again = list.delete(&mut conn, reader.id, recipe.id).unwrap_err();
            assert_eq!(again.status(), StatusCode::BAD_REQUEST);
            assert_eq!(rows(&mut conn, list, reader.id, recipe.id), 0);
        }
    }
}
