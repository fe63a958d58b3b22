//! Staff-only management endpoints. Every handler takes a [`StaffUser`], so
//! non-staff callers get 403.
//!
//! [`StaffUser`]: crate::auth::StaffUser

pub mod ingredients;
pub mod recipes;
pub mod users;

use crate::api::AppState;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/admin endpoints (mounted at /api/admin)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}", patch(users::update_user))
        .route("/recipes", get(recipes::list_recipes))
        .route("/recipes/{id}", delete(recipes::delete_recipe))
        .route("/ingredients", post(ingredients::create_ingredient))
        .route("/ingredients/{id}", delete(ingredients::delete_ingredient))
}

/// Case-insensitive substring pattern for `ILIKE`.
pub fn contains_pattern(term: &str) -> String {
    format!(
        "%{}%",
        term.replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::list_users,
        users::update_user,
        recipes::list_recipes,
        recipes::delete_recipe,
        ingredients::create_ingredient,
        ingredients::delete_ingredient,
    ),
    components(schemas(
        users::AdminUserResponse,
        crate::models::UserFlagsChange,
        recipes::AdminRecipeResponse,
        ingredients::CreateIngredientRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("anna"), "%anna%");
        assert_eq!(contains_pattern("a_b%"), "%a\\_b\\%%");
    }
}
