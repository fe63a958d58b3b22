pub mod create;
pub mod delete;
pub mod download;
pub mod get;
pub mod get_link;
pub mod list;
pub mod membership;
pub mod payload;
pub mod update;

use crate::api::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/download_shopping_cart",
            get(download::download_shopping_cart),
        )
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/favorite",
            post(membership::add_favorite).delete(membership::remove_favorite),
        )
        .route(
            "/{id}/shopping_cart",
            post(membership::add_to_cart).delete(membership::remove_from_cart),
        )
        .route("/{id}/get-link", get(get_link::get_link))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        membership::add_favorite,
        membership::remove_favorite,
        membership::add_to_cart,
        membership::remove_from_cart,
        download::download_shopping_cart,
        get_link::get_link,
    ),
    components(schemas(
        payload::RecipePayload,
        crate::validation::IngredientAmount,
        crate::api::representation::RecipeResponse,
        crate::api::representation::RecipeIngredientResponse,
        crate::api::representation::RecipeShort,
        crate::api::representation::UserResponse,
        get_link::ShortLinkResponse,
    ))
)]
pub struct ApiDoc;
