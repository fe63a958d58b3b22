pub mod admin;
pub mod auth;
pub mod extract;
pub mod ingredients;
pub mod media;
pub mod pagination;
pub mod recipes;
pub mod representation;
pub mod short_links;
pub mod users;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Router;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::config::Config;
use crate::db::DbPool;
use crate::error::FieldErrors;
use crate::models::Ingredient;

/// Application state shared across all handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Arc<Config>,
}

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// All routes. Paths are declared without trailing slashes; the server
/// strips them before routing.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/auth/token", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/ingredients", ingredients::router())
        .nest("/api/recipes", recipes::router())
        .nest("/api/admin", admin::router())
        .merge(media::router())
        .merge(short_links::router())
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram API"),
        components(schemas(ErrorResponse, FieldErrors, Ingredient))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "token_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        admin::ApiDoc::openapi(),
        media::ApiDoc::openapi(),
        short_links::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_contains_every_module() {
        let spec = openapi();
        for path in [
            "/api/auth/token/login/",
            "/api/users/",
            "/api/users/{id}/subscribe/",
            "/api/ingredients/",
            "/api/recipes/",
            "/api/recipes/{id}/get-link/",
            "/api/recipes/download_shopping_cart/",
            "/api/admin/users",
            "/media/{id}",
            "/s/{token}/",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_has_token_scheme() {
        let spec = openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("token_auth"));
    }
}
