pub mod avatar;
pub mod get;
pub mod list;
pub mod register;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use crate::api::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(register::register))
        .route("/me", get(get::me))
        .route(
            "/me/avatar",
            put(avatar::set_avatar).delete(avatar::delete_avatar),
        )
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/{id}", get(get::get_user))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_users,
        register::register,
        get::get_user,
        get::me,
        set_password::set_password,
        avatar::set_avatar,
        avatar::delete_avatar,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::list_subscriptions,
    ),
    components(schemas(
        crate::api::representation::UserResponse,
        crate::api::representation::UserWithRecipesResponse,
        crate::api::representation::RecipeShort,
        register::RegisterRequest,
        register::RegisterResponse,
        set_password::SetPasswordRequest,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
    ))
)]
pub struct ApiDoc;
