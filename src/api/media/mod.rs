pub mod get;

use crate::api::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new().route("/media/{id}", get(get::get_media))
}

#[derive(OpenApi)]
#[openapi(paths(get::get_media))]
pub struct ApiDoc;
