pub mod redirect;

use crate::api::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new().route("/s/{token}", get(redirect::follow_short_link))
}

#[derive(OpenApi)]
#[openapi(paths(redirect::follow_short_link))]
pub struct ApiDoc;
