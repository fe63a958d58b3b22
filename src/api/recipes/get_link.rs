use crate::api::recipes::payload::load_recipe;
use crate::api::ErrorResponse;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::schema::recipes;
use crate::short_link::{short_token, short_url};
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link/",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Short link to the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_recipe(&mut conn, id)?;

    let token = match recipe.short {
        Some(token) => token,
        None => {
            // Rows written without a token get one on first request
            let token = short_token(recipe.id, &recipe.name, &recipe.text);
            diesel::update(
                recipes::table
                    .find(recipe.id)
                    .filter(recipes::short.is_null()),
            )
            .set(recipes::short.eq(&token))
            .execute(&mut conn)?;
            token
        }
    };

    Ok(Json(ShortLinkResponse {
        short_link: short_url(&config.public_base_url, &token),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_uses_hyphenated_key() {
        let json = serde_json::to_value(ShortLinkResponse {
            short_link: "http://h/s/c721073e/".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"short-link": "http://h/s/c721073e/"}));
    }
}
