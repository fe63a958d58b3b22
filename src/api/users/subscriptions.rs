use crate::api::extract::AppQuery;
use crate::api::pagination::{Page, PageParams, Pagination};
use crate::api::representation::{users_with_recipes, UserWithRecipesResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::User;
use crate::schema::{subscriptions, users};
use axum::{
    extract::{OriginalUri, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecipesLimitParams {
    /// Maximum number of recipes embedded per user
    pub recipes_limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    tag = "users",
    params(PageParams, RecipesLimitParams),
    responses(
        (status = 200, description = "Followed users with their recipes", body = Page<UserWithRecipesResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    AppQuery(page): AppQuery<PageParams>,
    AppQuery(params): AppQuery<RecipesLimitParams>,
) -> Result<Json<Page<UserWithRecipesResponse>>, ApiError> {
    let pagination = Pagination::from_params(&page)?;
    let mut conn = get_conn!(pool);

    let rows: Vec<(User, i64)> = users::table
        .filter(
            users::id.eq_any(
                subscriptions::table
                    .filter(subscriptions::subscriber_id.eq(user.id))
                    .select(subscriptions::subscription_id),
            ),
        )
        .order(users::username)
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(&mut conn)?;

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let followed: Vec<User> = rows.into_iter().map(|(u, _)| u).collect();

    let results = users_with_recipes(
        &mut conn,
        Some(user.id),
        &followed,
        params.recipes_limit,
        &config.public_base_url,
    )?;

    Ok(Json(Page::new(
        results,
        count,
        pagination,
        &config.public_base_url,
        &uri,
    )?))
}
