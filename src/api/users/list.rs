use crate::api::extract::AppQuery;
use crate::api::pagination::{Page, PageParams, Pagination};
use crate::api::representation::{user_responses, UserResponse};
use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{OriginalUri, State},
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = Page<UserResponse>),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
pub async fn list_users(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let pagination = Pagination::from_params(&params)?;
    let mut conn = get_conn!(pool);

    let rows: Vec<(User, i64)> = users::table
        .filter(users::is_active.eq(true))
        .order(users::id)
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(&mut conn)?;

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let users: Vec<User> = rows.into_iter().map(|(user, _)| user).collect();

    let viewer_id = viewer.as_ref().map(|v| v.id);
    let results = user_responses(&mut conn, viewer_id, &users, &config.public_base_url)?;

    Ok(Json(Page::new(
        results,
        count,
        pagination,
        &config.public_base_url,
        &uri,
    )?))
}
