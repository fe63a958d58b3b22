use crate::api::admin::contains_pattern;
use crate::api::extract::AppQuery;
use crate::api::pagination::{Page, PageParams, Pagination};
use crate::api::recipes::delete::delete_recipe_row;
use crate::api::recipes::payload::load_recipe;
use crate::api::ErrorResponse;
use crate::auth::StaffUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::schema::{recipes, users};
use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminRecipeSearch {
    /// Substring of the recipe name or author username
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, Queryable)]
pub struct AdminRecipeResponse {
    pub id: i64,
    pub name: String,
    pub author_id: i64,
    pub author_username: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
    /// How many users favorited the recipe
    pub favorited_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/admin/recipes",
    tag = "admin",
    params(AdminRecipeSearch, PageParams),
    responses(
        (status = 200, description = "Recipes with favorite counters", body = Page<AdminRecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Staff only", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn list_recipes(
    StaffUser(_staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    AppQuery(search): AppQuery<AdminRecipeSearch>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<Json<Page<AdminRecipeResponse>>, ApiError> {
    let pagination = Pagination::from_params(&page)?;
    let mut conn = get_conn!(pool);

    let mut query = recipes::table.inner_join(users::table).into_boxed();
    if let Some(term) = search.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        query = query.filter(recipes::name.ilike(pattern.clone()).or(users::username.ilike(pattern)));
    }

    let rows: Vec<(AdminRecipeResponse, i64)> = query
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .select((
            (
                recipes::id,
                recipes::name,
                recipes::author_id,
                users::username,
                recipes::cooking_time,
                recipes::created_at,
                sql::<BigInt>(
                    "(SELECT COUNT(*) FROM favorites WHERE favorites.recipe_id = recipes.id)",
                ),
            ),
            sql::<BigInt>("COUNT(*) OVER()"),
        ))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(&mut conn)?;

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let results = rows.into_iter().map(|(recipe, _)| recipe).collect();

    Ok(Json(Page::new(
        results,
        count,
        pagination,
        &config.public_base_url,
        &uri,
    )?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/recipes/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_recipe(
    StaffUser(staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    let recipe = load_recipe(&mut conn, id)?;

    delete_recipe_row(&mut conn, &recipe)?;
    tracing::info!(staff = staff.id, recipe_id = id, "recipe deleted by staff");

    Ok(StatusCode::NO_CONTENT)
}
