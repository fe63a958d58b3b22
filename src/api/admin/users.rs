use crate::api::admin::contains_pattern;
use crate::api::extract::{AppJson, AppQuery};
use crate::api::pagination::{Page, PageParams, Pagination};
use crate::api::ErrorResponse;
use crate::auth::StaffUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{User, UserFlagsChange};
use crate::schema::users;
use axum::{
    extract::{OriginalUri, Path, State},
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
pub struct AdminUserSearch {
    /// Substring of email or username
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub subscribers_count: i64,
    pub recipes_count: i64,
}

impl AdminUserResponse {
    fn new(user: User, subscribers_count: i64, recipes_count: i64) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            is_active: user.is_active,
            date_joined: user.date_joined,
            subscribers_count,
            recipes_count,
        }
    }
}

const SUBSCRIBERS_COUNT: &str =
    "(SELECT COUNT(*) FROM subscriptions WHERE subscriptions.subscription_id = users.id)";
const RECIPES_COUNT: &str = "(SELECT COUNT(*) FROM recipes WHERE recipes.author_id = users.id)";

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(AdminUserSearch, PageParams),
    responses(
        (status = 200, description = "Users with activity counters", body = Page<AdminUserResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Staff only", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn list_users(
    StaffUser(_staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    AppQuery(search): AppQuery<AdminUserSearch>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<Json<Page<AdminUserResponse>>, ApiError> {
    let pagination = Pagination::from_params(&page)?;
    let mut conn = get_conn!(pool);

    let mut query = users::table.into_boxed();
    if let Some(term) = search.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        query = query.filter(users::email.ilike(pattern.clone()).or(users::username.ilike(pattern)));
    }

    let rows: Vec<(User, i64, i64, i64)> = query
        .order(users::id)
        .select((
            User::as_select(),
            sql::<BigInt>(SUBSCRIBERS_COUNT),
            sql::<BigInt>(RECIPES_COUNT),
            sql::<BigInt>("COUNT(*) OVER()"),
        ))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(&mut conn)?;

    let count = rows.first().map(|row| row.3).unwrap_or(0);
    let results = rows
        .into_iter()
        .map(|(user, subscribers, recipes, _)| AdminUserResponse::new(user, subscribers, recipes))
        .collect();

    Ok(Json(Page::new(
        results,
        count,
        pagination,
        &config.public_base_url,
        &uri,
    )?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UserFlagsChange,
    responses(
        (status = 200, description = "Flags updated", body = AdminUserResponse),
        (status = 400, description = "Nothing to change", body = FieldErrors),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn update_user(
    StaffUser(staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
    AppJson(changes): AppJson<UserFlagsChange>,
) -> Result<Json<AdminUserResponse>, ApiError> {
    if changes.is_empty() {
        return Err(ApiError::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD,
            "Provide is_staff or is_active.",
        )));
    }

    let mut conn = get_conn!(pool);
    let updated = diesel::update(users::table.find(id))
        .set(&changes)
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(ApiError::not_found("User"));
    }

    let (user, subscribers, recipes): (User, i64, i64) = users::table
        .find(id)
        .select((
            User::as_select(),
            sql::<BigInt>(SUBSCRIBERS_COUNT),
            sql::<BigInt>(RECIPES_COUNT),
        ))
        .first(&mut conn)?;

    tracing::info!(
        staff = staff.id,
        user_id = id,
        is_staff = ?changes.is_staff,
        is_active = ?changes.is_active,
        "user flags changed"
    );

    Ok(Json(AdminUserResponse::new(user, subscribers, recipes)))
}
