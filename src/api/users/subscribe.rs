use crate::api::extract::AppQuery;
use crate::api::representation::{users_with_recipes, UserWithRecipesResponse};
use crate::api::users::subscriptions::RecipesLimitParams;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{unique_violation, ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{NewSubscription, User};
use crate::schema::{subscriptions, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

fn load_target(conn: &mut PgConnection, id: i64) -> Result<User, ApiError> {
    users::table
        .find(id)
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("User"))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User to follow"),
        RecipesLimitParams
    ),
    responses(
        (status = 201, description = "Subscribed", body = UserWithRecipesResponse),
        (status = 400, description = "Self-subscription or already subscribed", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    AppQuery(params): AppQuery<RecipesLimitParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);
    let target = load_target(&mut conn, id)?;

    if target.id == user.id {
        return Err(ApiError::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD,
            "You cannot subscribe to yourself.",
        )));
    }

    diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            subscriber_id: user.id,
            subscription_id: target.id,
        })
        .execute(&mut conn)
        .map_err(|e| match unique_violation(&e) {
            Some(_) => ApiError::Validation(FieldErrors::single(
                FieldErrors::NON_FIELD,
                "You are already subscribed to this user.",
            )),
            None => ApiError::from(e),
        })?;

    tracing::info!(subscriber = user.id, subscription = target.id, "subscribed");

    let mut responses = users_with_recipes(
        &mut conn,
        Some(user.id),
        std::slice::from_ref(&target),
        params.recipes_limit,
        &config.public_base_url,
    )?;
    let response = responses
        .pop()
        .ok_or_else(|| ApiError::Internal("subscription target vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User to unfollow")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = FieldErrors),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    let target = load_target(&mut conn, id)?;

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::subscriber_id.eq(user.id))
            .filter(subscriptions::subscription_id.eq(target.id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD,
            "You are not subscribed to this user.",
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
