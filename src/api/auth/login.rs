use crate::api::extract::AppJson;
use crate::api::ErrorResponse;
use crate::auth::{create_session, verify_password};
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Validation(FieldErrors::single(
        FieldErrors::NON_FIELD,
        "Unable to log in with provided credentials.",
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "cook@example.com", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);

    let user: Option<User> = users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(req.email.trim())
                .sql(")"),
        )
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    let user = match user {
        Some(u) if u.is_active && verify_password(&req.password, &u.password_hash) => u,
        _ => return Err(invalid_credentials()),
    };

    let auth_token = create_session(&mut conn, user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok((StatusCode::OK, Json(LoginResponse { auth_token })))
}
