use crate::accounts::{create_account, NewAccount};
use crate::api::extract::AppJson;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Missing fields deserialize as empty strings and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "users",
    request_body(content = RegisterRequest, example = json!({
        "email": "cook@example.com",
        "username": "cook",
        "first_name": "Anna",
        "last_name": "Petrova",
        "password": "password"
    })),
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid or duplicate fields", body = FieldErrors)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn!(pool);

    let user = create_account(
        &mut conn,
        &NewAccount {
            email: &req.email,
            username: &req.username,
            first_name: &req.first_name,
            last_name: &req.last_name,
            password: &req.password,
        },
        false,
    )?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}
