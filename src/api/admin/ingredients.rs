use crate::api::extract::AppJson;
use crate::api::ErrorResponse;
use crate::auth::StaffUser;
use crate::db::DbPool;
use crate::error::{unique_violation, ApiError, FieldErrors};
use crate::get_conn;
use crate::models::{Ingredient, NewIngredient};
use crate::schema::ingredients;
use crate::validation::check_ingredient;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/ingredients",
    tag = "admin",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 400, description = "Invalid or duplicate ingredient", body = FieldErrors),
        (status = 403, description = "Staff only", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create_ingredient(
    StaffUser(_staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    AppJson(req): AppJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    check_ingredient(&mut errors, &req.name, &req.measurement_unit);
    errors.into_result()?;

    let mut conn = get_conn!(pool);
    let ingredient: Ingredient = diesel::insert_into(ingredients::table)
        .values(&NewIngredient {
            name: req.name.trim().to_string(),
            measurement_unit: req.measurement_unit.trim().to_string(),
        })
        .returning(Ingredient::as_returning())
        .get_result(&mut conn)
        .map_err(|e| match unique_violation(&e) {
            Some(_) => ApiError::Validation(FieldErrors::single(
                FieldErrors::NON_FIELD,
                "An ingredient with this name and unit already exists.",
            )),
            None => ApiError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/ingredients/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 403, description = "Staff only", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_ingredient(
    StaffUser(_staff): StaffUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn!(pool);
    let deleted = diesel::delete(ingredients::table.find(id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(ApiError::not_found("Ingredient"));
    }
    Ok(StatusCode::NO_CONTENT)
}
