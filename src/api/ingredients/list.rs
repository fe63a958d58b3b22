use crate::api::extract::AppQuery;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::get_conn;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{extract::State, Json};
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

diesel::define_sql_function! {
    fn lower(x: Text) -> Text;
}

/// `LIKE` pattern matching values that start with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
    format!(
        "{}%",
        prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

/// Ingredients whose name starts with `prefix`, ignoring case. Compares
/// `lower(name)` so the expression index on it can serve the prefix scan.
pub fn search_ingredients(
    conn: &mut PgConnection,
    prefix: Option<&str>,
) -> QueryResult<Vec<Ingredient>> {
    let mut query = ingredients::table.into_boxed();
    if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
        query = query.filter(lower(ingredients::name).like(prefix_pattern(&prefix.to_lowercase())));
    }

    query
        .order((ingredients::name, ingredients::measurement_unit))
        .select(Ingredient::as_select())
        .load(conn)
}

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Ingredients sorted by name", body = Vec<Ingredient>)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    AppQuery(params): AppQuery<ListIngredientsParams>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let mut conn = get_conn!(pool);
    Ok(Json(search_ingredients(&mut conn, params.name.as_deref())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, test_conn};

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("sal"), "sal%");
        assert_eq!(prefix_pattern("50%_"), "50\\%\\_%");
    }

    #[test]
    fn test_search_is_case_insensitive_prefix() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let flour = fixtures::ingredient(&mut conn, "Qqsearch Flour", "g");
        fixtures::ingredient(&mut conn, "Qqsearch_x Milk", "ml");

        let found = search_ingredients(&mut conn, Some("qqSEARCH f")).unwrap();
        assert_eq!(found.iter().map(|i| i.id).collect::<Vec<_>>(), vec![flour.id]);

        // `_` is literal, not a single-character wildcard
        let found = search_ingredients(&mut conn, Some("qqsearch_")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Qqsearch_x Milk");

        assert!(search_ingredients(&mut conn, Some("flour")).unwrap().iter().all(|i| i.id != flour.id));
    }
}
