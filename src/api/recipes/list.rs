use crate::api::extract::AppQuery;
use crate::api::pagination::{Page, PageParams, Pagination};
use crate::api::representation::{recipe_responses, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, FieldErrors};
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{favorites, recipes, shopping_lists};
use crate::validation::parse_flag;
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
pub struct RecipeFilters {
    /// Only recipes by this author
    pub author: Option<i64>,
    /// `1`/`true` limits to the caller's favorites
    pub is_favorited: Option<String>,
    /// `1`/`true` limits to the caller's shopping cart
    pub is_in_shopping_cart: Option<String>,
}

/// Parsed filters. Membership flags are only set when the caller is known
/// and asked for them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedFilters {
    pub author: Option<i64>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

pub fn parse_filters(filters: &RecipeFilters, viewer: Option<i64>) -> Result<ParsedFilters, ApiError> {
    let mut errors = FieldErrors::new();
    let mut flag = |field: &str, raw: Option<&str>| -> bool {
        match raw.map(parse_flag) {
            Some(Some(value)) => value,
            Some(None) => {
                errors.add(field, "Expected one of 1, 0, true, false.");
                false
            }
            None => false,
        }
    };
    let favorited = flag("is_favorited", filters.is_favorited.as_deref());
    let in_cart = flag("is_in_shopping_cart", filters.is_in_shopping_cart.as_deref());
    errors.into_result()?;

    Ok(ParsedFilters {
        author: filters.author,
        favorited_by: viewer.filter(|_| favorited),
        in_cart_of: viewer.filter(|_| in_cart),
    })
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    tag = "recipes",
    params(PageParams, RecipeFilters),
    responses(
        (status = 200, description = "Page of recipes, newest first", body = Page<RecipeResponse>),
        (status = 400, description = "Invalid filter value", body = FieldErrors),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    OriginalUri(uri): OriginalUri,
    AppQuery(page): AppQuery<PageParams>,
    AppQuery(filters): AppQuery<RecipeFilters>,
) -> Result<Json<Page<RecipeResponse>>, ApiError> {
    let viewer_id = viewer.as_ref().map(|v| v.id);
    let pagination = Pagination::from_params(&page)?;
    let filters = parse_filters(&filters, viewer_id)?;

    let mut conn = get_conn!(pool);
    let (recipes, count) = load_page(&mut conn, &filters, pagination)?;

    let results = recipe_responses(&mut conn, viewer_id, &recipes, &config.public_base_url)?;

    Ok(Json(Page::new(
        results,
        count,
        pagination,
        &config.public_base_url,
        &uri,
    )?))
}

/// One page of recipes matching `filters`, newest first, with the total
/// number of matches.
pub fn load_page(
    conn: &mut PgConnection,
    filters: &ParsedFilters,
    pagination: Pagination,
) -> QueryResult<(Vec<Recipe>, i64)> {
    let mut query = recipes::table.into_boxed();

    if let Some(author) = filters.author {
        query = query.filter(recipes::author_id.eq(author));
    }
    if let Some(user_id) = filters.favorited_by {
        query = query.filter(
            recipes::id.eq_any(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .select(favorites::recipe_id),
            ),
        );
    }
    if let Some(user_id) = filters.in_cart_of {
        query = query.filter(
            recipes::id.eq_any(
                shopping_lists::table
                    .filter(shopping_lists::user_id.eq(user_id))
                    .select(shopping_lists::recipe_id),
            ),
        );
    }

    // COUNT(*) OVER() computes the total count across all matching rows
    let rows: Vec<(Recipe, i64)> = query
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .select((Recipe::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(conn)?;

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    Ok((rows.into_iter().map(|(r, _)| r).collect(), count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::pagination::MAX_PAGE_SIZE;
    use crate::api::recipes::membership::List;
    use crate::test_support::{fixtures, test_conn};

    fn filters(fav: Option<&str>, cart: Option<&str>) -> RecipeFilters {
        RecipeFilters {
            author: None,
            is_favorited: fav.map(String::from),
            is_in_shopping_cart: cart.map(String::from),
        }
    }

    #[test]
    fn test_flags_apply_to_authenticated_viewer() {
        let parsed = parse_filters(&filters(Some("1"), Some("true")), Some(5)).unwrap();
        assert_eq!(parsed.favorited_by, Some(5));
        assert_eq!(parsed.in_cart_of, Some(5));
    }

    #[test]
    fn test_flags_ignored_for_anonymous() {
        let parsed = parse_filters(&filters(Some("1"), Some("1")), None).unwrap();
        assert_eq!(parsed, ParsedFilters::default());
    }

    #[test]
    fn test_false_flag_leaves_set_unfiltered() {
        let parsed = parse_filters(&filters(Some("0"), Some("false")), Some(5)).unwrap();
        assert!(parsed.favorited_by.is_none());
        assert!(parsed.in_cart_of.is_none());
    }

    #[test]
    fn test_invalid_flag_is_validation_error() {
        let err = parse_filters(&filters(Some("yes"), None), Some(5)).unwrap_err();
        match err {
            ApiError::Validation(errors) => assert!(errors.get("is_favorited").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_author_passed_through() {
        let parsed = parse_filters(
            &RecipeFilters {
                author: Some(9),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(parsed.author, Some(9));
    }

    fn ids(recipes: &[Recipe]) -> Vec<i64> {
        recipes.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_favorited_filter_returns_only_callers_favorites() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let anna = fixtures::user(&mut conn, "filter_anna");
        let boris = fixtures::user(&mut conn, "filter_boris");
        let salt = fixtures::ingredient(&mut conn, "Filter test salt", "g");
        let first = fixtures::recipe(&mut conn, &anna, "Filter one", salt.id);
        let second = fixtures::recipe(&mut conn, &anna, "Filter two", salt.id);
        let third = fixtures::recipe(&mut conn, &boris, "Filter three", salt.id);

        List::Favorites.add(&mut conn, boris.id, first.id).unwrap();
        List::Favorites.add(&mut conn, boris.id, third.id).unwrap();
        List::Favorites.add(&mut conn, anna.id, second.id).unwrap();
        let everything = Pagination { page: 1, limit: MAX_PAGE_SIZE };

        let favorited = RecipeFilters {
            is_favorited: Some("1".to_string()),
            ..Default::default()
        };
        let filters = parse_filters(&favorited, Some(boris.id)).unwrap();
        let (page, count) = load_page(&mut conn, &filters, everything).unwrap();
        assert_eq!(count, 2);
        assert_eq!(ids(&page), vec![third.id, first.id]);

        let filters = parse_filters(&favorited, Some(anna.id)).unwrap();
        let (page, count) = load_page(&mut conn, &filters, everything).unwrap();
        assert_eq!(count, 1);
        assert_eq!(ids(&page), vec![second.id]);

        // Anonymous callers get the unfiltered set
        let by_anna = RecipeFilters {
            author: Some(anna.id),
            is_favorited: Some("1".to_string()),
            ..Default::default()
        };
        let filters = parse_filters(&by_anna, None).unwrap();
        let (page, count) = load_page(&mut conn, &filters, everything).unwrap();
        assert_eq!(count, 2);
        assert_eq!(ids(&page), vec![second.id, first.id]);
    }

    #[test]
    fn test_page_count_covers_all_matches() {
        let Some(mut conn) = test_conn() else {
            return;
        };
        let cook = fixtures::user(&mut conn, "paging_cook");
        let salt = fixtures::ingredient(&mut conn, "Paging test salt", "g");
        for name in ["Paging one", "Paging two", "Paging three"] {
            fixtures::recipe(&mut conn, &cook, name, salt.id);
        }
        let filters = ParsedFilters {
            author: Some(cook.id),
            ..Default::default()
        };

        let (page, count) = load_page(&mut conn, &filters, Pagination { page: 2, limit: 2 }).unwrap();
        assert_eq!(count, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Paging one");
    }
}
