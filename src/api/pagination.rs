//! Page-number pagination shared by the recipe, user and subscription lists.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 6, max: 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn from_params(params: &PageParams) -> Result<Self, ApiError> {
        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::NotFound("Invalid page".to_string()));
        }
        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        // The offset must fit in a BIGINT
        if (page - 1).checked_mul(limit).is_none() {
            return Err(ApiError::NotFound("Invalid page".to_string()));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    /// Total number of matching items
    pub count: i64,
    /// Absolute URL of the next page, if any
    pub next: Option<String>,
    /// Absolute URL of the previous page, if any
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps one page of results. An empty page beyond the first is a 404.
    pub fn new(
        results: Vec<T>,
        count: i64,
        pagination: Pagination,
        base_url: &str,
        uri: &Uri,
    ) -> Result<Self, ApiError> {
        if results.is_empty() && pagination.page > 1 {
            return Err(ApiError::NotFound("Invalid page".to_string()));
        }

        let next = (pagination.offset() + (results.len() as i64) < count)
            .then(|| page_url(base_url, uri, pagination.page + 1));
        let previous = (pagination.page > 1).then(|| page_url(base_url, uri, pagination.page - 1));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

/// Absolute URL of `page` for the current request, keeping every other query
/// parameter. Page 1 is expressed by dropping the parameter.
pub fn page_url(base_url: &str, uri: &Uri, page: i64) -> String {
    let mut params: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .collect();

    let page_param = format!("page={page}");
    if page > 1 {
        params.push(&page_param);
    }

    let mut url = format!("{}{}", base_url.trim_end_matches('/'), uri.path());
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://foodgram.example";

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults_and_clamping() {
        let p = Pagination::from_params(&PageParams::default()).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 6 });
        assert_eq!(p.offset(), 0);

        let p = Pagination::from_params(&PageParams {
            page: Some(3),
            limit: Some(1000),
        })
        .unwrap();
        assert_eq!(p.limit, MAX_PAGE_SIZE);
        assert_eq!(p.offset(), 200);

        let p = Pagination::from_params(&PageParams {
            page: None,
            limit: Some(0),
        })
        .unwrap();
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_zero_page_is_not_found() {
        let err = Pagination::from_params(&PageParams {
            page: Some(0),
            limit: None,
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_huge_page_is_not_found() {
        for page in [i64::MAX, i64::MAX / 2] {
            let result = Pagination::from_params(&PageParams {
                page: Some(page),
                limit: None,
            });
            assert!(matches!(result, Err(ApiError::NotFound(_))), "page {page}");
        }

        let last = Pagination::from_params(&PageParams {
            page: Some(i64::MAX / MAX_PAGE_SIZE),
            limit: Some(MAX_PAGE_SIZE),
        })
        .unwrap();
        assert!(last.offset() > 0);
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let url = page_url(BASE, &uri("/api/recipes?author=3&page=2&limit=6"), 3);
        assert_eq!(url, "https://foodgram.example/api/recipes?author=3&limit=6&page=3");
    }

    #[test]
    fn test_page_url_first_page_drops_param() {
        let url = page_url(BASE, &uri("/api/users?page=2"), 1);
        assert_eq!(url, "https://foodgram.example/api/users");
    }

    #[test]
    fn test_page_links() {
        let pagination = Pagination { page: 2, limit: 2 };
        let page = Page::new(vec![3, 4], 5, pagination, BASE, &uri("/api/recipes?page=2&limit=2")).unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(
            page.next.as_deref(),
            Some("https://foodgram.example/api/recipes?limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("https://foodgram.example/api/recipes?limit=2")
        );

        let last = Page::new(vec![5], 5, Pagination { page: 3, limit: 2 }, BASE, &uri("/api/recipes")).unwrap();
        assert!(last.next.is_none());
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let result = Page::<i32>::new(vec![], 0, Pagination { page: 4, limit: 6 }, BASE, &uri("/api/recipes"));
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let empty = Page::<i32>::new(vec![], 0, Pagination { page: 1, limit: 6 }, BASE, &uri("/api/recipes")).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.next.is_none() && empty.previous.is_none());
    }
}
