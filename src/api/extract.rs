//! Body and query extractors whose rejections use the API error format.
//!
//! A body or query string that does not deserialize is a 400 keyed by the
//! offending field, like every other validation failure.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::{ApiError, FieldErrors};

const REQUIRED: &str = "This field is required.";

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Turns a deserializer message such as `cooking_time: invalid value: ...`
/// or ``missing field `password` `` into field errors.
fn deserialize_errors(body_text: &str) -> FieldErrors {
    // Drop the rejection's own "Failed to deserialize ..." prefix
    let detail = body_text
        .split_once(": ")
        .map_or(body_text, |(_, detail)| detail);

    if let Some(field) = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return FieldErrors::single(field, REQUIRED);
    }

    match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => {
            FieldErrors::single(path, message)
        }
        _ => FieldErrors::single(FieldErrors::NON_FIELD, detail),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                ApiError::Validation(deserialize_errors(&err.body_text()))
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                ApiError::Validation(deserialize_errors(&err.body_text()))
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::login::LoginRequest;
    use crate::api::pagination::PageParams;
    use crate::api::recipes::payload::RecipePayload;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/recipes/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_error<T>(body: &str) -> ApiError
    where
        T: serde::de::DeserializeOwned + Send,
    {
        match AppJson::<T>::from_request(json_request(body), &()).await {
            Ok(_) => panic!("body should be rejected"),
            Err(err) => err,
        }
    }

    #[tokio::test]
    async fn test_out_of_range_number_is_field_error() {
        let err = json_error::<RecipePayload>(r#"{"name": "Soup", "cooking_time": 99999999999}"#).await;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ApiError::Validation(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.get("cooking_time").is_some());
    }

    #[tokio::test]
    async fn test_mistyped_nested_field_is_field_error() {
        let err = json_error::<RecipePayload>(r#"{"ingredients": [{"id": 1, "amount": "x"}]}"#).await;
        let ApiError::Validation(errors) = err else {
            panic!("expected field errors");
        };
        assert!(!errors.is_empty());
        assert!(errors.get(FieldErrors::NON_FIELD).is_none());
    }

    #[tokio::test]
    async fn test_missing_field_is_required() {
        let err = json_error::<LoginRequest>(r#"{"email": "cook@example.com"}"#).await;
        let ApiError::Validation(errors) = err else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("password"), Some(&[REQUIRED.to_string()][..]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = json_error::<RecipePayload>("{not json").await;
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mistyped_query_is_field_error() {
        let (mut parts, _) = Request::builder()
            .uri("/api/recipes/?page=abc")
            .body(())
            .unwrap()
            .into_parts();
        let err = match AppQuery::<PageParams>::from_request_parts(&mut parts, &()).await {
            Ok(_) => panic!("query should be rejected"),
            Err(err) => err,
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_message_without_path_is_non_field() {
        let errors = deserialize_errors("Failed to deserialize the JSON body into the target type: invalid type: null");
        assert!(errors.get(FieldErrors::NON_FIELD).is_some());
    }
}
