// Json and Query extractors that report shape mismatches as validation
// errors
//
// axum's stock extractors reject malformed bodies and query strings with
// plain-text responses. Every payload error on this API, including
// type-level ones like a non-numeric coordinate or an unknown role value,
// comes back as the same {"message", "issues"} JSON the field validators
// produce.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::api_error::{ApiError, ValidationIssue};

fn body_error(rejection: JsonRejection) -> ApiError {
    ApiError::validation(
        "Invalid payload",
        vec![ValidationIssue {
            path: "body".to_string(),
            message: rejection.body_text(),
        }],
    )
}

fn query_error(rejection: QueryRejection) -> ApiError {
    ApiError::validation(
        "Invalid query",
        vec![ValidationIssue {
            path: "query".to_string(),
            message: rejection.body_text(),
        }],
    )
}

/// Drop-in replacement for `axum::Json` with the API's 400 contract.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <axum::Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(body_error(rejection)),
        }
    }
}

// Keeps `Option<Json<T>>` working for routes where the body is optional
impl<S, T> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(Some(axum::Json(value))) => Ok(Some(Json(value))),
            Ok(None) => Ok(None),
            Err(rejection) => Err(body_error(rejection)),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Drop-in replacement for `axum::extract::Query` with the API's 400
/// contract.
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(query_error(rejection)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct SamplePayload {
        #[allow(dead_code)]
        lat: f64,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_validation_shape() {
        let result =
            <Json<SamplePayload> as FromRequest<()>>::from_request(json_request("{not json"), &())
                .await;

        let err = result.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        match err {
            ApiError::Validation { message, issues } => {
                assert_eq!(message, "Invalid payload");
                assert_eq!(issues[0].path, "body");
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_field_type_maps_to_validation_shape() {
        let result = <Json<SamplePayload> as FromRequest<()>>::from_request(
            json_request(r#"{"lat":"north"}"#),
            &(),
        )
        .await;

        let err = result.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let result = <Json<SamplePayload> as FromRequest<()>>::from_request(
            json_request(r#"{"lat":12.97}"#),
            &(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_optional_json_absent_body_is_none() {
        let req = axum::http::Request::builder()
            .method("POST")
            .body(Body::empty())
            .unwrap();

        let result =
            <Json<SamplePayload> as OptionalFromRequest<()>>::from_request(req, &()).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_non_numeric_query_param_maps_to_validation_shape() {
        let req = axum::http::Request::builder()
            .uri("/maps/reverse-geocode?lat=abc&lng=77.59")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let result = Query::<SamplePayload>::from_request_parts(&mut parts, &()).await;

        let err = result.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        match err {
            ApiError::Validation { message, issues } => {
                assert_eq!(message, "Invalid query");
                assert_eq!(issues[0].path, "query");
            },
            other => panic!("unexpected error: {}", other),
        }
    }
}
