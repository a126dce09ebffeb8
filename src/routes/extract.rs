//! Drop-in replacements for axum's `Path`, `Query` and `Json` extractors.
//!
//! They reject with [`AppError`], so a bad id or body gets the usual
//! `{ ok: false, message }` response instead of axum's plain-text rejection.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

pub struct Path<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Path(value))
    }
}

pub struct Query<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Query(value))
    }
}

/// Request body extractor and response wrapper
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(request, state).await?;
        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn test_json_rejection_is_invalid_input() {
        let request = HttpRequest::builder()
            .method("POST")
            .header("content-type", "text/plain")
            .body(Body::from("progress=10"))
            .unwrap();

        let result = Json::<serde_json::Value>::from_request(request, &()).await;
        match result {
            Err(err @ AppError::InvalidInput(_)) => {
                assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST)
            }
            _ => panic!("expected InvalidInput"),
        }
    }

    #[tokio::test]
    async fn test_query_rejection_is_invalid_input() {
        #[derive(serde::Deserialize)]
        struct Ids {
            #[allow(dead_code)]
            id: Uuid,
        }

        let (mut parts, _) = HttpRequest::builder()
            .uri("/api/thing?id=nope")
            .body(())
            .unwrap()
            .into_parts();

        let result = Query::<Ids>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
