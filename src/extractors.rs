use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::constants::DEFAULT_SESSION_ID;
use crate::response::AppError;
use crate::validation::is_valid_session_id;

pub const SESSION_HEADER: &str = "x-session-id";

/// A wrapper around `axum::Json<T>` that returns `AppError` on deserialization failure
/// instead of Axum's default plain-text rejection.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection_to_app_error(rejection)),
        }
    }
}

fn json_rejection_to_app_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            tracing::warn!(error = %e, "JSON data deserialization failed");
            AppError::bad_request("INVALID_REQUEST_BODY", "Request body has an invalid shape")
        }
        JsonRejection::JsonSyntaxError(e) => {
            tracing::warn!(error = %e, "JSON syntax parsing failed");
            AppError::bad_request("INVALID_REQUEST_BODY", "Request body is not valid JSON")
        }
        JsonRejection::MissingJsonContentType(e) => {
            tracing::warn!(error = %e, "Missing or invalid JSON Content-Type");
            AppError::bad_request("INVALID_REQUEST_BODY", "Expected a JSON request body")
        }
        JsonRejection::BytesRejection(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(error = %e, "Request body exceeds the frame limit");
            AppError::payload_too_large("Frame payload is too large")
        }
        JsonRejection::BytesRejection(e) => {
            tracing::warn!(error = %e, "Failed to read request body bytes");
            AppError::bad_request("INVALID_REQUEST_BODY", "Request body could not be read")
        }
        other => {
            tracing::warn!(error = %other, "Unexpected JSON body rejection");
            AppError::bad_request("INVALID_REQUEST_BODY", "Request body could not be read")
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

/// Tracking session of the caller: `x-session-id` header, then the
/// `session_id` query parameter, then the shared default session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an explicit id, e.g. one carried in a request body.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if !is_valid_session_id(trimmed) {
            return Err(AppError::bad_request(
                "INVALID_SESSION_ID",
                "session id must be 1-128 characters of letters, digits, '-' or '_'",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION_ID.to_string())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(SESSION_HEADER) {
            let raw = value.to_str().map_err(|_| {
                AppError::bad_request("INVALID_SESSION_ID", "session id header is not ASCII")
            })?;
            return SessionId::parse(raw);
        }

        let Query(query) = Query::<SessionQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_QUERY", "Malformed query string"))?;
        match query.session_id {
            Some(raw) => SessionId::parse(&raw),
            None => Ok(SessionId::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(req: Request<()>) -> Result<SessionId, AppError> {
        let (mut parts, _) = req.into_parts();
        SessionId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_wins_over_query() {
        let req = Request::builder()
            .uri("/tracking_status?session_id=from-query")
            .header(SESSION_HEADER, "from-header")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap().as_str(), "from-header");
    }

    #[tokio::test]
    async fn query_is_used_without_header() {
        let req = Request::builder()
            .uri("/tracking_status?session_id=exam_42")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap().as_str(), "exam_42");
    }

    #[tokio::test]
    async fn falls_back_to_default_session() {
        let req = Request::builder().uri("/get_logs").body(()).unwrap();
        assert_eq!(extract(req).await.unwrap(), SessionId::default());
    }

    #[tokio::test]
    async fn rejects_invalid_ids() {
        let req = Request::builder()
            .uri("/")
            .header(SESSION_HEADER, "../etc/passwd")
            .body(())
            .unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.code, "INVALID_SESSION_ID");
    }
}
