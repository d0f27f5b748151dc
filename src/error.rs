// 🚨 Error Taxonomy - Problem Details
// Every failure of a badge request ends up here exactly once, gets logged,
// and leaves as an `application/problem+json` body.

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type of every error body
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Default `type` member when no more specific category URI exists
pub const PROBLEM_TYPE_DEFAULT: &str = "about:blank";

// ============================================================================
// BADGE ERROR
// ============================================================================

/// Everything that can go wrong between the request path and the SVG.
#[derive(Debug, Error)]
pub enum BadgeError {
    /// Client input violates the accepted shape (parameters, identifier)
    #[error("{0}")]
    Validation(String),

    /// Registry unreachable, timed out, non-2xx, or not the expected envelope
    #[error("cannot contact remote url {url:?}: {reason}")]
    Upstream { url: String, reason: String },

    /// Registry answered, but the first entry does not describe an entity
    #[error("cannot parse registry entry: {reason}")]
    MalformedRecord { reason: String },

    /// Malformed record, attributed to the identifier that was asked for
    #[error("cannot find suitable data for {identifier:?}: {reason}")]
    NotFound { identifier: String, reason: String },

    /// Renderer could not produce an image
    #[error("cannot create svg: {0}")]
    Render(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),
}

impl BadgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            BadgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BadgeError::MalformedRecord { .. } | BadgeError::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            BadgeError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            BadgeError::Upstream { .. } | BadgeError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-class errors are the caller's fault; everything else is ours
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Log once, at classification time
    pub fn log(&self, instance: &str) {
        if self.is_client_error() {
            tracing::warn!(status = self.status().as_u16(), instance, error = %self, "badge request rejected");
        } else {
            tracing::error!(status = self.status().as_u16(), instance, error = %self, "badge request failed");
        }
    }

    /// Translate into the public problem payload.
    ///
    /// Only short, fixed descriptions leave the process: upstream failures
    /// name the URL that was tried, render failures say nothing more.
    pub fn to_problem(&self, instance: &str) -> Problem {
        let status = self.status();
        let detail = match self {
            BadgeError::Validation(message) => message.clone(),
            BadgeError::Upstream { url, .. } => format!("Cannot contact remote url: {:?}", url),
            BadgeError::MalformedRecord { .. } => "Cannot find suitable data".to_string(),
            BadgeError::NotFound { identifier, .. } => {
                format!("Cannot find suitable data for {:?}", identifier)
            }
            BadgeError::Render(_) => "Cannot create svg".to_string(),
            BadgeError::MethodNotAllowed(method) => format!("Method not supported: {}", method),
        };

        Problem::new(status, Some(detail)).with_instance(instance)
    }
}

// ============================================================================
// PROBLEM PAYLOAD
// ============================================================================

/// RFC 7807 problem body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: Option<String>,

    /// Request path, echoed back for traceability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, detail: Option<String>) -> Self {
        Problem {
            status: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            kind: PROBLEM_TYPE_DEFAULT.to_string(),
            detail,
            instance: None,
        }
    }

    pub fn with_instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.to_string());
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "cannot serialize problem body");
                return status.into_response();
            }
        };

        (status, [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)], body).into_response()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            BadgeError::Validation("bad".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BadgeError::NotFound {
                identifier: "missing".to_string(),
                reason: "no entries".to_string(),
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BadgeError::Upstream {
                url: "http://registry/x".to_string(),
                reason: "timeout".to_string(),
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BadgeError::Render("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BadgeError::MethodNotAllowed(Method::POST).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_upstream_problem_names_url_not_reason() {
        let err = BadgeError::Upstream {
            url: "https://dashboard.anpr.it/api/comune/016024".to_string(),
            reason: "error sending request: tcp connect error".to_string(),
        };
        let problem = err.to_problem("/016024");

        assert_eq!(problem.status, 500);
        assert_eq!(problem.title, "Internal Server Error");
        let detail = problem.detail.unwrap();
        assert!(detail.contains("https://dashboard.anpr.it/api/comune/016024"));
        assert!(!detail.contains("tcp connect"));
    }

    #[test]
    fn test_not_found_problem_echoes_identifier() {
        let err = BadgeError::NotFound {
            identifier: "missing".to_string(),
            reason: "no entries".to_string(),
        };
        let problem = err.to_problem("/missing");

        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert!(problem.detail.unwrap().contains("missing"));
        assert_eq!(problem.instance.as_deref(), Some("/missing"));
    }

    #[test]
    fn test_problem_serializes_type_member() {
        let problem = Problem::new(StatusCode::BAD_REQUEST, Some("nope".to_string()));
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["status"], 400);
        assert_eq!(json["title"], "Bad Request");
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn test_problem_response_content_type() {
        let response = Problem::new(StatusCode::NOT_FOUND, None).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );
    }
}
