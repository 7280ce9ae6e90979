//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bugboard_core::{Error, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn kind(&self) -> ErrorKind { self.0.kind() }
}

/// Lift a backend error into the shared taxonomy.
pub(crate) fn store_err<E: Into<Error>>(e: E) -> ApiError { ApiError(e.into()) }

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let message = self.0.to_string();

    match kind {
      ErrorKind::Unauthenticated | ErrorKind::Forbidden => {
        tracing::debug!(kind = kind.as_str(), %message, "request denied");
      }
      ErrorKind::Unavailable => tracing::warn!(%message, "store unavailable"),
      ErrorKind::Internal => tracing::error!(%message, "internal error"),
      _ => {}
    }

    let mut res = (
      status_for(kind),
      Json(json!({ "error": message, "kind": kind.as_str() })),
    )
      .into_response();

    if kind == ErrorKind::Unauthenticated {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
    }
    if kind.is_retryable() {
      res
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }
    res
  }
}
