//! Request extractors shared by every handler.
//!
//! Nothing here rejects a request for lack of credentials: [`Caller`] always
//! yields an [`Identity`], and bodies are taken as
//! `Result<Json<T>, JsonRejection>` so that handlers decide when (and whether)
//! a malformed body matters. That lets the permission gates run first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{FromRequestParts, rejection::JsonRejection},
  http::{HeaderMap, header, request::Parts},
};
use bugboard_core::{Error, identity::Identity, policy::ResourceKind, store::BoardStore};
use uuid::Uuid;

use crate::{error::ApiError, token};

/// The identity behind the request, resolved from its bearer token.
///
/// A missing, malformed or unknown token is the anonymous identity. A store
/// failure during lookup is reported as unavailable rather than guessed at.
pub struct Caller(pub Identity);

/// Pull the presented key out of `Authorization: Token <key>` or
/// `Authorization: Bearer <key>`.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, key) = value.trim().split_once(' ')?;
  let key = key.trim();
  let accepted =
    scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
  (accepted && !key.is_empty()).then_some(key)
}

impl<S> FromRequestParts<Arc<S>> for Caller
where
  S: BoardStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(key) = presented_token(&parts.headers) else {
      return Ok(Caller(Identity::Anonymous));
    };
    let digest = token::digest(key);

    let principal = store.identity_for_token(digest).await.map_err(|e| {
      let cause: Error = e.into();
      ApiError(Error::Unavailable(format!("could not resolve credentials: {cause}")))
    })?;

    Ok(Caller(Identity::from(principal)))
  }
}

/// Unwrap a lazily extracted JSON body, turning any rejection into
/// [`Error::InvalidInput`].
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  body
    .map(|Json(value)| value)
    .map_err(|rejection| ApiError(Error::invalid_input(rejection.body_text())))
}

/// Parse a path id. An id that cannot name any record is simply not found.
pub fn parse_id(kind: ResourceKind, raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError(not_found(kind, raw)))
}

pub fn not_found(kind: ResourceKind, id: impl std::fmt::Display) -> Error {
  Error::not_found(format!("{kind} {id} not found"))
}

/// Reject blank text and text longer than `max` characters.
pub fn require_text(field: &str, value: &str, max: Option<usize>) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError(Error::invalid_input(format!("{field} may not be blank"))));
  }
  if let Some(max) = max
    && value.chars().count() > max
  {
    return Err(ApiError(Error::invalid_input(format!(
      "{field} may be at most {max} characters"
    ))));
  }
  Ok(())
}
