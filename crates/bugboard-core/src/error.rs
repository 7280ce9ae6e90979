//! Error taxonomy shared by every layer of the board.
//!
//! Each variant maps to one externally visible status; the HTTP layer owns
//! that mapping, this crate only names the kinds.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication credentials were not provided")]
  Unauthenticated,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  InvalidInput(String),

  #[error("{0}")]
  Conflict(String),

  /// A transient backend failure. No partial state is left behind, so the
  /// client may retry the request as-is.
  #[error("store unavailable: {0}")]
  Unavailable(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// The stable, serialisable discriminant of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Unauthenticated,
  Forbidden,
  NotFound,
  InvalidInput,
  Conflict,
  Unavailable,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Unauthenticated => "unauthenticated",
      Self::Forbidden => "forbidden",
      Self::NotFound => "not_found",
      Self::InvalidInput => "invalid_input",
      Self::Conflict => "conflict",
      Self::Unavailable => "unavailable",
      Self::Internal => "internal",
    }
  }

  /// Whether the same request may succeed if simply retried.
  pub fn is_retryable(self) -> bool { matches!(self, Self::Unavailable) }
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthenticated => ErrorKind::Unauthenticated,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::Unavailable(_) => ErrorKind::Unavailable,
      Self::Internal(_) => ErrorKind::Internal,
    }
  }

  pub fn forbidden(reason: impl Into<String>) -> Self {
    Self::Forbidden(reason.into())
  }

  pub fn not_found(reason: impl Into<String>) -> Self {
    Self::NotFound(reason.into())
  }

  pub fn invalid_input(reason: impl Into<String>) -> Self {
    Self::InvalidInput(reason.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
