//! Error type for `bugboard-store-sqlite`.

use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for bugboard_core::Error {
  fn from(e: Error) -> Self {
    use bugboard_core::Error as Core;

    let Error::Database(db) = &e else {
      return Core::Internal(e.to_string());
    };

    match db {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, msg)) => {
        let detail = msg.clone().unwrap_or_else(|| failure.to_string());
        match failure.code {
          ErrorCode::ConstraintViolation
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
          {
            Core::NotFound("referenced record does not exist".to_string())
          }
          ErrorCode::ConstraintViolation => Core::Conflict(detail),
          ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
            Core::Unavailable(detail)
          }
          _ => Core::Internal(detail),
        }
      }
      tokio_rusqlite::Error::ConnectionClosed => {
        Core::Unavailable("database connection closed".to_string())
      }
      _ => Core::Internal(e.to_string()),
    }
  }
}
