//! The acting principal behind a request.
//!
//! Identities are produced by the credential layer and are read-only here. A
//! request that carries no usable credential is represented by
//! [`Identity::Anonymous`]; whether that is acceptable is decided by the
//! policy table, never by the credential layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as seen by the authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id:  Uuid,
  pub username: String,
  pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
  #[default]
  Anonymous,
  Authenticated(Principal),
}

impl Identity {
  pub fn is_authenticated(&self) -> bool {
    matches!(self, Self::Authenticated(_))
  }

  /// Anonymous identities are never administrators.
  pub fn is_admin(&self) -> bool {
    self.principal().is_some_and(|p| p.is_admin)
  }

  pub fn principal(&self) -> Option<&Principal> {
    match self {
      Self::Anonymous => None,
      Self::Authenticated(p) => Some(p),
    }
  }

  pub fn user_id(&self) -> Option<Uuid> { self.principal().map(|p| p.user_id) }
}

impl From<Option<Principal>> for Identity {
  fn from(p: Option<Principal>) -> Self {
    p.map_or(Self::Anonymous, Self::Authenticated)
  }
}
