//! The explicit per-request context handed to the permission gates.

use crate::{
  Result, guard,
  identity::Identity,
  policy::{self, Action, Decision, ResourceKind},
  record::Owned,
};

/// Who is acting, on what kind of resource, with which action.
///
/// Handlers build one of these per request and run the two gates through it:
/// [`RequestContext::authorize`] before loading anything, then
/// [`RequestContext::authorize_object`] once the target record is in hand.
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub identity: Identity,
  pub kind:     ResourceKind,
  pub action:   Action,
}

impl RequestContext {
  pub fn new(identity: Identity, kind: ResourceKind, action: Action) -> Self {
    Self { identity, kind, action }
  }

  /// Coarse gate.
  pub fn authorize(&self) -> Result<Decision> {
    policy::resolve(self.kind, self.action, &self.identity)
  }

  /// Fine gate. A no-op when `decision` carries no object check.
  pub fn authorize_object<R: Owned>(
    &self,
    decision: &Decision,
    resource: &R,
  ) -> Result<()> {
    debug_assert_eq!(R::KIND, self.kind);
    match decision.object_check {
      Some(check) => guard::check(check, resource, &self.identity),
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{Error, identity::Principal, record::Comment};

  fn comment_by(owner_id: Uuid) -> Comment {
    Comment {
      comment_id: Uuid::new_v4(),
      solution_id: Uuid::new_v4(),
      owner_id,
      description: "same here".into(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn both_gates_in_order() {
    let principal = Principal { user_id: Uuid::new_v4(), username: "u".into(), is_admin: false };
    let ctx = RequestContext::new(
      Identity::Authenticated(principal.clone()),
      ResourceKind::Comment,
      Action::Delete,
    );
    let decision = ctx.authorize().unwrap();

    assert!(ctx.authorize_object(&decision, &comment_by(principal.user_id)).is_ok());
    assert!(matches!(
      ctx.authorize_object(&decision, &comment_by(Uuid::new_v4())),
      Err(Error::Forbidden(_))
    ));
  }

  #[test]
  fn reads_skip_the_object_gate() {
    let ctx = RequestContext::new(Identity::Anonymous, ResourceKind::Comment, Action::Retrieve);
    let decision = ctx.authorize().unwrap();
    assert!(ctx.authorize_object(&decision, &comment_by(Uuid::new_v4())).is_ok());
  }
}
