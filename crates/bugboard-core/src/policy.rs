//! Coarse-grained permission resolution.
//!
//! [`resolve`] is a pure function of the resource kind, the action and the
//! shape of the acting identity (anonymous, authenticated, administrator). It
//! runs before any record is loaded. Whether the specific record may be
//! touched is decided afterwards by [`crate::guard`], driven by the
//! [`ObjectCheck`] carried in the returned [`Decision`].
//!
//! | kind     | list / retrieve | create        | update / delete        | custom                                   |
//! |----------|-----------------|---------------|------------------------|------------------------------------------|
//! | post     | public          | authenticated | authenticated + author | add/remove tag: author or admin; solutions: public |
//! | solution | public          | authenticated | authenticated + author | upvote: authenticated                    |
//! | comment  | public          | authenticated | authenticated + author | none                                     |
//! | tag      | public          | admin         | admin                  | none                                     |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, identity::Identity};

// ─── Vocabulary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
  Post,
  Solution,
  Comment,
  Tag,
}

impl ResourceKind {
  pub const ALL: [Self; 4] = [Self::Post, Self::Solution, Self::Comment, Self::Tag];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Post => "post",
      Self::Solution => "solution",
      Self::Comment => "comment",
      Self::Tag => "tag",
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Every action a request handler can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  List,
  Retrieve,
  Create,
  Update,
  PartialUpdate,
  Delete,
  /// Post: attach a tag.
  AddTag,
  /// Post: detach a tag.
  RemoveTag,
  /// Post: list the solutions proposed for it.
  Solutions,
  /// Solution: cast or retract the caller's vote.
  Upvote,
}

impl Action {
  pub const ALL: [Self; 10] = [
    Self::List,
    Self::Retrieve,
    Self::Create,
    Self::Update,
    Self::PartialUpdate,
    Self::Delete,
    Self::AddTag,
    Self::RemoveTag,
    Self::Solutions,
    Self::Upvote,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::List => "list",
      Self::Retrieve => "retrieve",
      Self::Create => "create",
      Self::Update => "update",
      Self::PartialUpdate => "partial_update",
      Self::Delete => "delete",
      Self::AddTag => "add_tag",
      Self::RemoveTag => "remove_tag",
      Self::Solutions => "solutions",
      Self::Upvote => "upvote",
    }
  }

  /// Actions that change state.
  pub fn is_mutating(self) -> bool {
    !matches!(self, Self::List | Self::Retrieve | Self::Solutions)
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// The minimal capability an identity needs before a record is even loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Requirement {
  Public,
  Authenticated,
  Admin,
}

/// The instance-level check still owed once the record is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCheck {
  /// Only the record's owner. Administrators get no bypass.
  Author,
  /// The record's owner or any administrator.
  AuthorOrAdmin,
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
  pub requirement:  Requirement,
  pub object_check: Option<ObjectCheck>,
}

impl Rule {
  const ADMIN: Self = Self { requirement: Requirement::Admin, object_check: None };
  const AUTHENTICATED: Self =
    Self { requirement: Requirement::Authenticated, object_check: None };
  const AUTHOR: Self = Self {
    requirement:  Requirement::Authenticated,
    object_check: Some(ObjectCheck::Author),
  };
  const AUTHOR_OR_ADMIN: Self = Self {
    requirement:  Requirement::Authenticated,
    object_check: Some(ObjectCheck::AuthorOrAdmin),
  };
  const PUBLIC: Self = Self { requirement: Requirement::Public, object_check: None };
}

/// Look up the rule for `(kind, action)`. `None` means the action does not
/// exist for that kind.
pub fn rule(kind: ResourceKind, action: Action) -> Option<Rule> {
  use Action::*;
  use ResourceKind::*;

  let rule = match (kind, action) {
    (_, List | Retrieve) => Rule::PUBLIC,
    (Post, Solutions) => Rule::PUBLIC,

    (Tag, Create | Update | PartialUpdate | Delete) => Rule::ADMIN,

    (Post | Solution | Comment, Create) => Rule::AUTHENTICATED,
    (Post | Solution | Comment, Update | PartialUpdate | Delete) => Rule::AUTHOR,

    // The admin bypass exists for tag curation only; plain edits stay
    // author-only.
    (Post, AddTag | RemoveTag) => Rule::AUTHOR_OR_ADMIN,

    (Solution, Upvote) => Rule::AUTHENTICATED,

    _ => return None,
  };
  Some(rule)
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// The outcome of a successful coarse check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
  pub kind:         ResourceKind,
  pub action:       Action,
  /// Set when the handler must run [`crate::guard::check`] on the loaded
  /// record before applying the effect.
  pub object_check: Option<ObjectCheck>,
}

impl Decision {
  pub fn requires_object_check(&self) -> bool { self.object_check.is_some() }
}

/// Resolve the coarse permission for `identity` performing `action` on a
/// resource of `kind`.
///
/// Fails with [`Error::Unauthenticated`] when the action needs any identity
/// and none was presented, and with [`Error::Forbidden`] when an
/// authenticated identity lacks the admin flag an action requires, or when
/// the action is not defined for `kind`.
pub fn resolve(
  kind: ResourceKind,
  action: Action,
  identity: &Identity,
) -> Result<Decision> {
  let rule = rule(kind, action).ok_or_else(|| {
    Error::forbidden(format!("action {action} is not available on {kind}"))
  })?;

  match rule.requirement {
    Requirement::Public => {}
    Requirement::Authenticated if !identity.is_authenticated() => {
      return Err(Error::Unauthenticated);
    }
    Requirement::Authenticated => {}
    Requirement::Admin if !identity.is_authenticated() => {
      return Err(Error::Unauthenticated);
    }
    Requirement::Admin if !identity.is_admin() => {
      return Err(Error::forbidden(format!(
        "only administrators may {action} a {kind}"
      )));
    }
    Requirement::Admin => {}
  }

  Ok(Decision { kind, action, object_check: rule.object_check })
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::identity::Principal;

  fn user() -> Identity {
    Identity::Authenticated(Principal {
      user_id:  Uuid::new_v4(),
      username: "alice".into(),
      is_admin: false,
    })
  }

  fn admin() -> Identity {
    Identity::Authenticated(Principal {
      user_id:  Uuid::new_v4(),
      username: "root".into(),
      is_admin: true,
    })
  }

  const WRITES: [Action; 4] =
    [Action::Create, Action::Update, Action::PartialUpdate, Action::Delete];

  #[test]
  fn reads_are_public_for_every_kind() {
    for kind in ResourceKind::ALL {
      for action in [Action::List, Action::Retrieve] {
        let d = resolve(kind, action, &Identity::Anonymous).unwrap();
        assert!(!d.requires_object_check(), "{kind} {action}");
      }
    }
    assert!(resolve(ResourceKind::Post, Action::Solutions, &Identity::Anonymous).is_ok());
  }

  #[test]
  fn anonymous_writes_are_unauthenticated_for_every_kind() {
    for kind in ResourceKind::ALL {
      for action in WRITES {
        let err = resolve(kind, action, &Identity::Anonymous).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated), "{kind} {action}: {err}");
      }
    }
  }

  #[test]
  fn owned_kinds_create_without_object_check() {
    for kind in [ResourceKind::Post, ResourceKind::Solution, ResourceKind::Comment] {
      let d = resolve(kind, Action::Create, &user()).unwrap();
      assert_eq!(d.object_check, None);
    }
  }

  #[test]
  fn owned_kinds_mutate_with_author_check() {
    for kind in [ResourceKind::Post, ResourceKind::Solution, ResourceKind::Comment] {
      for action in [Action::Update, Action::PartialUpdate, Action::Delete] {
        let d = resolve(kind, action, &user()).unwrap();
        assert_eq!(d.object_check, Some(ObjectCheck::Author), "{kind} {action}");

        // Admins clear the coarse gate too, but still owe the author check.
        let d = resolve(kind, action, &admin()).unwrap();
        assert_eq!(d.object_check, Some(ObjectCheck::Author), "{kind} {action}");
      }
    }
  }

  #[test]
  fn tag_writes_are_admin_only() {
    for action in WRITES {
      let err = resolve(ResourceKind::Tag, action, &user()).unwrap_err();
      assert!(matches!(err, Error::Forbidden(_)), "{action}: {err}");

      let d = resolve(ResourceKind::Tag, action, &admin()).unwrap();
      assert!(!d.requires_object_check());
    }
  }

  #[test]
  fn post_tag_actions_allow_author_or_admin() {
    for action in [Action::AddTag, Action::RemoveTag] {
      let d = resolve(ResourceKind::Post, action, &user()).unwrap();
      assert_eq!(d.object_check, Some(ObjectCheck::AuthorOrAdmin));
      assert!(matches!(
        resolve(ResourceKind::Post, action, &Identity::Anonymous),
        Err(Error::Unauthenticated)
      ));
    }
  }

  #[test]
  fn upvote_requires_authentication_only() {
    let d = resolve(ResourceKind::Solution, Action::Upvote, &user()).unwrap();
    assert!(!d.requires_object_check());
    assert!(matches!(
      resolve(ResourceKind::Solution, Action::Upvote, &Identity::Anonymous),
      Err(Error::Unauthenticated)
    ));
  }

  #[test]
  fn undefined_pairs_are_denied() {
    let undefined = [
      (ResourceKind::Post, Action::Upvote),
      (ResourceKind::Comment, Action::Upvote),
      (ResourceKind::Tag, Action::Upvote),
      (ResourceKind::Solution, Action::AddTag),
      (ResourceKind::Tag, Action::RemoveTag),
      (ResourceKind::Comment, Action::Solutions),
    ];
    for (kind, action) in undefined {
      assert!(rule(kind, action).is_none());
      assert!(matches!(resolve(kind, action, &admin()), Err(Error::Forbidden(_))));
    }
  }

  #[test]
  fn every_defined_mutation_needs_an_identity() {
    for kind in ResourceKind::ALL {
      for action in Action::ALL {
        if let Some(r) = rule(kind, action) {
          assert_eq!(
            r.requirement == Requirement::Public,
            !action.is_mutating(),
            "{kind} {action}"
          );
        }
      }
    }
  }
}
