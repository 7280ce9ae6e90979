//! Board records: posts, solutions, comments, tags, votes and user accounts.
//!
//! Posts, solutions and comments each have exactly one owner. The owner is
//! stamped by the store at creation from the acting identity and is never part
//! of any caller-supplied payload, so no update can rewrite it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::ResourceKind;

// ─── Ownership ───────────────────────────────────────────────────────────────

/// A record with a single immutable owner.
pub trait Owned {
  const KIND: ResourceKind;

  fn id(&self) -> Uuid;
  fn owner_id(&self) -> Uuid;
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A reported bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:     Uuid,
  pub owner_id:    Uuid,
  pub title:       String,
  pub description: String,
  pub tags:        Vec<Tag>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::BoardStore::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:       String,
  pub description: String,
}

/// Fields that may change on an existing post; `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
}

// ─── Solution ────────────────────────────────────────────────────────────────

/// A proposed fix for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
  pub solution_id: Uuid,
  pub post_id:     Uuid,
  pub owner_id:    Uuid,
  pub description: String,
  /// Number of votes currently cast on this solution.
  pub upvotes:     u32,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSolution {
  pub post_id:     Uuid,
  pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct SolutionPatch {
  pub description: Option<String>,
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:  Uuid,
  pub solution_id: Uuid,
  pub owner_id:    Uuid,
  pub description: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub solution_id: Uuid,
  pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
  pub description: Option<String>,
}

// ─── Tag ─────────────────────────────────────────────────────────────────────

/// A label attached to any number of posts. Tags have no owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id: Uuid,
  pub name:   String,
  pub slug:   String,
}

#[derive(Debug, Clone)]
pub struct NewTag {
  pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct TagPatch {
  pub name: Option<String>,
}

/// Derive the URL slug for a tag name: lowercase ASCII alphanumerics, with
/// every run of other characters collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  for c in name.chars() {
    if c.is_ascii_alphanumeric() {
      slug.push(c.to_ascii_lowercase());
    } else if !slug.is_empty() && !slug.ends_with('-') {
      slug.push('-');
    }
  }
  while slug.ends_with('-') {
    slug.pop();
  }
  slug
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// One identity's upvote on one solution. Votes are created and deleted,
/// never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub voter_id:    Uuid,
  pub solution_id: Uuid,
  pub created_at:  DateTime<Utc>,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::BoardStore::create_user`]. `password_hash` is a
/// PHC string; hashing is the caller's job.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub is_admin:      bool,
}

// ─── Owned impls ─────────────────────────────────────────────────────────────

impl Owned for Post {
  const KIND: ResourceKind = ResourceKind::Post;

  fn id(&self) -> Uuid { self.post_id }

  fn owner_id(&self) -> Uuid { self.owner_id }
}

impl Owned for Solution {
  const KIND: ResourceKind = ResourceKind::Solution;

  fn id(&self) -> Uuid { self.solution_id }

  fn owner_id(&self) -> Uuid { self.owner_id }
}

impl Owned for Comment {
  const KIND: ResourceKind = ResourceKind::Comment;

  fn id(&self) -> Uuid { self.comment_id }

  fn owner_id(&self) -> Uuid { self.owner_id }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn slugify_collapses_separators() {
    assert_eq!(slugify("Memory Leak"), "memory-leak");
    assert_eq!(slugify("  UI / UX  "), "ui-ux");
    assert_eq!(slugify("bug"), "bug");
    assert_eq!(slugify("C++ -- build"), "c-build");
  }

  #[test]
  fn slugify_of_symbols_is_empty() {
    assert_eq!(slugify("!!!"), "");
  }

  #[test]
  fn owned_id_is_the_record_not_its_parent() {
    let now = Utc::now();
    let solution = Solution {
      solution_id: Uuid::new_v4(),
      post_id:     Uuid::new_v4(),
      owner_id:    Uuid::new_v4(),
      description: "bump the timeout".into(),
      upvotes:     0,
      created_at:  now,
      updated_at:  now,
    };
    assert_eq!(solution.id(), solution.solution_id);
    assert_eq!(solution.owner_id(), solution.owner_id);

    let comment = Comment {
      comment_id:  Uuid::new_v4(),
      solution_id: solution.solution_id,
      owner_id:    Uuid::new_v4(),
      description: "works for me".into(),
      created_at:  now,
      updated_at:  now,
    };
    assert_eq!(comment.id(), comment.comment_id);
    assert_ne!(comment.id(), comment.solution_id);
  }
}
