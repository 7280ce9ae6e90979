//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Rows are first read into `Raw*` structs inside the
//! connection thread and decoded afterwards.

use bugboard_core::{
  identity::Principal,
  record::{Comment, Post, Solution, Tag, User, Vote},
};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, username, email, password_hash, is_admin, created_at";

pub const POST_COLUMNS: &str =
  "post_id, owner_id, title, description, created_at, updated_at";

/// Solutions are always read with their live vote count; select from
/// `solutions s`.
pub const SOLUTION_COLUMNS: &str = "s.solution_id, s.post_id, s.owner_id, \
   s.description, s.created_at, s.updated_at, \
   (SELECT COUNT(*) FROM votes v WHERE v.solution_id = s.solution_id)";

pub const COMMENT_COLUMNS: &str =
  "comment_id, solution_id, owner_id, description, created_at, updated_at";

pub const TAG_COLUMNS: &str = "tag_id, name, slug";

// ─── Users ───────────────────────────────────────────────────────────────────

pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      is_admin:      row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      is_admin:      self.is_admin,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// `(user_id, username, is_admin)` as joined from a token lookup.
pub struct RawPrincipal {
  pub user_id:  String,
  pub username: String,
  pub is_admin: bool,
}

impl RawPrincipal {
  pub fn into_principal(self) -> Result<Principal> {
    Ok(Principal {
      user_id:  decode_uuid(&self.user_id)?,
      username: self.username,
      is_admin: self.is_admin,
    })
  }
}

// ─── Posts ───────────────────────────────────────────────────────────────────

pub struct RawPost {
  pub post_id:     String,
  pub owner_id:    String,
  pub title:       String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
  pub tags:        Vec<RawTag>,
}

impl RawPost {
  /// Read the post columns; tags are attached separately.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:     row.get(0)?,
      owner_id:    row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
      tags:        Vec::new(),
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:     decode_uuid(&self.post_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      title:       self.title,
      description: self.description,
      tags:        self
        .tags
        .into_iter()
        .map(RawTag::into_tag)
        .collect::<Result<_>>()?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Solutions ───────────────────────────────────────────────────────────────

pub struct RawSolution {
  pub solution_id: String,
  pub post_id:     String,
  pub owner_id:    String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
  pub upvotes:     u32,
}

impl RawSolution {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      solution_id: row.get(0)?,
      post_id:     row.get(1)?,
      owner_id:    row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
      upvotes:     row.get(6)?,
    })
  }

  pub fn into_solution(self) -> Result<Solution> {
    Ok(Solution {
      solution_id: decode_uuid(&self.solution_id)?,
      post_id:     decode_uuid(&self.post_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      description: self.description,
      upvotes:     self.upvotes,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub struct RawComment {
  pub comment_id:  String,
  pub solution_id: String,
  pub owner_id:    String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:  row.get(0)?,
      solution_id: row.get(1)?,
      owner_id:    row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:  decode_uuid(&self.comment_id)?,
      solution_id: decode_uuid(&self.solution_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub struct RawTag {
  pub tag_id: String,
  pub name:   String,
  pub slug:   String,
}

impl RawTag {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { tag_id: row.get(0)?, name: row.get(1)?, slug: row.get(2)? })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag { tag_id: decode_uuid(&self.tag_id)?, name: self.name, slug: self.slug })
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

pub struct RawVote {
  pub voter_id:    String,
  pub solution_id: String,
  pub created_at:  String,
}

impl RawVote {
  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      voter_id:    decode_uuid(&self.voter_id)?,
      solution_id: decode_uuid(&self.solution_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
