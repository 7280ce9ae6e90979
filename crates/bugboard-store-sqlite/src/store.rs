//! The SQLite implementation of [`BoardStore`] and
//! [`VoteStore`].

use std::path::Path;

use bugboard_core::{
  identity::Principal,
  record::{
    Comment, CommentPatch, NewComment, NewPost, NewSolution, NewTag, NewUser,
    Post, PostPatch, Solution, SolutionPatch, Tag, TagPatch, User, Vote, slugify,
  },
  store::{BoardStore, VoteStore},
  vote::VoteState,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, POST_COLUMNS, RawComment, RawPost, RawPrincipal,
    RawSolution, RawTag, RawUser, RawVote, SOLUTION_COLUMNS, TAG_COLUMNS,
    USER_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A board store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store - useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_solution(&self, solution_id: Uuid) -> Result<Option<Solution>> {
    let id_str = encode_uuid(solution_id);

    let raw: Option<RawSolution> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SOLUTION_COLUMNS} FROM solutions s WHERE s.solution_id = ?1"),
              rusqlite::params![id_str],
              RawSolution::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSolution::into_solution).transpose()
  }

  async fn fetch_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(comment_id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
              rusqlite::params![id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn fetch_tag(&self, tag_id: Uuid) -> Result<Option<Tag>> {
    let id_str = encode_uuid(tag_id);

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TAG_COLUMNS} FROM tags WHERE tag_id = ?1"),
              rusqlite::params![id_str],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  /// Run a `DELETE ... WHERE <key> = ?1` and report whether a row went away.
  async fn delete_by_id(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id_str])?))
      .await?;
    Ok(removed > 0)
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

fn query_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Option<RawPost>> {
  let raw = conn
    .query_row(
      &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
      rusqlite::params![post_id],
      RawPost::from_row,
    )
    .optional()?;

  match raw {
    Some(mut post) => {
      post.tags = query_post_tags(conn, &post.post_id)?;
      Ok(Some(post))
    }
    None => Ok(None),
  }
}

fn query_post_tags(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<RawTag>> {
  let mut stmt = conn.prepare_cached(
    "SELECT t.tag_id, t.name, t.slug
     FROM tags t
     JOIN post_tags pt ON pt.tag_id = t.tag_id
     WHERE pt.post_id = ?1
     ORDER BY t.name",
  )?;
  let tags = stmt
    .query_map(rusqlite::params![post_id], RawTag::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(tags)
}

// ─── BoardStore impl ─────────────────────────────────────────────────────────

impl BoardStore for SqliteStore {
  type Error = crate::Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      is_admin:      input.is_admin,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let hash     = user.password_hash.clone();
    let is_admin = user.is_admin;
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![id_str, username, email, hash, is_admin, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user(&self, username: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
              rusqlite::params![username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn insert_token(&self, user_id: Uuid, token_hash: String) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn identity_for_token(&self, token_hash: String) -> Result<Option<Principal>> {
    let raw: Option<RawPrincipal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.user_id, u.username, u.is_admin
               FROM tokens t
               JOIN users u ON u.user_id = t.user_id
               WHERE t.token_hash = ?1",
              rusqlite::params![token_hash],
              |row| {
                Ok(RawPrincipal {
                  user_id:  row.get(0)?,
                  username: row.get(1)?,
                  is_admin: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPrincipal::into_principal).transpose()
  }

  async fn delete_tokens(&self, user_id: Uuid) -> Result<()> {
    self
      .delete_by_id("DELETE FROM tokens WHERE user_id = ?1", user_id)
      .await?;
    Ok(())
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, owner_id: Uuid, input: NewPost) -> Result<Post> {
    let now = Utc::now();
    let post = Post {
      post_id:     Uuid::new_v4(),
      owner_id,
      title:       input.title,
      description: input.description,
      tags:        Vec::new(),
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = encode_uuid(post.post_id);
    let owner_str   = encode_uuid(owner_id);
    let title       = post.title.clone();
    let description = post.description.clone();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO posts ({POST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"),
          rusqlite::params![id_str, owner_str, title, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(post_id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| Ok(query_post(conn, &id_str)?))
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at, rowid"
        ))?;
        let mut posts = stmt
          .query_map([], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for post in &mut posts {
          post.tags = query_post_tags(conn, &post.post_id)?;
        }
        Ok(posts)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn update_post(&self, post_id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
    let id_str = encode_uuid(post_id);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE posts
           SET title       = COALESCE(?2, title),
               description = COALESCE(?3, description),
               updated_at  = ?4
           WHERE post_id = ?1",
          rusqlite::params![id_str, patch.title, patch.description, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(query_post(conn, &id_str)?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
    self.delete_by_id("DELETE FROM posts WHERE post_id = ?1", post_id).await
  }

  async fn add_post_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<()> {
    let post_str = encode_uuid(post_id);
    let tag_str  = encode_uuid(tag_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2)
           ON CONFLICT (post_id, tag_id) DO NOTHING",
          rusqlite::params![post_str, tag_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_post_tag(&self, post_id: Uuid, tag_id: Uuid) -> Result<()> {
    let post_str = encode_uuid(post_id);
    let tag_str  = encode_uuid(tag_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM post_tags WHERE post_id = ?1 AND tag_id = ?2",
          rusqlite::params![post_str, tag_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_post_solutions(&self, post_id: Uuid) -> Result<Vec<Solution>> {
    let id_str = encode_uuid(post_id);

    let raws: Vec<RawSolution> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SOLUTION_COLUMNS} FROM solutions s
           WHERE s.post_id = ?1
           ORDER BY s.created_at, s.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawSolution::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSolution::into_solution).collect()
  }

  // ── Solutions ─────────────────────────────────────────────────────────────

  async fn create_solution(&self, owner_id: Uuid, input: NewSolution) -> Result<Solution> {
    let now = Utc::now();
    let solution = Solution {
      solution_id: Uuid::new_v4(),
      post_id:     input.post_id,
      owner_id,
      description: input.description,
      upvotes:     0,
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = encode_uuid(solution.solution_id);
    let post_str    = encode_uuid(solution.post_id);
    let owner_str   = encode_uuid(owner_id);
    let description = solution.description.clone();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO solutions
             (solution_id, post_id, owner_id, description, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, post_str, owner_str, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(solution)
  }

  async fn get_solution(&self, solution_id: Uuid) -> Result<Option<Solution>> {
    self.fetch_solution(solution_id).await
  }

  async fn list_solutions(&self) -> Result<Vec<Solution>> {
    let raws: Vec<RawSolution> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SOLUTION_COLUMNS} FROM solutions s ORDER BY s.created_at, s.rowid"
        ))?;
        let rows = stmt
          .query_map([], RawSolution::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSolution::into_solution).collect()
  }

  async fn update_solution(
    &self,
    solution_id: Uuid,
    patch: SolutionPatch,
  ) -> Result<Option<Solution>> {
    let id_str = encode_uuid(solution_id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE solutions
           SET description = COALESCE(?2, description),
               updated_at  = ?3
           WHERE solution_id = ?1",
          rusqlite::params![id_str, patch.description, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_solution(solution_id).await
  }

  async fn delete_solution(&self, solution_id: Uuid) -> Result<bool> {
    self
      .delete_by_id("DELETE FROM solutions WHERE solution_id = ?1", solution_id)
      .await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn create_comment(&self, owner_id: Uuid, input: NewComment) -> Result<Comment> {
    let now = Utc::now();
    let comment = Comment {
      comment_id:  Uuid::new_v4(),
      solution_id: input.solution_id,
      owner_id,
      description: input.description,
      created_at:  now,
      updated_at:  now,
    };

    let id_str       = encode_uuid(comment.comment_id);
    let solution_str = encode_uuid(comment.solution_id);
    let owner_str    = encode_uuid(owner_id);
    let description  = comment.description.clone();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO comments ({COMMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"),
          rusqlite::params![id_str, solution_str, owner_str, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    self.fetch_comment(comment_id).await
  }

  async fn list_comments(&self) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn update_comment(
    &self,
    comment_id: Uuid,
    patch: CommentPatch,
  ) -> Result<Option<Comment>> {
    let id_str = encode_uuid(comment_id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments
           SET description = COALESCE(?2, description),
               updated_at  = ?3
           WHERE comment_id = ?1",
          rusqlite::params![id_str, patch.description, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_comment(comment_id).await
  }

  async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
    self
      .delete_by_id("DELETE FROM comments WHERE comment_id = ?1", comment_id)
      .await
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn create_tag(&self, input: NewTag) -> Result<Tag> {
    let tag = Tag {
      tag_id: Uuid::new_v4(),
      slug:   slugify(&input.name),
      name:   input.name,
    };

    let id_str = encode_uuid(tag.tag_id);
    let name   = tag.name.clone();
    let slug   = tag.slug.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO tags ({TAG_COLUMNS}) VALUES (?1, ?2, ?3)"),
          rusqlite::params![id_str, name, slug],
        )?;
        Ok(())
      })
      .await?;

    Ok(tag)
  }

  async fn get_tag(&self, tag_id: Uuid) -> Result<Option<Tag>> {
    self.fetch_tag(tag_id).await
  }

  async fn list_tags(&self) -> Result<Vec<Tag>> {
    let raws: Vec<RawTag> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawTag::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  async fn update_tag(&self, tag_id: Uuid, patch: TagPatch) -> Result<Option<Tag>> {
    let Some(name) = patch.name else {
      return self.fetch_tag(tag_id).await;
    };

    let id_str = encode_uuid(tag_id);
    let slug   = slugify(&name);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tags SET name = ?2, slug = ?3 WHERE tag_id = ?1",
          rusqlite::params![id_str, name, slug],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_tag(tag_id).await
  }

  async fn delete_tag(&self, tag_id: Uuid) -> Result<bool> {
    self.delete_by_id("DELETE FROM tags WHERE tag_id = ?1", tag_id).await
  }
}

// ─── VoteStore impl ──────────────────────────────────────────────────────────

impl VoteStore for SqliteStore {
  type Error = crate::Error;

  async fn find_vote(&self, voter_id: Uuid, solution_id: Uuid) -> Result<Option<Vote>> {
    let voter_str    = encode_uuid(voter_id);
    let solution_str = encode_uuid(solution_id);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT voter_id, solution_id, created_at FROM votes
               WHERE voter_id = ?1 AND solution_id = ?2",
              rusqlite::params![voter_str, solution_str],
              |row| {
                Ok(RawVote {
                  voter_id:    row.get(0)?,
                  solution_id: row.get(1)?,
                  created_at:  row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn toggle_vote(&self, voter_id: Uuid, solution_id: Uuid) -> Result<VoteState> {
    let voter_str    = encode_uuid(voter_id);
    let solution_str = encode_uuid(solution_id);
    let at_str       = encode_dt(Utc::now());

    let state = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so other processes sharing
        // the file cannot interleave between the delete and the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
          "DELETE FROM votes WHERE voter_id = ?1 AND solution_id = ?2",
          rusqlite::params![voter_str, solution_str],
        )?;

        let state = if removed > 0 {
          VoteState::Unvoted
        } else {
          tx.execute(
            "INSERT INTO votes (voter_id, solution_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (voter_id, solution_id) DO NOTHING",
            rusqlite::params![voter_str, solution_str, at_str],
          )?;
          VoteState::Voted
        };

        tx.commit()?;
        Ok(state)
      })
      .await?;

    tracing::debug!(%voter_id, %solution_id, state = state.as_str(), "vote toggled");
    Ok(state)
  }
}
