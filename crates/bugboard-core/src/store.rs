//! Storage abstractions consumed by the board.
//!
//! [`BoardStore`] is the durable record store for accounts, posts, solutions,
//! comments and tags. [`VoteStore`] is kept separate so the vote toggle
//! depends on nothing but vote storage. Backends (e.g.
//! `bugboard-store-sqlite`) implement both; higher layers depend only on these
//! traits.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`). Backend errors
//! convert into the shared [`crate::Error`] taxonomy.

use std::future::Future;

use uuid::Uuid;

use crate::{
  identity::Principal,
  record::{
    Comment, CommentPatch, NewComment, NewPost, NewSolution, NewTag, NewUser,
    Post, PostPatch, Solution, SolutionPatch, Tag, TagPatch, User, Vote,
  },
  vote::VoteState,
};

// ─── Record store ────────────────────────────────────────────────────────────

/// Abstraction over the board's durable record store.
///
/// `create_*` methods take the owner separately from the payload: the owner
/// is always the acting identity and is written exactly once. `update_*`
/// methods return `None` and `delete_*` methods return `false` when the
/// record does not exist.
pub trait BoardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. Fails with a conflict if the username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Record an issued token. Only its digest is ever stored.
  fn insert_token(
    &self,
    user_id: Uuid,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to the principal it was issued to.
  fn identity_for_token(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  /// Revoke every token issued to `user_id`.
  fn delete_tokens(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  fn create_post(
    &self,
    owner_id: Uuid,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  fn update_post(
    &self,
    post_id: Uuid,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Delete a post together with its solutions, their comments and votes.
  fn delete_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Attach a tag to a post. Attaching an already-attached tag is a no-op.
  fn add_post_tag(
    &self,
    post_id: Uuid,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Detach a tag from a post. Detaching an absent tag is a no-op.
  fn remove_post_tag(
    &self,
    post_id: Uuid,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_post_solutions(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Solution>, Self::Error>> + Send + '_;

  // ── Solutions ─────────────────────────────────────────────────────────

  fn create_solution(
    &self,
    owner_id: Uuid,
    input: NewSolution,
  ) -> impl Future<Output = Result<Solution, Self::Error>> + Send + '_;

  fn get_solution(
    &self,
    solution_id: Uuid,
  ) -> impl Future<Output = Result<Option<Solution>, Self::Error>> + Send + '_;

  fn list_solutions(
    &self,
  ) -> impl Future<Output = Result<Vec<Solution>, Self::Error>> + Send + '_;

  fn update_solution(
    &self,
    solution_id: Uuid,
    patch: SolutionPatch,
  ) -> impl Future<Output = Result<Option<Solution>, Self::Error>> + Send + '_;

  fn delete_solution(
    &self,
    solution_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn create_comment(
    &self,
    owner_id: Uuid,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn list_comments(
    &self,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  fn update_comment(
    &self,
    comment_id: Uuid,
    patch: CommentPatch,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn delete_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Persist a new tag. Fails with a conflict if the name or slug is taken.
  fn create_tag(
    &self,
    input: NewTag,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  fn get_tag(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  fn update_tag(
    &self,
    tag_id: Uuid,
    patch: TagPatch,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  fn delete_tag(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Vote store ──────────────────────────────────────────────────────────────

/// Storage for the `(voter, solution)` uniqueness slot.
pub trait VoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  fn find_vote(
    &self,
    voter_id: Uuid,
    solution_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// Atomically delete the vote if present, otherwise create it, and report
  /// the resulting state.
  ///
  /// Implementations must execute this as a single conditional write (one
  /// transaction or equivalent) and must never leave two votes for the same
  /// pair, whatever the interleaving of concurrent callers.
  fn toggle_vote(
    &self,
    voter_id: Uuid,
    solution_id: Uuid,
  ) -> impl Future<Output = Result<VoteState, Self::Error>> + Send + '_;
}
