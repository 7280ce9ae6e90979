//! JSON REST API for the bug board.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`BoardStore`] and [`VoteStore`]. Every resource handler builds a
//! [`bugboard_core::context::RequestContext`] and runs the coarse gate before
//! touching the store, then the authorship gate once the record is loaded.
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bugboard_api::api_router(store.clone()))
//! ```

pub mod accounts;
pub mod comments;
pub mod error;
pub mod extract;
pub mod posts;
pub mod solutions;
pub mod tags;
pub mod token;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use bugboard_core::store::{BoardStore, VoteStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: BoardStore + VoteStore + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/logout", post(accounts::logout::<S>))
    .route("/auth/users/me", get(accounts::me::<S>))
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::retrieve::<S>)
        .put(posts::update::<S>)
        .patch(posts::partial_update::<S>)
        .delete(posts::delete::<S>),
    )
    .route("/posts/{id}/add_tag", post(posts::add_tag::<S>))
    .route("/posts/{id}/remove_tag", post(posts::remove_tag::<S>))
    .route("/posts/{id}/solutions", get(posts::solutions::<S>))
    // Solutions
    .route("/solutions", get(solutions::list::<S>).post(solutions::create::<S>))
    .route(
      "/solutions/{id}",
      get(solutions::retrieve::<S>)
        .put(solutions::update::<S>)
        .patch(solutions::partial_update::<S>)
        .delete(solutions::delete::<S>),
    )
    .route("/solutions/{id}/upvote", post(solutions::upvote::<S>))
    // Comments
    .route("/comments", get(comments::list::<S>).post(comments::create::<S>))
    .route(
      "/comments/{id}",
      get(comments::retrieve::<S>)
        .put(comments::update::<S>)
        .patch(comments::partial_update::<S>)
        .delete(comments::delete::<S>),
    )
    // Tags
    .route("/tags", get(tags::list::<S>).post(tags::create::<S>))
    .route(
      "/tags/{id}",
      get(tags::retrieve::<S>)
        .put(tags::update::<S>)
        .patch(tags::partial_update::<S>)
        .delete(tags::delete::<S>),
    )
    .with_state(store)
}
