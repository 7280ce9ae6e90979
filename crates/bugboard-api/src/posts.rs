//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Optional `?search=<text>` on the title |
//! | `POST`   | `/posts` | Body: `{"title","description"}`; owner is the caller |
//! | `GET`    | `/posts/:id` | 404 if not found |
//! | `PUT`    | `/posts/:id` | Author only; every field required |
//! | `PATCH`  | `/posts/:id` | Author only; any subset of fields |
//! | `DELETE` | `/posts/:id` | Author only |
//! | `POST`   | `/posts/:id/add_tag` | Author or admin; body `{"tag":"<id>"}` |
//! | `POST`   | `/posts/:id/remove_tag` | Author or admin; body `{"tag":"<id>"}` |
//! | `GET`    | `/posts/:id/solutions` | Solutions proposed for the post |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use bugboard_core::{
  Error,
  context::RequestContext,
  identity::Identity,
  policy::{Action, ResourceKind},
  record::{NewPost, Owned, Post, PostPatch, Solution},
  store::BoardStore,
};
use serde::Deserialize;

use crate::{
  error::{ApiError, store_err},
  extract::{Caller, not_found, parse_body, parse_id, require_text},
};

const KIND: ResourceKind = ResourceKind::Post;
const TITLE_MAX: usize = 100;

async fn load<S: BoardStore>(store: &S, raw_id: &str) -> Result<Post, ApiError> {
  let id = parse_id(KIND, raw_id)?;
  store
    .get_post(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, id)))
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// Full representation, used by `POST` and `PUT`.
#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub title:       String,
  pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct PostPatchBody {
  pub title:       Option<String>,
  pub description: Option<String>,
}

impl From<PostBody> for PostPatch {
  fn from(b: PostBody) -> Self {
    Self { title: Some(b.title), description: Some(b.description) }
  }
}

impl From<PostPatchBody> for PostPatch {
  fn from(b: PostPatchBody) -> Self {
    Self { title: b.title, description: b.description }
  }
}

fn validate(title: Option<&str>, description: Option<&str>) -> Result<(), ApiError> {
  if let Some(title) = title {
    require_text("title", title, Some(TITLE_MAX))?;
  }
  if let Some(description) = description {
    require_text("description", description, None)?;
  }
  Ok(())
}

// ─── List / retrieve ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Case-insensitive substring of the title.
  pub search: Option<String>,
}

/// `GET /posts[?search=<text>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::List).authorize()?;

  let mut posts = store.list_posts().await.map_err(store_err)?;
  if let Some(needle) = params.search.as_deref().map(str::to_lowercase)
    && !needle.is_empty()
  {
    posts.retain(|p| p.title.to_lowercase().contains(&needle));
  }
  Ok(Json(posts))
}

/// `GET /posts/:id`
pub async fn retrieve<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Retrieve).authorize()?;
  Ok(Json(load(&*store, &id).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /posts`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  body: Result<Json<PostBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore + 'static,
{
  let ctx = RequestContext::new(identity, KIND, Action::Create);
  ctx.authorize()?;
  let owner_id = ctx.identity.user_id().ok_or(Error::Unauthenticated)?;

  let body = parse_body(body)?;
  validate(Some(&body.title), Some(&body.description))?;

  let post = store
    .create_post(owner_id, NewPost { title: body.title, description: body.description })
    .await
    .map_err(store_err)?;
  tracing::debug!(post_id = %post.post_id, %owner_id, "post created");
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

async fn edit<S, B>(
  store: &S,
  identity: Identity,
  action: Action,
  raw_id: &str,
  body: Result<Json<B>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore,
  B: Into<PostPatch>,
{
  let ctx = RequestContext::new(identity, KIND, action);
  let decision = ctx.authorize()?;
  let post = load(store, raw_id).await?;
  ctx.authorize_object(&decision, &post)?;

  let patch: PostPatch = parse_body(body)?.into();
  validate(patch.title.as_deref(), patch.description.as_deref())?;

  let updated = store
    .update_post(post.post_id, patch)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, post.id())))?;
  Ok(Json(updated))
}

/// `PUT /posts/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<PostBody>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::Update, &id, body).await
}

/// `PATCH /posts/:id`
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<PostPatchBody>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::PartialUpdate, &id, body).await
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /posts/:id`: also removes the post's solutions, their comments
/// and votes.
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore + 'static,
{
  let ctx = RequestContext::new(identity, KIND, Action::Delete);
  let decision = ctx.authorize()?;
  let post = load(&*store, &id).await?;
  ctx.authorize_object(&decision, &post)?;

  if !store.delete_post(post.post_id).await.map_err(store_err)? {
    return Err(ApiError(not_found(KIND, post.id())));
  }
  tracing::info!(post_id = %post.post_id, "post deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TagRef {
  pub tag: Option<String>,
}

async fn retag<S: BoardStore>(
  store: &S,
  identity: Identity,
  action: Action,
  raw_id: &str,
  body: Result<Json<TagRef>, JsonRejection>,
) -> Result<Json<Post>, ApiError> {
  let ctx = RequestContext::new(identity, KIND, action);
  let decision = ctx.authorize()?;
  let post = load(store, raw_id).await?;
  ctx.authorize_object(&decision, &post)?;

  let raw_tag = parse_body(body)?
    .tag
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| ApiError(Error::invalid_input("tag id is required")))?;
  let tag_id = parse_id(ResourceKind::Tag, raw_tag.trim())?;
  let tag = store
    .get_tag(tag_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(ResourceKind::Tag, tag_id)))?;

  let applied = match action {
    Action::AddTag => store.add_post_tag(post.post_id, tag.tag_id).await,
    _ => store.remove_post_tag(post.post_id, tag.tag_id).await,
  };
  applied.map_err(store_err)?;
  tracing::debug!(post_id = %post.post_id, tag_id = %tag.tag_id, %action, "post tags changed");

  let post = load(store, raw_id).await?;
  Ok(Json(post))
}

/// `POST /posts/:id/add_tag`
pub async fn add_tag<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<TagRef>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore + 'static,
{
  retag(&*store, identity, Action::AddTag, &id, body).await
}

/// `POST /posts/:id/remove_tag`
pub async fn remove_tag<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<TagRef>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BoardStore + 'static,
{
  retag(&*store, identity, Action::RemoveTag, &id, body).await
}

// ─── Solutions ───────────────────────────────────────────────────────────────

/// `GET /posts/:id/solutions`
pub async fn solutions<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Json<Vec<Solution>>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Solutions).authorize()?;
  let post = load(&*store, &id).await?;
  let solutions = store
    .list_post_solutions(post.post_id)
    .await
    .map_err(store_err)?;
  Ok(Json(solutions))
}
