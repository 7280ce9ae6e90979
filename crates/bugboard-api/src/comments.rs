//! Handlers for `/comments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/comments` | |
//! | `POST`   | `/comments` | Body: `{"solution_id","description"}` |
//! | `GET`    | `/comments/:id` | 404 if not found |
//! | `PUT`    | `/comments/:id` | Author only; body `{"description"}` |
//! | `PATCH`  | `/comments/:id` | Author only |
//! | `DELETE` | `/comments/:id` | Author only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use bugboard_core::{
  Error,
  context::RequestContext,
  identity::Identity,
  policy::{Action, ResourceKind},
  record::{Comment, CommentPatch, NewComment, Owned},
  store::BoardStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, store_err},
  extract::{Caller, not_found, parse_body, parse_id, require_text},
};

const KIND: ResourceKind = ResourceKind::Comment;

async fn load<S: BoardStore>(store: &S, raw_id: &str) -> Result<Comment, ApiError> {
  let id = parse_id(KIND, raw_id)?;
  store
    .get_comment(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, id)))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub solution_id: Uuid,
  pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentPatchBody {
  pub description: Option<String>,
}

impl From<CommentBody> for CommentPatch {
  fn from(b: CommentBody) -> Self { Self { description: Some(b.description) } }
}

impl From<CommentPatchBody> for CommentPatch {
  fn from(b: CommentPatchBody) -> Self { Self { description: b.description } }
}

/// `GET /comments`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::List).authorize()?;
  Ok(Json(store.list_comments().await.map_err(store_err)?))
}

/// `GET /comments/:id`
pub async fn retrieve<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Json<Comment>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Retrieve).authorize()?;
  Ok(Json(load(&*store, &id).await?))
}

/// `POST /comments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore + 'static,
{
  let ctx = RequestContext::new(identity, KIND, Action::Create);
  ctx.authorize()?;
  let owner_id = ctx.identity.user_id().ok_or(Error::Unauthenticated)?;

  let body = parse_body(body)?;
  require_text("description", &body.description, None)?;

  let comment = store
    .create_comment(owner_id, NewComment {
      solution_id: body.solution_id,
      description: body.description,
    })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

async fn edit<S, B>(
  store: &S,
  identity: Identity,
  action: Action,
  raw_id: &str,
  body: Result<Json<B>, JsonRejection>,
) -> Result<Json<Comment>, ApiError>
where
  S: BoardStore,
  B: Into<CommentPatch>,
{
  let ctx = RequestContext::new(identity, KIND, action);
  let decision = ctx.authorize()?;
  let comment = load(store, raw_id).await?;
  ctx.authorize_object(&decision, &comment)?;

  let patch: CommentPatch = parse_body(body)?.into();
  if let Some(description) = &patch.description {
    require_text("description", description, None)?;
  }

  let updated = store
    .update_comment(comment.comment_id, patch)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, comment.id())))?;
  Ok(Json(updated))
}

/// `PUT /comments/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<CommentBody>, JsonRejection>,
) -> Result<Json<Comment>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::Update, &id, body).await
}

/// `PATCH /comments/:id`
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<CommentPatchBody>, JsonRejection>,
) -> Result<Json<Comment>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::PartialUpdate, &id, body).await
}

/// `DELETE /comments/:id`
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
  let comment = load(&*store, &id).await?;
  ctx.authorize_object(&decision, &comment)?;

  if !store.delete_comment(comment.comment_id).await.map_err(store_err)? {
    return Err(ApiError(not_found(KIND, comment.id())));
  }
  Ok(StatusCode::NO_CONTENT)
}
