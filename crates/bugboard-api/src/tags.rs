//! Handlers for `/tags` endpoints. Reads are public; every write is
//! admin-only. Tags have no owner, so there is no authorship check.

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
  record::{NewTag, Tag, TagPatch, slugify},
  store::BoardStore,
};
use serde::Deserialize;

use crate::{
  error::{ApiError, store_err},
  extract::{Caller, not_found, parse_body, parse_id, require_text},
};

const KIND: ResourceKind = ResourceKind::Tag;
const NAME_MAX: usize = 50;

async fn load<S: BoardStore>(store: &S, raw_id: &str) -> Result<Tag, ApiError> {
  let id = parse_id(KIND, raw_id)?;
  store
    .get_tag(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, id)))
}

fn validate_name(name: &str) -> Result<(), ApiError> {
  require_text("name", name, Some(NAME_MAX))?;
  if slugify(name).is_empty() {
    return Err(ApiError(Error::invalid_input(
      "name must contain at least one letter or digit",
    )));
  }
  Ok(())
}

/// Tag names and slugs are unique; say so instead of echoing the driver.
fn tag_conflict(e: Error) -> ApiError {
  match e {
    Error::Conflict(_) => {
      ApiError(Error::Conflict("a tag with this name or slug already exists".into()))
    }
    other => ApiError(other),
  }
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TagPatchBody {
  pub name: Option<String>,
}

impl From<TagBody> for TagPatch {
  fn from(b: TagBody) -> Self { Self { name: Some(b.name) } }
}

impl From<TagPatchBody> for TagPatch {
  fn from(b: TagPatchBody) -> Self { Self { name: b.name } }
}

/// `GET /tags`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::List).authorize()?;
  Ok(Json(store.list_tags().await.map_err(store_err)?))
}

/// `GET /tags/:id`
pub async fn retrieve<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Json<Tag>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Retrieve).authorize()?;
  Ok(Json(load(&*store, &id).await?))
}

/// `POST /tags`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  body: Result<Json<TagBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Create).authorize()?;

  let body = parse_body(body)?;
  validate_name(&body.name)?;

  let tag = store
    .create_tag(NewTag { name: body.name })
    .await
    .map_err(|e| tag_conflict(e.into()))?;
  Ok((StatusCode::CREATED, Json(tag)))
}

async fn edit<S, B>(
  store: &S,
  identity: Identity,
  action: Action,
  raw_id: &str,
  body: Result<Json<B>, JsonRejection>,
) -> Result<Json<Tag>, ApiError>
where
  S: BoardStore,
  B: Into<TagPatch>,
{
  RequestContext::new(identity, KIND, action).authorize()?;
  let tag = load(store, raw_id).await?;

  let patch: TagPatch = parse_body(body)?.into();
  if let Some(name) = &patch.name {
    validate_name(name)?;
  }

  let updated = store
    .update_tag(tag.tag_id, patch)
    .await
    .map_err(|e| tag_conflict(e.into()))?
    .ok_or_else(|| ApiError(not_found(KIND, tag.tag_id)))?;
  Ok(Json(updated))
}

/// `PUT /tags/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<TagBody>, JsonRejection>,
) -> Result<Json<Tag>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::Update, &id, body).await
}

/// `PATCH /tags/:id`
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<TagPatchBody>, JsonRejection>,
) -> Result<Json<Tag>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::PartialUpdate, &id, body).await
}

/// `DELETE /tags/:id`: detaches the tag from every post.
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Delete).authorize()?;
  let tag = load(&*store, &id).await?;

  if !store.delete_tag(tag.tag_id).await.map_err(store_err)? {
    return Err(ApiError(not_found(KIND, tag.tag_id)));
  }
  Ok(StatusCode::NO_CONTENT)
}
