//! Handlers for `/solutions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/solutions` | Every solution, with its upvote count |
//! | `POST`   | `/solutions` | Body: `{"post_id","description"}` |
//! | `GET`    | `/solutions/:id` | 404 if not found |
//! | `PUT`    | `/solutions/:id` | Author only; body `{"description"}` |
//! | `PATCH`  | `/solutions/:id` | Author only |
//! | `DELETE` | `/solutions/:id` | Author only |
//! | `POST`   | `/solutions/:id/upvote` | Toggles the caller's vote; 201 on cast, 200 on retract |

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
  record::{NewSolution, Owned, Solution, SolutionPatch},
  store::{BoardStore, VoteStore},
  vote::{self, VoteState},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::{ApiError, store_err},
  extract::{Caller, not_found, parse_body, parse_id, require_text},
};

const KIND: ResourceKind = ResourceKind::Solution;

async fn load<S: BoardStore>(store: &S, raw_id: &str) -> Result<Solution, ApiError> {
  let id = parse_id(KIND, raw_id)?;
  store
    .get_solution(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, id)))
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub post_id:     Uuid,
  pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SolutionBody {
  pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SolutionPatchBody {
  pub description: Option<String>,
}

impl From<SolutionBody> for SolutionPatch {
  fn from(b: SolutionBody) -> Self { Self { description: Some(b.description) } }
}

impl From<SolutionPatchBody> for SolutionPatch {
  fn from(b: SolutionPatchBody) -> Self { Self { description: b.description } }
}

// ─── List / retrieve / create ────────────────────────────────────────────────

/// `GET /solutions`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
) -> Result<Json<Vec<Solution>>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::List).authorize()?;
  Ok(Json(store.list_solutions().await.map_err(store_err)?))
}

/// `GET /solutions/:id`
pub async fn retrieve<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<Json<Solution>, ApiError>
where
  S: BoardStore + 'static,
{
  RequestContext::new(identity, KIND, Action::Retrieve).authorize()?;
  Ok(Json(load(&*store, &id).await?))
}

/// `POST /solutions`: an unknown `post_id` is a 404.
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

  let solution = store
    .create_solution(owner_id, NewSolution {
      post_id:     body.post_id,
      description: body.description,
    })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(solution)))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

async fn edit<S, B>(
  store: &S,
  identity: Identity,
  action: Action,
  raw_id: &str,
  body: Result<Json<B>, JsonRejection>,
) -> Result<Json<Solution>, ApiError>
where
  S: BoardStore,
  B: Into<SolutionPatch>,
{
  let ctx = RequestContext::new(identity, KIND, action);
  let decision = ctx.authorize()?;
  let solution = load(store, raw_id).await?;
  ctx.authorize_object(&decision, &solution)?;

  let patch: SolutionPatch = parse_body(body)?.into();
  if let Some(description) = &patch.description {
    require_text("description", description, None)?;
  }

  let updated = store
    .update_solution(solution.solution_id, patch)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError(not_found(KIND, solution.id())))?;
  Ok(Json(updated))
}

/// `PUT /solutions/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<SolutionBody>, JsonRejection>,
) -> Result<Json<Solution>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::Update, &id, body).await
}

/// `PATCH /solutions/:id`
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
  body: Result<Json<SolutionPatchBody>, JsonRejection>,
) -> Result<Json<Solution>, ApiError>
where
  S: BoardStore + 'static,
{
  edit(&*store, identity, Action::PartialUpdate, &id, body).await
}

/// `DELETE /solutions/:id`
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
  let solution = load(&*store, &id).await?;
  ctx.authorize_object(&decision, &solution)?;

  if !store.delete_solution(solution.solution_id).await.map_err(store_err)? {
    return Err(ApiError(not_found(KIND, solution.id())));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Upvote ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Upvoted {
  pub action:   VoteState,
  pub solution: Solution,
}

/// `POST /solutions/:id/upvote`
pub async fn upvote<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore + VoteStore + 'static,
{
  let ctx = RequestContext::new(identity, KIND, Action::Upvote);
  ctx.authorize()?;
  let solution = load(&*store, &id).await?;

  let state = vote::toggle(&*store, &solution, &ctx.identity).await?;
  tracing::info!(
    solution_id = %solution.solution_id,
    voter_id = ?ctx.identity.user_id(),
    action = state.as_str(),
    "vote toggled"
  );

  // Reload so the count reflects this toggle.
  let solution = load(&*store, &id).await?;
  let status = match state {
    VoteState::Voted => StatusCode::CREATED,
    VoteState::Unvoted => StatusCode::OK,
  };
  Ok((status, Json(Upvoted { action: state, solution })))
}
