//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"username","email","password"}`; returns token + user |
//! | `POST` | `/auth/login` | Body: `{"username","password"}`; returns a new token |
//! | `POST` | `/auth/logout` | Revokes every token of the caller |
//! | `GET`  | `/auth/users/me` | The caller's profile |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use bugboard_core::{
  Error,
  record::{NewUser, User},
  store::BoardStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
  error::{ApiError, store_err},
  extract::{Caller, parse_body, require_text},
  token,
};

async fn issue_token<S: BoardStore>(store: &S, user: &User) -> Result<String, ApiError> {
  let key = token::generate();
  store
    .insert_token(user.user_id, token::digest(&key))
    .await
    .map_err(store_err)?;
  Ok(key)
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
  pub token: String,
  pub user:  User,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore,
{
  let body = parse_body(body)?;
  require_text("username", &body.username, Some(150))?;
  require_text("password", &body.password, None)?;
  if !body.email.contains('@') {
    return Err(ApiError(Error::invalid_input("email must be a valid address")));
  }

  let password_hash = token::hash_password(&body.password)?;
  let user = store
    .create_user(NewUser {
      username: body.username,
      email: body.email,
      password_hash,
      is_admin: false,
    })
    .await
    .map_err(|e| match Into::<Error>::into(e) {
      Error::Conflict(_) => ApiError(Error::Conflict("username is already taken".into())),
      other => ApiError(other),
    })?;

  let token = issue_token(&*store, &user).await?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "account registered");
  Ok((StatusCode::CREATED, Json(Registered { token, user })))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /auth/login`: bad credentials are a 400, as is a malformed body.
pub async fn login<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore,
{
  let body = parse_body(body)?;

  let user = store.find_user(body.username).await.map_err(store_err)?;
  let user = match user {
    Some(user) if token::verify_password(&body.password, &user.password_hash) => user,
    _ => return Err(ApiError(Error::invalid_input("authentication failed"))),
  };

  let token = issue_token(&*store, &user).await?;
  Ok(Json(json!({ "message": "login successful", "token": token })))
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `POST /auth/logout`
pub async fn logout<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
) -> Result<impl IntoResponse, ApiError>
where
  S: BoardStore + 'static,
{
  let user_id = identity.user_id().ok_or(Error::Unauthenticated)?;
  store.delete_tokens(user_id).await.map_err(store_err)?;
  Ok(Json(json!({ "message": "logged out" })))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /auth/users/me`
pub async fn me<S>(
  State(store): State<Arc<S>>,
  Caller(identity): Caller,
) -> Result<Json<User>, ApiError>
where
  S: BoardStore + 'static,
{
  let user_id = identity.user_id().ok_or(Error::Unauthenticated)?;
  let user = store
    .get_user(user_id)
    .await
    .map_err(store_err)?
    .ok_or(Error::Unauthenticated)?;
  Ok(Json(user))
}
