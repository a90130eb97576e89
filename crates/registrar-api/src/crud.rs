//! Create, read, update and list handlers shared by every resource.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/{resource}` | See [`ListParams`] |
//! | `POST` | `/{resource}` | 201 + record, 422 on invalid input |
//! | `GET`  | `/{resource}/{id}` | `?view=`, default `all`; 404 if not found |
//! | `PUT`/`PATCH` | `/{resource}/{id}` | Partial update; 404, 422 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use registrar_core::{query::Listing, store::RegistryStore};

use crate::{
  error::ApiError,
  listing::{ListParams, ViewParams},
  resource::Resource,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /{resource}`
pub async fn list<S, R>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Listing<R::Record>>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Query(params) = params?;
  let query = params.into_query(R::KIND)?;
  let listing = R::list(&*store, &query).await.map_err(ApiError::from_store)?;
  Ok(Json(listing))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /{resource}`
pub async fn create<S, R>(
  State(store): State<Arc<S>>,
  body: Result<Json<R::New>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Json(input) = body?;
  let record = R::create(&*store, input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{resource}/{id}`
pub async fn get_one<S, R>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
  params: Result<Query<ViewParams>, QueryRejection>,
) -> Result<Json<R::Record>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Path(id) = id?;
  let Query(params) = params?;
  let view = params.into_view()?;
  let record = R::get(&*store, id, view)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::missing(R::KIND))?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /{resource}/{id}` and `PATCH /{resource}/{id}`
pub async fn update<S, R>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
  body: Result<Json<R::Patch>, JsonRejection>,
) -> Result<Json<R::Record>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Path(id) = id?;
  let Json(patch) = body?;
  let record = R::update(&*store, id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(record))
}
