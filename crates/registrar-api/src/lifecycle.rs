//! Archive, restore and purge handlers, plus the active-record count.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
};
use registrar_core::{lifecycle::View, store::RegistryStore};
use serde_json::{Value, json};

use crate::{error::ApiError, resource::Resource};

/// `DELETE /{resource}/{id}` and `PATCH /{resource}/{id}/archive`
pub async fn archive<S, R>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Path(id) = id?;
  let event = store.archive(R::KIND, id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": event.message() })))
}

/// `PATCH /{resource}/{id}/restore`. 409 if an active record now holds one
/// of its unique values.
pub async fn restore<S, R>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Path(id) = id?;
  let event = store.restore(R::KIND, id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": event.message() })))
}

/// `DELETE /{resource}/{id}/force`, archived records only.
pub async fn purge<S, R>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let Path(id) = id?;
  let event = store.purge(R::KIND, id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": event.message() })))
}

/// `GET /{resource}/count`
pub async fn count<S, R>(State(store): State<Arc<S>>) -> Result<Json<Value>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let count = store.count(R::KIND, View::Active).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "count": count })))
}
