//! Dashboard aggregates and the current academic year.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
};
use registrar_core::{
  academic_year::AcademicYear,
  entity::EntityKind,
  lifecycle::View,
  query::DepartmentCount,
  store::RegistryStore,
};
use serde::Serialize;

use crate::{error::ApiError, resource::Resource};

/// Active-record counts shown on the landing page.
#[derive(Debug, Serialize)]
pub struct Summary {
  pub students:              u64,
  pub faculties:             u64,
  pub departments:           u64,
  pub courses:               u64,
  pub academic_years:        u64,
  pub current_academic_year: Option<AcademicYear>,
}

/// `GET /students/by-department`, `GET /faculties/by-department`
pub async fn by_department<S, R>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<DepartmentCount>>, ApiError>
where
  S: RegistryStore,
  R: Resource,
{
  let counts = store.count_by_department(R::KIND).await.map_err(ApiError::from_store)?;
  Ok(Json(counts))
}

async fn active<S: RegistryStore>(store: &S, kind: EntityKind) -> Result<u64, ApiError> {
  store.count(kind, View::Active).await.map_err(ApiError::from_store)
}

/// `GET /dashboard`
pub async fn summary<S>(State(store): State<Arc<S>>) -> Result<Json<Summary>, ApiError>
where
  S: RegistryStore,
{
  let store = &*store;
  Ok(Json(Summary {
    students:              active(store, EntityKind::Student).await?,
    faculties:             active(store, EntityKind::Faculty).await?,
    departments:           active(store, EntityKind::Department).await?,
    courses:               active(store, EntityKind::Course).await?,
    academic_years:        active(store, EntityKind::AcademicYear).await?,
    current_academic_year: store.current_academic_year().await.map_err(ApiError::from_store)?,
  }))
}

/// `PATCH /academic-years/{id}/activate`
pub async fn activate<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AcademicYear>, ApiError>
where
  S: RegistryStore,
{
  let Path(id) = id?;
  let year = store.activate_academic_year(id).await.map_err(ApiError::from_store)?;
  Ok(Json(year))
}

/// `GET /academic-years/current`
pub async fn current<S>(State(store): State<Arc<S>>) -> Result<Json<AcademicYear>, ApiError>
where
  S: RegistryStore,
{
  let year = store
    .current_academic_year()
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("No academic year is currently active.".to_owned()))?;
  Ok(Json(year))
}
