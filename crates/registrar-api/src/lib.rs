//! JSON REST API for the registrar.
//!
//! Exposes an axum [`Router`] backed by any
//! [`registrar_core::store::RegistryStore`]. Authentication, TLS and transport
//! concerns are the caller's responsibility.
//!
//! Every resource (`departments`, `courses`, `faculties`, `students`,
//! `academic-years`) gets the same routes:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`, `POST` | `/{resource}` | List, create |
//! | `GET`, `PUT`, `PATCH` | `/{resource}/{id}` | Read, update |
//! | `DELETE` | `/{resource}/{id}` | Archive |
//! | `PATCH` | `/{resource}/{id}/archive` | Archive |
//! | `PATCH` | `/{resource}/{id}/restore` | Restore |
//! | `DELETE` | `/{resource}/{id}/force` | Purge an archived record |
//! | `GET` | `/{resource}/count` | Active records |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", registrar_api::api_router(store.clone()))
//! ```

pub mod crud;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod listing;
pub mod resource;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch},
};
use registrar_core::store::RegistryStore;

pub use error::ApiError;
use resource::{AcademicYears, Courses, Departments, Faculties, Resource, Students};

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    .merge(resource_routes::<S, Departments>())
    .merge(resource_routes::<S, Courses>())
    .merge(resource_routes::<S, Faculties>())
    .merge(resource_routes::<S, Students>())
    .merge(resource_routes::<S, AcademicYears>())
    // Aggregates
    .route("/students/by-department", get(dashboard::by_department::<S, Students>))
    .route("/faculties/by-department", get(dashboard::by_department::<S, Faculties>))
    .route("/dashboard", get(dashboard::summary::<S>))
    // Current academic year
    .route("/academic-years/current", get(dashboard::current::<S>))
    .route("/academic-years/{id}/activate", patch(dashboard::activate::<S>))
    .with_state(store)
}

fn resource_routes<S, R>() -> Router<Arc<S>>
where
  S: RegistryStore + 'static,
  R: Resource,
{
  let base = format!("/{}", R::KIND.path());
  Router::new()
    .route(&base, get(crud::list::<S, R>).post(crud::create::<S, R>))
    .route(&format!("{base}/count"), get(lifecycle::count::<S, R>))
    .route(
      &format!("{base}/{{id}}"),
      get(crud::get_one::<S, R>)
        .put(crud::update::<S, R>)
        .patch(crud::update::<S, R>)
        .delete(lifecycle::archive::<S, R>),
    )
    .route(&format!("{base}/{{id}}/archive"), patch(lifecycle::archive::<S, R>))
    .route(&format!("{base}/{{id}}/restore"), patch(lifecycle::restore::<S, R>))
    .route(&format!("{base}/{{id}}/force"), delete(lifecycle::purge::<S, R>))
}
