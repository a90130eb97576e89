//! The five record kinds as type-level markers, so one set of generic
//! handlers serves every resource path.

use std::future::Future;

use registrar_core::{
  academic_year::{AcademicYear, AcademicYearPatch, NewAcademicYear},
  course::{Course, CoursePatch, NewCourse},
  department::{Department, DepartmentPatch, NewDepartment},
  entity::EntityKind,
  lifecycle::View,
  person::{Faculty, FacultyPatch, NewFaculty, NewStudent, Student, StudentPatch},
  query::{ListQuery, Listing},
  store::RegistryStore,
};
use serde::{Serialize, de::DeserializeOwned};

/// Binds a record kind to its payload types and its [`RegistryStore`]
/// methods.
pub trait Resource: Send + Sync + 'static {
  const KIND: EntityKind;

  type Record: Serialize + Send + 'static;
  type New: DeserializeOwned + Send + 'static;
  type Patch: DeserializeOwned + Send + 'static;

  fn create<S: RegistryStore>(
    store: &S,
    input: Self::New,
  ) -> impl Future<Output = Result<Self::Record, S::Error>> + Send + '_;

  fn update<S: RegistryStore>(
    store: &S,
    id: i64,
    patch: Self::Patch,
  ) -> impl Future<Output = Result<Self::Record, S::Error>> + Send + '_;

  fn get<S: RegistryStore>(
    store: &S,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<Self::Record>, S::Error>> + Send + '_;

  fn list<'a, S: RegistryStore>(
    store: &'a S,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<Self::Record>, S::Error>> + Send + 'a;
}

macro_rules! resource {
  (
    $marker:ident, $kind:expr, $record:ty, $new:ty, $patch:ty,
    $create:ident, $update:ident, $get:ident, $list:ident
  ) => {
    pub struct $marker;

    impl Resource for $marker {
      const KIND: EntityKind = $kind;

      type Record = $record;
      type New = $new;
      type Patch = $patch;

      fn create<S: RegistryStore>(
        store: &S,
        input: $new,
      ) -> impl Future<Output = Result<$record, S::Error>> + Send + '_ {
        store.$create(input)
      }

      fn update<S: RegistryStore>(
        store: &S,
        id: i64,
        patch: $patch,
      ) -> impl Future<Output = Result<$record, S::Error>> + Send + '_ {
        store.$update(id, patch)
      }

      fn get<S: RegistryStore>(
        store: &S,
        id: i64,
        view: View,
      ) -> impl Future<Output = Result<Option<$record>, S::Error>> + Send + '_ {
        store.$get(id, view)
      }

      fn list<'a, S: RegistryStore>(
        store: &'a S,
        query: &'a ListQuery,
      ) -> impl Future<Output = Result<Listing<$record>, S::Error>> + Send + 'a {
        store.$list(query)
      }
    }
  };
}

resource!(
  Departments, EntityKind::Department, Department, NewDepartment, DepartmentPatch,
  create_department, update_department, get_department, list_departments
);

resource!(
  Courses, EntityKind::Course, Course, NewCourse, CoursePatch,
  create_course, update_course, get_course, list_courses
);

resource!(
  Faculties, EntityKind::Faculty, Faculty, NewFaculty, FacultyPatch,
  create_faculty, update_faculty, get_faculty, list_faculty
);

resource!(
  Students, EntityKind::Student, Student, NewStudent, StudentPatch,
  create_student, update_student, get_student, list_students
);

resource!(
  AcademicYears, EntityKind::AcademicYear, AcademicYear, NewAcademicYear, AcademicYearPatch,
  create_academic_year, update_academic_year, get_academic_year, list_academic_years
);
