//! SQL schema for the Registrar SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Soft deletion is encoded by `archived_at`. Uniqueness applies to active
//! rows only, so every unique rule is a partial index over
//! `archived_at IS NULL`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS departments (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    head_id     INTEGER REFERENCES faculties(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    archived_at TEXT
);

-- Purging a department removes its courses.
CREATE TABLE IF NOT EXISTS courses (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    department_id INTEGER NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    archived_at   TEXT
);

CREATE TABLE IF NOT EXISTS academic_years (
    id          INTEGER PRIMARY KEY,
    school_year TEXT NOT NULL,
    start_date  TEXT NOT NULL,   -- YYYY-MM-DD
    end_date    TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    archived_at TEXT,
    CHECK (end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS faculties (
    id            INTEGER PRIMARY KEY,
    first_name    TEXT NOT NULL,
    middle_name   TEXT,
    last_name     TEXT NOT NULL,
    suffix        TEXT,
    date_of_birth TEXT,
    sex           TEXT,            -- 'Male' | 'Female'
    phone         TEXT,
    email         TEXT NOT NULL,
    address       TEXT,
    status        TEXT NOT NULL DEFAULT 'Active',
    position      TEXT NOT NULL,
    department_id INTEGER REFERENCES departments(id) ON DELETE SET NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    archived_at   TEXT
);

CREATE TABLE IF NOT EXISTS students (
    id               INTEGER PRIMARY KEY,
    first_name       TEXT NOT NULL,
    middle_name      TEXT,
    last_name        TEXT NOT NULL,
    suffix           TEXT,
    date_of_birth    TEXT,
    sex              TEXT,
    phone            TEXT,
    email            TEXT NOT NULL,
    address          TEXT,
    status           TEXT NOT NULL DEFAULT 'Active',
    department_id    INTEGER REFERENCES departments(id)    ON DELETE SET NULL,
    course_id        INTEGER REFERENCES courses(id)        ON DELETE SET NULL,
    academic_year_id INTEGER REFERENCES academic_years(id) ON DELETE SET NULL,
    year_level       TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    archived_at      TEXT
);

CREATE TABLE IF NOT EXISTS admins (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    admin_id     INTEGER NOT NULL REFERENCES admins(id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS departments_name_active
    ON departments(name) WHERE archived_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS courses_name_active
    ON courses(department_id, name) WHERE archived_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS academic_years_label_active
    ON academic_years(school_year) WHERE archived_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS faculties_email_active
    ON faculties(email) WHERE archived_at IS NULL;
CREATE UNIQUE INDEX IF NOT EXISTS students_email_active
    ON students(email) WHERE archived_at IS NULL;

-- At most one current academic year.
CREATE UNIQUE INDEX IF NOT EXISTS academic_years_current
    ON academic_years(is_active) WHERE is_active = 1;

CREATE INDEX IF NOT EXISTS courses_department_idx  ON courses(department_id);
CREATE INDEX IF NOT EXISTS faculties_department_idx ON faculties(department_id);
CREATE INDEX IF NOT EXISTS students_department_idx ON students(department_id);
CREATE INDEX IF NOT EXISTS students_course_idx     ON students(course_id);
CREATE INDEX IF NOT EXISTS sessions_admin_idx      ON sessions(admin_id);

PRAGMA user_version = 1;
";
