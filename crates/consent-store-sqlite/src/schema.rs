//! SQL schema for the consent SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schools (
    school_id           TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    admin_password_hash TEXT NOT NULL,   -- argon2 PHC string
    access_code         TEXT NOT NULL,
    created_at          TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
);

-- Uniqueness of names is decided by the matcher at read time, not here.
CREATE TABLE IF NOT EXISTS approvals (
    approval_id   TEXT PRIMARY KEY,
    school_id     TEXT NOT NULL REFERENCES schools(school_id),
    software_name TEXT NOT NULL,
    privacy_url   TEXT NOT NULL DEFAULT '',
    document_url  TEXT,
    approved_at   TEXT NOT NULL
);

-- class_id is '{school_id}-{year}-{section}'; writes are upserts.
CREATE TABLE IF NOT EXISTS classes (
    class_id        TEXT PRIMARY KEY,
    school_id       TEXT NOT NULL REFERENCES schools(school_id),
    year            INTEGER NOT NULL,
    section         INTEGER NOT NULL,
    teacher_name    TEXT NOT NULL,
    pin             TEXT NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    registry_json   TEXT NOT NULL DEFAULT '[]',   -- JSON array of SoftwareItem
    selected_json   TEXT NOT NULL DEFAULT '[]',
    teacher_note    TEXT
);

-- consent_id is '{class_id}-{student_number}'; writes are upserts.
-- No foreign key on class_id: deleting a class leaves its records.
CREATE TABLE IF NOT EXISTS consents (
    consent_id        TEXT PRIMARY KEY,
    school_id         TEXT NOT NULL,
    class_id          TEXT NOT NULL,
    student_number    INTEGER NOT NULL,
    student_name      TEXT NOT NULL,
    parent_name       TEXT NOT NULL,
    pin               TEXT NOT NULL,
    responses_json    TEXT NOT NULL DEFAULT '{}',  -- software id -> response
    confirmation_code TEXT,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS approvals_school_idx ON approvals(school_id);
CREATE INDEX IF NOT EXISTS classes_school_idx   ON classes(school_id);
CREATE INDEX IF NOT EXISTS consents_class_idx   ON consents(class_id);

PRAGMA user_version = 1;
";
