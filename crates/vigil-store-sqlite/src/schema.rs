//! SQL schema for the Vigil SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id         TEXT PRIMARY KEY,
    display_name       TEXT NOT NULL,
    phone_number       TEXT,
    conversational     INTEGER NOT NULL DEFAULT 0,
    conversation_style TEXT NOT NULL DEFAULT 'warm',
    wellbeing_check    INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id              TEXT PRIMARY KEY,
    subject_id           TEXT NOT NULL REFERENCES subjects(subject_id),
    title                TEXT NOT NULL,
    message              TEXT,
    delivery_methods     TEXT NOT NULL DEFAULT '[]',  -- JSON array of channels
    use_voice_clone      INTEGER NOT NULL DEFAULT 0,
    voice_profile        TEXT,
    escalation_threshold INTEGER NOT NULL CHECK (escalation_threshold >= 1),
    attempts_today       INTEGER NOT NULL DEFAULT 0 CHECK (attempts_today >= 0),
    last_satisfied_at    TEXT,
    escalated_at         TEXT,
    created_at           TEXT NOT NULL,
    CHECK (escalated_at IS NULL OR attempts_today >= escalation_threshold)
);

CREATE TABLE IF NOT EXISTS schedules (
    schedule_id TEXT PRIMARY KEY,
    task_id     TEXT NOT NULL REFERENCES tasks(task_id),
    day_of_week INTEGER CHECK (day_of_week BETWEEN 0 AND 6),  -- NULL = every day
    hour        INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
    minute      INTEGER NOT NULL CHECK (minute BETWEEN 0 AND 59)
);

-- seq breaks priority ties in insertion order.
CREATE TABLE IF NOT EXISTS escalation_contacts (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id   TEXT NOT NULL UNIQUE,
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id),
    display_name TEXT NOT NULL,
    phone_number TEXT,
    methods      TEXT NOT NULL DEFAULT '[]',
    priority     INTEGER NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS greeting_templates (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id     TEXT NOT NULL UNIQUE,
    style           TEXT NOT NULL,
    time_bucket     TEXT,   -- NULL = any time
    greeting        TEXT NOT NULL,
    wellbeing_check TEXT,
    closing         TEXT
);

-- Strictly append-only. No UPDATE or DELETE is ever issued against this
-- table by the engine.
CREATE TABLE IF NOT EXISTS delivery_log (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id       TEXT NOT NULL UNIQUE,
    task_id        TEXT NOT NULL REFERENCES tasks(task_id),
    subject_id     TEXT NOT NULL,
    kind           TEXT NOT NULL,   -- 'reminder' | 'escalation'
    channel        TEXT,
    recipient      TEXT,
    content        TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'sent' | 'failed'
    provider_ref   TEXT,
    error_detail   TEXT,
    failure_reason TEXT,
    recorded_at    TEXT NOT NULL
);

-- One row per (task, schedule, local minute) that a tick has acted on.
CREATE TABLE IF NOT EXISTS occurrence_claims (
    task_id     TEXT NOT NULL,
    schedule_id TEXT NOT NULL,
    occurrence  TEXT NOT NULL,   -- local 'YYYY-MM-DDTHH:MM'
    PRIMARY KEY (task_id, schedule_id, occurrence)
);

CREATE TABLE IF NOT EXISTS engine_state (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS schedules_time_idx     ON schedules(hour, minute);
CREATE INDEX IF NOT EXISTS contacts_subject_idx   ON escalation_contacts(subject_id, priority);
CREATE INDEX IF NOT EXISTS templates_lookup_idx   ON greeting_templates(style, time_bucket);
CREATE INDEX IF NOT EXISTS delivery_task_idx      ON delivery_log(task_id);
CREATE INDEX IF NOT EXISTS delivery_subject_idx   ON delivery_log(subject_id);

PRAGMA user_version = 1;
";

/// `engine_state` key holding the last calendar day that was reset.
pub const LAST_RESET_DAY: &str = "last_reset_day";
