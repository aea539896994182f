//! Table layout the SQLite store reads. Used to bootstrap empty databases
//! and test fixtures; the engine itself never writes.

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS organizations (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS phases (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS statuses (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS outputs (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS work_packages (
    id        TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    output_id TEXT REFERENCES outputs(id)
);
CREATE TABLE IF NOT EXISTS products (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    delivery_date   TEXT,
    output_id       TEXT REFERENCES outputs(id),
    work_package_id TEXT REFERENCES work_packages(id),
    country_id      TEXT NOT NULL REFERENCES countries(id),
    organization_id TEXT REFERENCES organizations(id)
);
CREATE TABLE IF NOT EXISTS indicators (
    id        TEXT PRIMARY KEY,
    code      TEXT NOT NULL,
    name      TEXT NOT NULL,
    output_id TEXT REFERENCES outputs(id)
);
CREATE TABLE IF NOT EXISTS product_indicators (
    product_id   TEXT NOT NULL REFERENCES products(id),
    indicator_id TEXT NOT NULL REFERENCES indicators(id),
    PRIMARY KEY (product_id, indicator_id)
);
CREATE TABLE IF NOT EXISTS tasks (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    planned_start    TEXT,
    planned_end      TEXT,
    actual_start     TEXT,
    actual_end       TEXT,
    checkin_start    TEXT,
    checkin_midpoint TEXT,
    checkin_review   TEXT,
    checkin_closeout TEXT,
    status_id        TEXT REFERENCES statuses(id),
    phase_id         TEXT REFERENCES phases(id),
    product_id       TEXT NOT NULL REFERENCES products(id),
    organization_id  TEXT REFERENCES organizations(id)
);
CREATE INDEX IF NOT EXISTS idx_tasks_product ON tasks(product_id);
CREATE INDEX IF NOT EXISTS idx_product_indicators_indicator ON product_indicators(indicator_id);
"#;

/// Create every table the store reads. Idempotent.
pub fn create(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
