//! [`RecordStore`] over a SQLite file.
//!
//! Every call opens its own read-only connection, so rollups running in
//! parallel never share a cursor or a transaction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};

use super::{CancelFlag, RecordQuery, RecordStore};
use crate::error::{Result, RollupError};
use crate::filter::{FilterField, Filters};
use crate::records::{IndicatorRecord, ProductRecord, TaskRecord};

const TASKS_SQL: &str = "\
SELECT t.id, t.name, s.name,
       t.planned_start, t.planned_end, t.actual_start, t.actual_end,
       t.checkin_start, t.checkin_midpoint, t.checkin_review, t.checkin_closeout,
       t.phase_id, ph.name,
       p.id, p.name,
       t.organization_id, o.name,
       p.country_id, c.name,
       p.output_id, out.name,
       p.work_package_id
FROM tasks t
JOIN products p ON p.id = t.product_id
LEFT JOIN statuses s ON s.id = t.status_id
LEFT JOIN phases ph ON ph.id = t.phase_id
LEFT JOIN organizations o ON o.id = t.organization_id
LEFT JOIN countries c ON c.id = p.country_id
LEFT JOIN outputs out ON out.id = p.output_id";

const PRODUCTS_SQL: &str = "\
SELECT p.id, p.name, p.delivery_date,
       p.output_id, out.name,
       p.work_package_id,
       p.country_id, c.name,
       p.organization_id, o.name
FROM products p
LEFT JOIN outputs out ON out.id = p.output_id
LEFT JOIN countries c ON c.id = p.country_id
LEFT JOIN organizations o ON o.id = p.organization_id";

const LINKS_SQL: &str = "\
SELECT pi.indicator_id, pi.product_id
FROM product_indicators pi
JOIN products p ON p.id = pi.product_id";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Point at an existing database file. Nothing is opened until a query runs.
    pub fn open(path: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(RollupError::StoreUnavailable(format!(
                "database not found: {}",
                path.display()
            )));
        }
        Ok(Self { path, busy_timeout })
    }

    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            RollupError::StoreUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// `WHERE` clause restricting products (aliased `p`) to the filter scope.
fn product_scope(filters: &Filters) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (field, value) in filters.iter() {
        clauses.push(match field {
            FilterField::Output => "p.output_id = ?",
            FilterField::WorkPackage => "p.work_package_id = ?",
            FilterField::Product => "p.id = ?",
            FilterField::Indicator => {
                "p.id IN (SELECT product_id FROM product_indicators WHERE indicator_id = ?)"
            }
        });
        params.push(value.to_string());
    }
    if clauses.is_empty() {
        return (String::new(), params);
    }
    (format!(" WHERE {}", clauses.join(" AND ")), params)
}

/// Read a column as text whatever its storage class, so a bad value reaches
/// the date parser (and is skipped there) instead of failing the query.
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(b) | ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    })
}

fn required(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(text(row, idx)?.unwrap_or_default())
}

fn collect<T>(
    conn: &Connection,
    sql: &str,
    params: &[String],
    cancel: &CancelFlag,
    map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    cancel.check()?;
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        cancel.check()?;
        out.push(map(row)?);
    }
    Ok(out)
}

fn task_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: required(row, 0)?,
        name: required(row, 1)?,
        status: text(row, 2)?,
        planned_start: text(row, 3)?,
        planned_end: text(row, 4)?,
        actual_start: text(row, 5)?,
        actual_end: text(row, 6)?,
        checkin_start: text(row, 7)?,
        checkin_midpoint: text(row, 8)?,
        checkin_review: text(row, 9)?,
        checkin_closeout: text(row, 10)?,
        phase_id: text(row, 11)?,
        phase_name: text(row, 12)?,
        product_id: required(row, 13)?,
        product_name: required(row, 14)?,
        organization_id: text(row, 15)?,
        organization_name: text(row, 16)?,
        country_id: required(row, 17)?,
        country_name: text(row, 18)?,
        output_id: text(row, 19)?,
        output_name: text(row, 20)?,
        work_package_id: text(row, 21)?,
    })
}

fn product_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
    Ok(ProductRecord {
        id: required(row, 0)?,
        name: required(row, 1)?,
        delivery_date: text(row, 2)?,
        output_id: text(row, 3)?,
        output_name: text(row, 4)?,
        work_package_id: text(row, 5)?,
        country_id: required(row, 6)?,
        country_name: text(row, 7)?,
        organization_id: text(row, 8)?,
        organization_name: text(row, 9)?,
    })
}

// ---------------------------------------------------------------------------
// RecordStore impl
// ---------------------------------------------------------------------------

impl RecordStore for SqliteStore {
    fn tasks(&self, query: &RecordQuery<'_>) -> Result<Vec<TaskRecord>> {
        let conn = self.connect()?;
        let (scope, params) = product_scope(query.filters);
        let sql = format!("{TASKS_SQL}{scope} ORDER BY t.id");
        tracing::debug!(rollup = %query.rollup, filters = %query.filters, "querying tasks");
        collect(&conn, &sql, &params, query.cancel, task_row)
    }

    fn products(&self, query: &RecordQuery<'_>) -> Result<Vec<ProductRecord>> {
        let conn = self.connect()?;
        let (scope, params) = product_scope(query.filters);
        let sql = format!("{PRODUCTS_SQL}{scope} ORDER BY p.id");
        tracing::debug!(rollup = %query.rollup, filters = %query.filters, "querying products");
        collect(&conn, &sql, &params, query.cancel, product_row)
    }

    fn indicators(&self, query: &RecordQuery<'_>) -> Result<Vec<IndicatorRecord>> {
        let conn = self.connect()?;
        tracing::debug!(rollup = %query.rollup, filters = %query.filters, "querying indicators");

        let (sql, params) = match query.filters.get(FilterField::Indicator) {
            Some(id) => (
                "SELECT i.id, i.code, i.name, i.output_id, out.name FROM indicators i \
                 LEFT JOIN outputs out ON out.id = i.output_id WHERE i.id = ? ORDER BY i.id",
                vec![id.to_string()],
            ),
            None => (
                "SELECT i.id, i.code, i.name, i.output_id, out.name FROM indicators i \
                 LEFT JOIN outputs out ON out.id = i.output_id ORDER BY i.id",
                Vec::new(),
            ),
        };
        let mut indicators = collect(&conn, sql, &params, query.cancel, |row| {
            Ok(IndicatorRecord {
                id: required(row, 0)?,
                code: required(row, 1)?,
                name: required(row, 2)?,
                output_id: text(row, 3)?,
                output_name: text(row, 4)?,
                product_ids: Vec::new(),
            })
        })?;

        let (scope, params) = product_scope(query.filters);
        let links_sql = format!("{LINKS_SQL}{scope} ORDER BY pi.indicator_id, pi.product_id");
        let links = collect(&conn, &links_sql, &params, query.cancel, |row| {
            Ok((required(row, 0)?, required(row, 1)?))
        })?;
        let index: HashMap<String, usize> = indicators
            .iter()
            .enumerate()
            .map(|(pos, ind)| (ind.id.clone(), pos))
            .collect();
        for (indicator_id, product_id) in links {
            if let Some(&pos) = index.get(&indicator_id) {
                indicators[pos].product_ids.push(product_id);
            }
        }
        Ok(indicators)
    }

    fn product_count(&self, query: &RecordQuery<'_>) -> Result<u64> {
        query.cancel.check()?;
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    fn exists(&self, field: FilterField, id: &str) -> Result<bool> {
        let table = match field {
            FilterField::Output => "outputs",
            FilterField::Indicator => "indicators",
            FilterField::WorkPackage => "work_packages",
            FilterField::Product => "products",
        };
        let conn = self.connect()?;
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)");
        let found: bool = conn.query_row(&sql, [id], |row| row.get(0))?;
        Ok(found)
    }
}
