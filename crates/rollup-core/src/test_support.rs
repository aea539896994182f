//! Shared fixtures for unit tests: a SQLite store on disk with a small,
//! fully known data set, and store wrappers that inject faults.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, Weekday};
use rusqlite::Connection;
use tempfile::TempDir;

use crate::clock::FixedClock;
use crate::error::{Result, RollupError};
use crate::filter::FilterField;
use crate::records::{IndicatorRecord, ProductRecord, TaskRecord};
use crate::store::{schema, RecordQuery, RecordStore, SqliteStore};
use crate::temporal::Calendar;
use crate::types::RollupName;

/// Reference data set. "Today" for these rows is Monday 2024-03-04.
///
/// - ind-1 links p1..p4: p1 and p2 fully completed, p3 and p4 untouched,
///   so its completion is 50% and its adoption 4 of 5 products.
/// - ind-2 links p3 only; ind-3 links nothing.
/// - p5 (Tanzania) has no tasks, no output and no delivery date.
/// - p3's five tasks ended 2024-03-01 and are not completed: five overdue.
/// - t4-01 has no status, phase or organization.
pub(crate) const STANDARD_DATA: &str = r#"
INSERT INTO countries VALUES ('ke', 'Kenya'), ('ug', 'Uganda'), ('tz', 'Tanzania');
INSERT INTO organizations VALUES ('org-a', 'Acme'), ('org-b', 'Beta Org');
INSERT INTO phases VALUES ('ph-1', 'Design'), ('ph-2', 'Build');
INSERT INTO statuses VALUES
    ('st-done', 'Completed'),
    ('st-wip', 'In Progress'),
    ('st-todo', 'Pending'),
    ('st-es', 'Completada'),
    ('st-odd', 'On Hold');
INSERT INTO outputs VALUES ('out-1', 'Output One'), ('out-2', 'Output Two');
INSERT INTO work_packages VALUES ('wp-1', 'Package One', 'out-1'), ('wp-2', 'Package Two', 'out-2');
INSERT INTO products VALUES
    ('p1', 'Alpha',   '2024-03-01', 'out-1', 'wp-1', 'ke', 'org-a'),
    ('p2', 'Bravo',   '2024-03-10', 'out-1', 'wp-1', 'ke', 'org-a'),
    ('p3', 'Charlie', '2024-03-01', 'out-2', 'wp-2', 'ug', 'org-b'),
    ('p4', 'Delta',   '2024-03-04', 'out-2', 'wp-2', 'ug', 'org-b'),
    ('p5', 'Echo',    NULL,         NULL,    NULL,   'tz', NULL);
INSERT INTO indicators VALUES
    ('ind-1', 'I1', 'Reach',   'out-1'),
    ('ind-2', 'I2', 'Quality', 'out-2'),
    ('ind-3', 'I3', 'Unused',  'out-2');
INSERT INTO product_indicators VALUES
    ('p1', 'ind-1'), ('p2', 'ind-1'), ('p3', 'ind-1'), ('p4', 'ind-1'),
    ('p3', 'ind-2');
INSERT INTO tasks VALUES
    ('t1-01', 'Survey 1', '2024-02-01', '2024-03-01', NULL, NULL, '2024-02-01', NULL, NULL, NULL, 'st-done', 'ph-1', 'p1', 'org-a'),
    ('t1-02', 'Survey 2', '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-1', 'p1', 'org-a'),
    ('t1-03', 'Survey 3', '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-1', 'p1', 'org-a'),
    ('t1-04', 'Survey 4', '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-1', 'p1', 'org-a'),
    ('t1-05', 'Survey 5', '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-es',   'ph-1', 'p1', 'org-a'),
    ('t2-01', 'Build 1',  '2024-02-15', '2024-03-10', NULL, NULL, '2024-03-04', NULL, NULL, NULL, 'st-done', 'ph-2', 'p2', 'org-a'),
    ('t2-02', 'Build 2',  '2024-02-15', '2024-03-10', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-2', 'p2', 'org-a'),
    ('t2-03', 'Build 3',  '2024-02-15', '2024-03-10', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-2', 'p2', 'org-a'),
    ('t2-04', 'Build 4',  '2024-02-15', '2024-03-10', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-2', 'p2', 'org-a'),
    ('t2-05', 'Build 5',  '2024-02-15', '2024-03-10', NULL, NULL, NULL, NULL, NULL, NULL, 'st-done', 'ph-2', 'p2', 'org-a'),
    ('t3-01', 'Train 1',  '2024-02-01', '2024-03-01', NULL, NULL, '2024-03-01', '2024-03-04', '2024-03-05', '2024-03-09', 'st-wip', 'ph-2', 'p3', 'org-b'),
    ('t3-02', 'Train 2',  '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-wip',  'ph-2', 'p3', 'org-b'),
    ('t3-03', 'Train 3',  '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p3', 'org-b'),
    ('t3-04', 'Train 4',  '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p3', 'org-b'),
    ('t3-05', 'Train 5',  '2024-02-01', '2024-03-01', NULL, NULL, NULL, NULL, NULL, NULL, 'st-odd',  'ph-2', 'p3', 'org-b'),
    ('t4-01', 'Report 1', '2024-03-01', '2024-03-20', NULL, NULL, '2024-03-20', NULL, 'not a date', NULL, NULL, NULL, 'p4', NULL),
    ('t4-02', 'Report 2', '2024-03-01', '2024-03-20', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p4', NULL),
    ('t4-03', 'Report 3', '2024-03-01', '2024-03-20', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p4', 'org-b'),
    ('t4-04', 'Report 4', '2024-03-01', '2024-03-20', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p4', 'org-b'),
    ('t4-05', 'Report 5', '2024-03-01', '2024-03-20', NULL, NULL, NULL, NULL, NULL, NULL, 'st-todo', 'ph-2', 'p4', 'org-b');
"#;

pub(crate) struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    /// Schema, no rows.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dashboard.db");
        let conn = Connection::open(&path).unwrap();
        schema::create(&conn).unwrap();
        Self { _dir: dir, path }
    }

    pub fn standard() -> Self {
        let fx = Self::empty();
        fx.exec(STANDARD_DATA);
        fx
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exec(&self, sql: &str) {
        let conn = Connection::open(&self.path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    pub fn store(&self) -> SqliteStore {
        SqliteStore::open(&self.path, Duration::from_millis(500)).unwrap()
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    pub fn clock() -> FixedClock {
        FixedClock::on(Self::today())
    }

    pub fn calendar() -> Calendar {
        Calendar::new(Self::today(), Weekday::Mon)
    }
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Every read on behalf of this rollup fails.
    Fail(RollupName),
    /// Every read fails, filter lookups included.
    Down,
    /// Every read sleeps this long first, giving up early on cancellation.
    /// Filter lookups sleep too, without a cancel flag to watch.
    Slow(Duration),
}

pub(crate) struct FaultyStore {
    inner: SqliteStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: SqliteStore, fault: Fault) -> Self {
        Self { inner, fault }
    }

    fn trip(&self, query: &RecordQuery<'_>) -> Result<()> {
        match self.fault {
            Fault::Fail(name) if name == query.rollup => Err(RollupError::StoreUnavailable(
                format!("injected failure for {name}"),
            )),
            Fault::Fail(_) => Ok(()),
            Fault::Down => Err(RollupError::StoreUnavailable("store is down".into())),
            Fault::Slow(total) => {
                let step = Duration::from_millis(5);
                let mut waited = Duration::ZERO;
                while waited < total {
                    query.cancel.check()?;
                    thread::sleep(step);
                    waited += step;
                }
                query.cancel.check()
            }
        }
    }
}

impl RecordStore for FaultyStore {
    fn tasks(&self, query: &RecordQuery<'_>) -> Result<Vec<TaskRecord>> {
        self.trip(query)?;
        self.inner.tasks(query)
    }

    fn products(&self, query: &RecordQuery<'_>) -> Result<Vec<ProductRecord>> {
        self.trip(query)?;
        self.inner.products(query)
    }

    fn indicators(&self, query: &RecordQuery<'_>) -> Result<Vec<IndicatorRecord>> {
        self.trip(query)?;
        self.inner.indicators(query)
    }

    fn product_count(&self, query: &RecordQuery<'_>) -> Result<u64> {
        self.trip(query)?;
        self.inner.product_count(query)
    }

    fn exists(&self, field: FilterField, id: &str) -> Result<bool> {
        match self.fault {
            Fault::Down => return Err(RollupError::StoreUnavailable("store is down".into())),
            Fault::Slow(total) => thread::sleep(total),
            Fault::Fail(_) => {}
        }
        self.inner.exists(field, id)
    }
}
