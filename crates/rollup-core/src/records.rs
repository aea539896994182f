//! Read-only views of store rows.
//!
//! Dates arrive as text and are parsed lazily; a value that does not parse
//! surfaces as [`RollupError::MalformedRow`] so the caller can drop that one
//! record and keep going.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{Result, RollupError};
use crate::status::StatusAliases;
use crate::types::{CheckInKind, RollupName, TaskState};

/// A task joined with the product, status, phase, organization, country and
/// output it hangs off.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub checkin_start: Option<String>,
    pub checkin_midpoint: Option<String>,
    pub checkin_review: Option<String>,
    pub checkin_closeout: Option<String>,
    pub phase_id: Option<String>,
    pub phase_name: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub country_id: String,
    pub country_name: Option<String>,
    pub output_id: Option<String>,
    pub output_name: Option<String>,
    pub work_package_id: Option<String>,
}

impl TaskRecord {
    pub fn check_in(&self, kind: CheckInKind) -> Option<&str> {
        match kind {
            CheckInKind::Start => self.checkin_start.as_deref(),
            CheckInKind::Midpoint => self.checkin_midpoint.as_deref(),
            CheckInKind::Review => self.checkin_review.as_deref(),
            CheckInKind::Closeout => self.checkin_closeout.as_deref(),
        }
    }

    fn label(&self) -> String {
        format!("task {}", self.id)
    }

    /// Resolve status and planned end. Fails only on an unparseable date.
    pub fn fact(&self, aliases: &StatusAliases) -> Result<TaskFact> {
        Ok(TaskFact {
            state: aliases.resolve(self.status.as_deref()),
            planned_end: parse_date(&self.label(), "planned_end", self.planned_end.as_deref())?,
        })
    }

    pub fn check_in_date(&self, kind: CheckInKind) -> Result<Option<NaiveDate>> {
        parse_date(&self.label(), kind.as_str(), self.check_in(kind))
    }
}

/// The two facts every counting rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFact {
    pub state: TaskState,
    pub planned_end: Option<NaiveDate>,
}

/// A task whose dates have been checked.
#[derive(Debug, Clone)]
pub struct PreparedTask {
    pub record: TaskRecord,
    pub fact: TaskFact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub delivery_date: Option<String>,
    pub output_id: Option<String>,
    pub output_name: Option<String>,
    pub work_package_id: Option<String>,
    pub country_id: String,
    pub country_name: Option<String>,
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
}

impl ProductRecord {
    pub fn delivery(&self) -> Result<Option<NaiveDate>> {
        parse_date(
            &format!("product {}", self.id),
            "delivery_date",
            self.delivery_date.as_deref(),
        )
    }
}

/// An indicator with the ids of the in-scope products joined to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorRecord {
    pub id: String,
    pub code: String,
    pub name: String,
    pub output_id: Option<String>,
    pub output_name: Option<String>,
    pub product_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse a stored date. Blank means no date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339, and `YYYY-MM-DD HH:MM:SS`. A timestamp
/// with an offset yields its UTC calendar date.
pub fn parse_date(record: &str, field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(d));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc).date_naive()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(dt.date()));
    }
    Err(RollupError::MalformedRow {
        record: record.to_string(),
        reason: format!("unparseable {field} '{raw}'"),
    })
}

/// Check every task's dates, dropping (and logging) the ones that fail.
pub fn prepare_tasks(
    records: Vec<TaskRecord>,
    aliases: &StatusAliases,
    rollup: RollupName,
) -> Vec<PreparedTask> {
    records
        .into_iter()
        .filter_map(|record| match record.fact(aliases) {
            Ok(fact) => Some(PreparedTask { record, fact }),
            Err(e) => {
                tracing::warn!(rollup = %rollup, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}
