use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskState
// ---------------------------------------------------------------------------

/// Canonical task state. Raw status names from the store are mapped onto
/// this through [`crate::status::StatusAliases`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Completed,
    InProgress,
    Pending,
}

impl TaskState {
    pub fn all() -> &'static [TaskState] {
        &[TaskState::Completed, TaskState::InProgress, TaskState::Pending]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Completed => "completed",
            TaskState::InProgress => "in_progress",
            TaskState::Pending => "pending",
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, TaskState::Completed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UrgencyBucket
// ---------------------------------------------------------------------------

/// Urgency of a dated item relative to "now". Variant order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBucket {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    Later,
}

impl UrgencyBucket {
    pub fn all() -> &'static [UrgencyBucket] {
        &[
            UrgencyBucket::Overdue,
            UrgencyBucket::Today,
            UrgencyBucket::Tomorrow,
            UrgencyBucket::ThisWeek,
            UrgencyBucket::Later,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyBucket::Overdue => "overdue",
            UrgencyBucket::Today => "today",
            UrgencyBucket::Tomorrow => "tomorrow",
            UrgencyBucket::ThisWeek => "this_week",
            UrgencyBucket::Later => "later",
        }
    }
}

impl fmt::Display for UrgencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeliveryStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Overdue,
    DueToday,
    OnTime,
    Pending,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Overdue => "overdue",
            DeliveryStatus::DueToday => "due_today",
            DeliveryStatus::OnTime => "on_time",
            DeliveryStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CheckInKind
// ---------------------------------------------------------------------------

/// The four check-in due dates a task can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInKind {
    Start,
    Midpoint,
    Review,
    Closeout,
}

impl CheckInKind {
    pub fn all() -> &'static [CheckInKind] {
        &[
            CheckInKind::Start,
            CheckInKind::Midpoint,
            CheckInKind::Review,
            CheckInKind::Closeout,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckInKind::Start => "start",
            CheckInKind::Midpoint => "midpoint",
            CheckInKind::Review => "review",
            CheckInKind::Closeout => "closeout",
        }
    }
}

impl fmt::Display for CheckInKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RollupName
// ---------------------------------------------------------------------------

/// Every rollup the coordinator knows how to run. The string form doubles as
/// the key in the merged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupName {
    ByIndicator,
    ByCountry,
    ByProduct,
    ByOrganization,
    ByOutput,
    ByPhase,
    Summary,
    CheckIns,
}

impl RollupName {
    /// The plan behind the merged analytics response.
    pub fn analytics() -> &'static [RollupName] {
        &[
            RollupName::ByIndicator,
            RollupName::ByCountry,
            RollupName::ByProduct,
            RollupName::ByOrganization,
            RollupName::ByOutput,
            RollupName::ByPhase,
            RollupName::Summary,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RollupName::ByIndicator => "by_indicator",
            RollupName::ByCountry => "by_country",
            RollupName::ByProduct => "by_product",
            RollupName::ByOrganization => "by_organization",
            RollupName::ByOutput => "by_output",
            RollupName::ByPhase => "by_phase",
            RollupName::Summary => "summary",
            RollupName::CheckIns => "check_ins",
        }
    }
}

impl fmt::Display for RollupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollup_names_serialize_as_their_str() {
        for name in RollupName::analytics() {
            let json = serde_json::to_string(name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
    }

    #[test]
    fn urgency_buckets_serialize_snake_case() {
        let json = serde_json::to_string(&UrgencyBucket::ThisWeek).unwrap();
        assert_eq!(json, "\"this_week\"");
    }

    #[test]
    fn delivery_status_serializes_snake_case() {
        let json = serde_json::to_string(&DeliveryStatus::DueToday).unwrap();
        assert_eq!(json, "\"due_today\"");
    }
}
