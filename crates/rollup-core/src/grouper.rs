//! Grouping of flat task records along one or more dimensions.
//!
//! A [`Dimension`] is a fn-pointer key extractor; [`Grouping`] accumulates a
//! [`Tally`] per distinct key combination. Keys are held in a `BTreeMap`, so
//! iteration order is stable before the final ranking is applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{PreparedTask, TaskFact, TaskRecord};
use crate::temporal::Calendar;
use crate::types::TaskState;

// ---------------------------------------------------------------------------
// Percentages
// ---------------------------------------------------------------------------

/// `part * 100 / whole`, rounded to two fraction digits. Zero when `whole`
/// is zero. Every percentage the engine reports goes through here.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / whole as f64)
}

/// Round to two fraction digits.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
    pub overdue: u64,
}

impl Tally {
    pub fn add(&mut self, fact: &TaskFact, calendar: &Calendar) {
        self.total += 1;
        match fact.state {
            TaskState::Completed => self.completed += 1,
            TaskState::InProgress => self.in_progress += 1,
            TaskState::Pending => self.pending += 1,
        }
        if calendar.is_overdue(fact.planned_end, fact.state) {
            self.overdue += 1;
        }
    }

    pub fn completion_percentage(&self) -> f64 {
        percentage(self.completed, self.total)
    }

    /// Has tasks and all of them are completed.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn counts(&self) -> Counts {
        Counts {
            total_tasks: self.total,
            completed_tasks: self.completed,
            in_progress_tasks: self.in_progress,
            pending_tasks: self.pending,
            overdue_count: self.overdue,
            completion_percentage: self.completion_percentage(),
        }
    }
}

/// Serialized form of a [`Tally`], flattened into every rollup row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub pending_tasks: u64,
    pub overdue_count: u64,
    pub completion_percentage: f64,
}

// ---------------------------------------------------------------------------
// Keys and dimensions
// ---------------------------------------------------------------------------

/// One component of a group key: the entity id plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyPart {
    pub id: String,
    pub name: String,
}

impl KeyPart {
    /// Falls back to the id when the name is missing.
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        let id = id.into();
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        Self { id, name }
    }
}

pub type GroupKey = Vec<KeyPart>;

/// A grouping dimension over task records.
pub struct Dimension {
    pub name: &'static str,
    pub extract: fn(&TaskRecord) -> Option<KeyPart>,
}

pub const PRODUCT: Dimension = Dimension {
    name: "product",
    extract: |t| Some(KeyPart::new(&t.product_id, Some(&t.product_name))),
};

pub const COUNTRY: Dimension = Dimension {
    name: "country",
    extract: |t| Some(KeyPart::new(&t.country_id, t.country_name.as_deref())),
};

pub const ORGANIZATION: Dimension = Dimension {
    name: "organization",
    extract: |t| {
        t.organization_id
            .as_ref()
            .map(|id| KeyPart::new(id, t.organization_name.as_deref()))
    },
};

pub const OUTPUT: Dimension = Dimension {
    name: "output",
    extract: |t| {
        t.output_id
            .as_ref()
            .map(|id| KeyPart::new(id, t.output_name.as_deref()))
    },
};

pub const PHASE: Dimension = Dimension {
    name: "phase",
    extract: |t| {
        t.phase_id
            .as_ref()
            .map(|id| KeyPart::new(id, t.phase_name.as_deref()))
    },
};

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Grouping {
    calendar: Calendar,
    groups: BTreeMap<GroupKey, Tally>,
}

impl Grouping {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            groups: BTreeMap::new(),
        }
    }

    /// Make sure `key` is reported even if no record lands in it.
    pub fn seed(&mut self, key: GroupKey) {
        self.groups.entry(key).or_default();
    }

    pub fn add(&mut self, key: GroupKey, fact: &TaskFact) {
        self.groups.entry(key).or_default().add(fact, &self.calendar);
    }

    /// Group `tasks` by the combination of `dims`. A task for which any
    /// dimension yields no key is left out.
    pub fn extend(&mut self, tasks: &[PreparedTask], dims: &[Dimension]) {
        for task in tasks {
            let key: Option<GroupKey> = dims.iter().map(|d| (d.extract)(&task.record)).collect();
            if let Some(key) = key {
                self.add(key, &task.fact);
            }
        }
    }

    pub fn get(&self, key: &[KeyPart]) -> Option<&Tally> {
        self.groups.get(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> impl Iterator<Item = (GroupKey, Tally)> {
        self.groups.into_iter()
    }
}

/// Group `tasks` along `dims` in one call.
pub fn group_by(tasks: &[PreparedTask], dims: &[Dimension], calendar: Calendar) -> Grouping {
    let mut grouping = Grouping::new(calendar);
    grouping.extend(tasks, dims);
    grouping
}

/// Overall tally with no grouping.
pub fn tally_all(tasks: &[PreparedTask], calendar: &Calendar) -> Tally {
    let mut tally = Tally::default();
    for task in tasks {
        tally.add(&task.fact, calendar);
    }
    tally
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// What the deterministic ordering of a rollup looks at.
pub trait Ranked {
    /// Sorted descending.
    fn primary(&self) -> f64;
    /// Sorted descending, after `primary`.
    fn secondary(&self) -> f64 {
        0.0
    }
    fn display_name(&self) -> &str;
    fn key(&self) -> &str;
}

/// Percentage descending, then name ascending, then key ascending.
pub fn rank<R: Ranked>(rows: &mut [R]) {
    rows.sort_by(|a, b| {
        b.primary()
            .total_cmp(&a.primary())
            .then_with(|| b.secondary().total_cmp(&a.secondary()))
            .then_with(|| a.display_name().cmp(b.display_name()))
            .then_with(|| a.key().cmp(b.key()))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
