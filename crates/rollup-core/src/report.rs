//! Response shapes. Every report's `Default` is the empty state the dashboard
//! renders when the store is unavailable: all keys present, arrays empty,
//! numbers zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::grouper::{Counts, KeyPart, Ranked, Tally};
use crate::types::{CheckInKind, DeliveryStatus, RollupName, UrgencyBucket};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row of a plain dimension rollup (country, organization, output, phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_count: Option<u64>,
}

impl GroupRow {
    pub fn new(key: KeyPart, tally: &Tally) -> Self {
        Self {
            id: key.id,
            name: key.name,
            counts: tally.counts(),
            products_count: None,
        }
    }
}

impl Ranked for GroupRow {
    fn primary(&self) -> f64 {
        self.counts.completion_percentage
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub output: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
    pub products_count: u64,
    pub adoption_percentage: f64,
}

impl Ranked for IndicatorRow {
    fn primary(&self) -> f64 {
        self.adoption_percentage
    }
    fn secondary(&self) -> f64 {
        self.counts.completion_percentage
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub country_id: String,
    pub country: String,
    pub output: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_status: DeliveryStatus,
}

impl Ranked for ProductRow {
    fn primary(&self) -> f64 {
        self.counts.completion_percentage
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn key(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_products: u64,
    pub total_indicators: u64,
    #[serde(flatten)]
    pub counts: Counts,
}

/// The merged response of the analytics fan-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub by_indicator: Vec<IndicatorRow>,
    pub by_country: Vec<GroupRow>,
    pub by_product: Vec<ProductRow>,
    pub by_organization: Vec<GroupRow>,
    pub by_output: Vec<GroupRow>,
    pub by_phase: Vec<GroupRow>,
    pub summary: Summary,
    /// Rollups that failed and were replaced by an empty array.
    pub degraded: Vec<RollupName>,
}

// ---------------------------------------------------------------------------
// Indicator / product metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorMetrics {
    pub indicators: Vec<IndicatorRow>,
    pub total_indicators: u64,
    pub total_products: u64,
    pub average_adoption: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub overdue: u64,
    pub due_today: u64,
    pub on_time: u64,
    pub pending: u64,
}

impl DeliveryCounts {
    pub fn add(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Overdue => self.overdue += 1,
            DeliveryStatus::DueToday => self.due_today += 1,
            DeliveryStatus::OnTime => self.on_time += 1,
            DeliveryStatus::Pending => self.pending += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub products: Vec<ProductRow>,
    pub delivery: DeliveryCounts,
}

// ---------------------------------------------------------------------------
// Check-ins
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInItem {
    pub task_id: String,
    pub task_name: String,
    pub product_id: String,
    pub product_name: String,
    pub kind: CheckInKind,
    pub due_date: NaiveDate,
    pub bucket: UrgencyBucket,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub overdue: u64,
    pub today: u64,
    pub tomorrow: u64,
    pub this_week: u64,
    pub later: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckInReport {
    pub overdue: Vec<CheckInItem>,
    pub today: Vec<CheckInItem>,
    pub tomorrow: Vec<CheckInItem>,
    pub this_week: Vec<CheckInItem>,
    pub later: Vec<CheckInItem>,
    pub counts: BucketCounts,
}

impl CheckInReport {
    pub fn bucket(&self, bucket: UrgencyBucket) -> &[CheckInItem] {
        match bucket {
            UrgencyBucket::Overdue => &self.overdue,
            UrgencyBucket::Today => &self.today,
            UrgencyBucket::Tomorrow => &self.tomorrow,
            UrgencyBucket::ThisWeek => &self.this_week,
            UrgencyBucket::Later => &self.later,
        }
    }

    pub(crate) fn push(&mut self, item: CheckInItem) {
        let (list, count) = match item.bucket {
            UrgencyBucket::Overdue => (&mut self.overdue, &mut self.counts.overdue),
            UrgencyBucket::Today => (&mut self.today, &mut self.counts.today),
            UrgencyBucket::Tomorrow => (&mut self.tomorrow, &mut self.counts.tomorrow),
            UrgencyBucket::ThisWeek => (&mut self.this_week, &mut self.counts.this_week),
            UrgencyBucket::Later => (&mut self.later, &mut self.counts.later),
        };
        list.push(item);
        *count += 1;
    }

    pub fn total(&self) -> u64 {
        let c = &self.counts;
        c.overdue + c.today + c.tomorrow + c.this_week + c.later
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_analytics_has_every_key() {
        let json = serde_json::to_value(AnalyticsReport::default()).unwrap();
        for key in [
            "by_indicator",
            "by_country",
            "by_product",
            "by_organization",
            "by_output",
            "by_phase",
            "degraded",
        ] {
            assert_eq!(json[key], serde_json::json!([]), "{key}");
        }
        assert_eq!(json["summary"]["total_tasks"], 0);
        assert_eq!(json["summary"]["completion_percentage"], 0.0);
    }

    #[test]
    fn group_row_flattens_counts() {
        let row = GroupRow::new(KeyPart::new("ke", Some("Kenya")), &Tally::default());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], "ke");
        assert_eq!(json["total_tasks"], 0);
        assert_eq!(json["completion_percentage"], 0.0);
        assert!(json.get("products_count").is_none());
    }

    #[test]
    fn default_check_in_report_is_empty() {
        let report = CheckInReport::default();
        assert_eq!(report.total(), 0);
        for bucket in UrgencyBucket::all() {
            assert!(report.bucket(*bucket).is_empty());
        }
    }
}
