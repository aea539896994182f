//! Classification of dated records against a reference day.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::clock::Clock;
use crate::types::{DeliveryStatus, TaskState, UrgencyBucket};

/// "Today" plus the week convention. Built once per request from the
/// injected clock, so every rollup in a fan-out sees the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    today: NaiveDate,
    week_start: Weekday,
}

impl Calendar {
    pub fn new(today: NaiveDate, week_start: Weekday) -> Self {
        Self { today, week_start }
    }

    pub fn from_clock(clock: &dyn Clock, week_start: Weekday) -> Self {
        Self::new(clock.today(), week_start)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today + Days::new(1)
    }

    /// Last day of the calendar week containing today.
    pub fn end_of_week(&self) -> NaiveDate {
        let offset = (7 + self.today.weekday().num_days_from_monday()
            - self.week_start.num_days_from_monday())
            % 7;
        self.today + Days::new(u64::from(6 - offset))
    }

    /// Strictly before today and not completed.
    pub fn is_overdue(&self, date: Option<NaiveDate>, state: TaskState) -> bool {
        matches!(date, Some(d) if d < self.today) && !state.is_completed()
    }

    /// Urgency bucket for one due date. `None` for a missing date and for a
    /// past date on a completed record.
    pub fn urgency(&self, due: Option<NaiveDate>, state: TaskState) -> Option<UrgencyBucket> {
        let due = due?;
        if due < self.today {
            return (!state.is_completed()).then_some(UrgencyBucket::Overdue);
        }
        if due == self.today {
            return Some(UrgencyBucket::Today);
        }
        if due == self.tomorrow() {
            return Some(UrgencyBucket::Tomorrow);
        }
        if due <= self.end_of_week() {
            return Some(UrgencyBucket::ThisWeek);
        }
        Some(UrgencyBucket::Later)
    }

    /// Delivery status of a product-level date.
    pub fn delivery(&self, date: Option<NaiveDate>, complete: bool) -> DeliveryStatus {
        if complete {
            return DeliveryStatus::OnTime;
        }
        match date {
            None => DeliveryStatus::Pending,
            Some(d) if d < self.today => DeliveryStatus::Overdue,
            Some(d) if d == self.today => DeliveryStatus::DueToday,
            Some(_) => DeliveryStatus::OnTime,
        }
    }
}
