//! Check-in notifications: every task carries up to four check-in dates,
//! each classified on its own into an urgency bucket.

use crate::records::TaskRecord;
use crate::report::{CheckInItem, CheckInReport};
use crate::status::StatusAliases;
use crate::temporal::Calendar;
use crate::types::CheckInKind;

/// Bucket every check-in date of `tasks`. A date that fails to parse drops
/// only that one check-in.
pub fn classify(tasks: &[TaskRecord], aliases: &StatusAliases, calendar: &Calendar) -> CheckInReport {
    let mut items = Vec::new();
    for task in tasks {
        let state = aliases.resolve(task.status.as_deref());
        for kind in CheckInKind::all() {
            let due = match task.check_in_date(*kind) {
                Ok(Some(d)) => d,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(task = %task.id, kind = %kind.as_str(), error = %e, "skipping malformed check-in");
                    continue;
                }
            };
            let Some(bucket) = calendar.urgency(Some(due), state) else {
                continue;
            };
            items.push(CheckInItem {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                product_id: task.product_id.clone(),
                product_name: task.product_name.clone(),
                kind: *kind,
                due_date: due,
                bucket,
            });
        }
    }

    items.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.task_name.cmp(&b.task_name))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    let mut report = CheckInReport::default();
    for item in items {
        report.push(item);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use crate::types::UrgencyBucket;

    fn task(id: &str, status: &str) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            name: format!("Task {id}"),
            status: Some(status.into()),
            product_id: "p1".into(),
            product_name: "Alpha".into(),
            ..Default::default()
        }
    }

    #[test]
    fn each_check_in_lands_in_its_own_bucket() {
        let mut t = task("t1", "Pending");
        t.checkin_start = Some("2024-03-04".into());
        t.checkin_midpoint = Some("2024-03-05".into());
        t.checkin_review = Some("2024-03-09".into());
        t.checkin_closeout = Some("2024-04-01".into());

        let report = classify(&[t], &StatusAliases::default(), &Fixture::calendar());
        assert_eq!(report.today.len(), 1);
        assert_eq!(report.today[0].kind, CheckInKind::Start);
        assert_eq!(report.tomorrow[0].kind, CheckInKind::Midpoint);
        assert_eq!(report.this_week[0].kind, CheckInKind::Review);
        assert_eq!(report.later[0].kind, CheckInKind::Closeout);
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn past_check_in_is_overdue_unless_completed() {
        let mut open = task("t1", "In Progress");
        open.checkin_start = Some("2024-03-03".into());
        let mut done = task("t2", "Done");
        done.checkin_start = Some("2024-03-03".into());

        let report = classify(&[open, done], &StatusAliases::default(), &Fixture::calendar());
        assert_eq!(report.counts.overdue, 1);
        assert_eq!(report.overdue[0].task_id, "t1");
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn malformed_date_skips_only_that_check_in() {
        let mut t = task("t1", "Pending");
        t.checkin_start = Some("soon".into());
        t.checkin_review = Some("2024-03-05".into());

        let report = classify(&[t], &StatusAliases::default(), &Fixture::calendar());
        assert_eq!(report.total(), 1);
        assert_eq!(report.bucket(UrgencyBucket::Tomorrow)[0].kind, CheckInKind::Review);
    }

    #[test]
    fn items_sorted_by_date_then_task_name() {
        let mut b = task("t2", "Pending");
        b.name = "Bravo".into();
        b.checkin_start = Some("2024-03-20".into());
        let mut a = task("t1", "Pending");
        a.name = "Alpha".into();
        a.checkin_start = Some("2024-03-20".into());
        let mut early = task("t3", "Pending");
        early.name = "Zulu".into();
        early.checkin_closeout = Some("2024-03-15".into());

        let report = classify(&[b, a, early], &StatusAliases::default(), &Fixture::calendar());
        let names: Vec<_> = report.later.iter().map(|i| i.task_name.as_str()).collect();
        assert_eq!(names, vec!["Zulu", "Alpha", "Bravo"]);
    }
}
