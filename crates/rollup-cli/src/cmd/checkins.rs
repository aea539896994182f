use anyhow::Context;
use rollup_core::types::UrgencyBucket;

use super::{block_on, FilterArgs, Globals};
use crate::output::{print_json, print_table};

pub fn run(globals: &Globals, filters: FilterArgs) -> anyhow::Result<()> {
    let (_, engine) = globals.engine()?;
    let report = block_on(engine.check_ins(filters.into()))?.context("check-ins failed")?;

    if globals.json {
        return print_json(&report);
    }

    if report.total() == 0 {
        println!("No upcoming or overdue check-ins.");
        return Ok(());
    }

    let mut rows = Vec::new();
    for bucket in UrgencyBucket::all() {
        for item in report.bucket(*bucket) {
            rows.push(vec![
                bucket.as_str().to_string(),
                item.due_date.to_string(),
                item.kind.to_string(),
                item.task_name.clone(),
                item.product_name.clone(),
            ]);
        }
    }
    print_table(&["BUCKET", "DUE", "KIND", "TASK", "PRODUCT"], rows);
    Ok(())
}
