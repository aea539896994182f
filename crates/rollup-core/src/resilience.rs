//! Deadline and fallback around one fan-out.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, RollupError};
use crate::store::CancelFlag;

/// Await `fut` for at most `deadline`. Any error, or running out of time,
/// is logged and turned into `T::default()`; the cancel flag is raised so
/// store reads still in flight stop at their next check.
pub async fn with_fallback<T, F>(label: &str, deadline: Duration, cancel: &CancelFlag, fut: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            cancel.cancel();
            tracing::error!(request = label, error = %e, "serving empty report");
            T::default()
        }
        Err(_) => {
            cancel.cancel();
            let e = RollupError::DeadlineExceeded(deadline.as_millis() as u64);
            tracing::warn!(request = label, error = %e, "serving empty report");
            T::default()
        }
    }
}
