//! Detached execution of state-changing operations
//!
//! A write runs on its own task. If the caller's future is dropped midway, the
//! task keeps running to completion, so a write and the notification that
//! follows it are never cut in half by a disconnect.

use fleet_core::{FleetError, Result};
use std::future::Future;
use tracing::error;

/// Run `operation` on a spawned task and wait for its result
pub(crate) async fn run_detached<F, T>(name: &'static str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(operation).await {
        Ok(result) => result,
        Err(join) => {
            error!(operation = name, error = %join, "detached write did not complete");
            Err(FleetError::internal(format!("{name} task failed: {join}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_result_is_forwarded() {
        let value = run_detached("ok", async { Ok::<_, FleetError>(7) }).await;
        assert_eq!(value.unwrap(), 7);

        let err = run_detached("err", async {
            Err::<(), _>(FleetError::not_found("x"))
        })
        .await;
        assert_matches!(err, Err(FleetError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal() {
        let result: Result<()> = run_detached("boom", async {
            if true {
                panic!("boom");
            }
            Ok(())
        })
        .await;
        assert_matches!(result, Err(FleetError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_write() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();

        let caller = run_detached("slow", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        // Poll once so the task is spawned, then abandon the caller
        let _ = tokio::time::timeout(Duration::from_millis(1), caller).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(done.load(Ordering::SeqCst));
    }
}
