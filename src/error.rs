use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::crypto::CodecError;

/// Domain outcomes the repositories report and the handlers translate into
/// HTTP statuses. Services pass these through untouched.
#[derive(Debug, Error)]
pub enum AppError {
    /// Task creation referenced a user id with no row behind it.
    #[error("user does not exist")]
    UserNotExists,
    /// The `(task_id, user_id)` pair matched no task row.
    #[error("task not found")]
    TaskNotFound,
    #[error("user not found")]
    UserNotFound,
    /// The per-request deadline elapsed before storage answered.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("passport codec: {0}")]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Bounds a downstream call with the configured per-request deadline. The
/// in-flight future is dropped when the deadline fires.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(AppError::DeadlineExceeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_the_inner_result_through() {
        let ok = bounded(Duration::from_millis(50), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = bounded::<(), _>(Duration::from_millis(50), async {
            Err(AppError::TaskNotFound)
        })
        .await;
        assert!(matches!(err, Err(AppError::TaskNotFound)));
    }

    #[tokio::test]
    async fn bounded_reports_an_elapsed_deadline() {
        let res = bounded(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(AppError::DeadlineExceeded)));
    }
}
