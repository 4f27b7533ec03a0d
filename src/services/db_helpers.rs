use std::{future::Future, time::Duration};

use crate::errors::AppResult;

/// Runs a store call, turning an overrun into a retryable [`AppError::Timeout`].
///
/// [`AppError::Timeout`]: crate::errors::AppError::Timeout
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, call).await?
}
