//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Wrap a future with a timeout.
///
/// Meant for whole, bounded operations (listing models, probing the server),
/// not for streams that may legitimately run for minutes.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, LlmError>>,
) -> Result<T, LlmError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(duration.as_millis() as u64)),
    }
}
