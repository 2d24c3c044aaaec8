//! Timeout wrapper for ledger calls.
//!
//! A session actor must never stall on a slow ledger, so every call it makes
//! goes through [`with_timeout`].

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{LedgerError, LedgerResult};

/// Default bound for a single ledger call (5 seconds)
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a ledger call, failing with [`LedgerError::Timeout`] if it takes
/// longer than `duration`.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_result_through() {
        let result = with_timeout(DEFAULT_LEDGER_TIMEOUT, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_times_out() {
        let result: LedgerResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, LedgerError::Timeout(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
