pub mod error;
pub mod etherscan;
pub mod file;
pub mod types;

use std::future::Future;
use std::time::Duration;

pub use error::FeedError;
pub use types::{RawTransaction, Transaction};

/// Source of the transaction history for one address.
///
/// Implementations make a single attempt per call; retry policy belongs to the caller.
pub trait TransactionFeed: Send + Sync {
    fn fetch(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<Transaction>, FeedError>> + Send;
}

/// Fetch with a caller-specified deadline. No retry is attempted.
pub async fn fetch_with_timeout<F: TransactionFeed>(
    feed: &F,
    address: &str,
    timeout: Duration,
) -> Result<Vec<Transaction>, FeedError> {
    match tokio::time::timeout(timeout, feed.fetch(address)).await {
        Ok(result) => result,
        Err(_) => Err(FeedError::Timeout {
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowFeed;

    impl TransactionFeed for SlowFeed {
        async fn fetch(&self, _address: &str) -> Result<Vec<Transaction>, FeedError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    struct EmptyFeed;

    impl TransactionFeed for EmptyFeed {
        async fn fetch(&self, _address: &str) -> Result<Vec<Transaction>, FeedError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let result = fetch_with_timeout(&SlowFeed, "0xabc", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(FeedError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let result = fetch_with_timeout(&EmptyFeed, "0xabc", Duration::from_secs(1)).await;
        assert!(result.unwrap().is_empty());
    }
}
