use std::path::PathBuf;

use super::error::FeedError;
use super::etherscan::TxListResponse;
use super::types::{RawTransaction, Transaction};
use super::TransactionFeed;

/// Reads an explorer `txlist` export from disk, either the full response
/// envelope or a bare array of transactions. The address argument is ignored.
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Vec<Transaction>, FeedError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            FeedError::Unavailable(format!(
                "Failed to read transaction file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| FeedError::Decode(e.to_string()))?;

        if value.is_array() {
            let raw: Vec<RawTransaction> =
                serde_json::from_value(value).map_err(|e| FeedError::Decode(e.to_string()))?;
            return Ok(raw.iter().map(RawTransaction::normalize).collect());
        }

        let envelope: TxListResponse =
            serde_json::from_value(value).map_err(|e| FeedError::Decode(e.to_string()))?;
        envelope.into_transactions()
    }
}

impl TransactionFeed for JsonFileFeed {
    async fn fetch(&self, _address: &str) -> Result<Vec<Transaction>, FeedError> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_bare_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"hash":"0x01","from":"0xA","to":"0xB","value":"1","timeStamp":"10"}}]"#
        )
        .unwrap();

        let feed = JsonFileFeed::new(file.path());
        let txs = feed.fetch("0xa").await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, "0xb");
    }

    #[tokio::test]
    async fn test_missing_file_is_feed_error() {
        let feed = JsonFileFeed::new("/nonexistent/txlist.json");
        assert!(feed.fetch("0xa").await.is_err());
    }
}
