use serde::{Deserialize, Serialize};

use crate::feed::RawTransaction;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub knowledge_base_entries: usize,
}

/// Score a caller-supplied history instead of fetching one.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub address: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    #[serde(default)]
    pub real_time_flags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
