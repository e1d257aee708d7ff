//! Status snapshot of queued and in-progress requests.

use serde::{Deserialize, Serialize};

/// State of a request visible in the queue. Queued and in-progress
/// requests are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractState {
    Extracting,
}

/// One entry of [`Dispatcher::status`](crate::Dispatcher::status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStatus {
    pub name: String,
    pub is_dir: bool,
    pub state: ExtractState,
}

impl ExtractStatus {
    pub fn extracting(name: impl Into<String>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
            state: ExtractState::Extracting,
        }
    }
}
