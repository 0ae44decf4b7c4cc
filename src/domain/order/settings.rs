use std::str::FromStr;

use chrono::Duration;
use url::Url;

// ============================================================================
// Bulk Order Settings
// ============================================================================

/// How a bulk order writes its orders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// One commit for every employee; a short product writes nothing
    AllOrNothing,
    /// One commit per employee; earlier employees keep their orders when a
    /// later one runs out of stock
    BestEffort,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all_or_nothing" => Ok(CommitMode::AllOrNothing),
            "best_effort" => Ok(CommitMode::BestEffort),
            other => Err(format!("unknown commit mode `{other}` (expected all_or_nothing or best_effort)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkOrderSettings {
    pub commit_mode: CommitMode,
    pub tracking_ttl: Duration,
    pub tracking_base_url: Url,
}
