use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag names that always exist and can never be renamed or deleted. They
/// give the caller a stable palette regardless of usage history.
pub const PRELOADED_TAGS: [&str; 4] = ["trip", "train", "petrol", "house"];

/// Usage statistics for one tag.
///
/// `transaction_count`, `total_amount`, and `last_used` are derived by the
/// aggregator and rebuilt from the transaction log on every change; only
/// `name` and `created_at` survive recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagStat {
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub transaction_count: u64,
    /// Signed running total: income adds, expense subtracts, transfers do
    /// not contribute.
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl TagStat {
    /// Creates a tag with zeroed statistics.
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
            transaction_count: 0,
            total_amount: 0.0,
            last_used: None,
        }
    }

    /// Whether the name belongs to the protected preloaded set.
    pub fn is_preloaded(name: &str) -> bool {
        PRELOADED_TAGS.contains(&name)
    }
}
