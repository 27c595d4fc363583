use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a tracker user. `id` is the comparison key, `login` is for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub login: String,
}

impl UserRef {
    pub fn new(id: u64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.login)
    }
}

/// A pull request as delivered by the tracker.
///
/// Field names follow the GitHub REST representation so that API responses and
/// exported JSON files deserialize directly; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub user: UserRef,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_by: Option<UserRef>,
    /// GitHub reports `null` while mergeability is still being computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mergeable: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

impl PullRequestRecord {
    /// Merged wins over closed: the tracker also stamps `closed_at` on merged records.
    pub fn state(&self) -> PrState {
        if self.merged_at.is_some() {
            PrState::Merged
        } else if self.closed_at.is_some() {
            PrState::Closed
        } else {
            PrState::Open
        }
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn is_mergeable(&self) -> bool {
        self.mergeable.unwrap_or(false)
    }

    pub fn is_self_merged(&self) -> bool {
        self.is_merged()
            && self
                .merged_by
                .as_ref()
                .is_some_and(|m| m.id == self.user.id)
    }
}

/// Whole days between two instants, truncated toward zero.
pub fn elapsed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days()
}
