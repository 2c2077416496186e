use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::repository::LastCommit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitDetails,
    pub author: Option<CommitAuthorInfo>,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    pub message: String,
    pub author: CommitAuthor,
    pub committer: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthorInfo {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

impl CommitSummary {
    pub fn authored_at(&self) -> DateTime<Utc> {
        self.commit.author.date
    }
}

impl From<&CommitSummary> for LastCommit {
    fn from(commit: &CommitSummary) -> Self {
        let date = commit
            .commit
            .committer
            .as_ref()
            .map(|c| c.date)
            .unwrap_or(commit.commit.author.date);

        Self {
            sha: commit.sha.clone(),
            message: commit.commit.message.clone(),
            date: Some(date),
        }
    }
}

/// Statistics over a recent commit window. `Default` is the empty report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommitPatternReport {
    pub total_commits: usize,
    pub commit_frequency: f64,
    pub commit_message_quality: f64,
    pub contributor_activity: ContributorActivity,
    pub code_churn: CodeChurn,
}

impl CommitPatternReport {
    pub fn is_empty(&self) -> bool {
        self.total_commits == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContributorActivity {
    pub total_contributors: usize,
    pub main_contributor_percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeChurn {
    pub total_additions: u64,
    pub total_deletions: u64,
    pub churn_ratio: f64,
}
