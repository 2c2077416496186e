use std::collections::HashMap;
use std::sync::Arc;

use crate::github::RepositorySource;
use crate::models::{CodeChurn, CommitPatternReport, CommitSummary, ContributorActivity};

const LOW_EFFORT_MESSAGES: [&str; 3] = ["fix", "update", "change"];
const MIN_MESSAGE_LEN: usize = 20;

pub struct CommitPatternAnalyzer {
    source: Arc<dyn RepositorySource>,
    window: u32,
}

impl CommitPatternAnalyzer {
    pub fn new(source: Arc<dyn RepositorySource>, window: u32) -> Self {
        Self { source, window }
    }

    /// Never fails: a retrieval error yields the empty report.
    pub async fn analyze(&self, full_name: &str) -> CommitPatternReport {
        match self.source.list_commits(full_name, self.window).await {
            Ok(commits) => {
                tracing::info!("Summarizing {} commits of {}", commits.len(), full_name);
                summarize(&commits)
            }
            Err(e) => {
                tracing::warn!("Commit analysis skipped for {}: {}", full_name, e);
                CommitPatternReport::default()
            }
        }
    }
}

pub fn summarize(commits: &[CommitSummary]) -> CommitPatternReport {
    if commits.is_empty() {
        return CommitPatternReport::default();
    }

    CommitPatternReport {
        total_commits: commits.len(),
        commit_frequency: commit_frequency(commits),
        commit_message_quality: message_quality(commits),
        contributor_activity: contributor_activity(commits),
        code_churn: code_churn(commits),
    }
}

/// Commits per day between the oldest and newest commit.
fn commit_frequency(commits: &[CommitSummary]) -> f64 {
    let dates = commits.iter().map(|c| c.authored_at());
    let (Some(oldest), Some(newest)) = (dates.clone().min(), dates.max()) else {
        return 0.0;
    };

    let span_days = (newest - oldest).num_seconds() as f64 / 86_400.0;
    if span_days <= 0.0 {
        return 0.0;
    }
    round_to(commits.len() as f64 / span_days, 2)
}

fn message_quality(commits: &[CommitSummary]) -> f64 {
    let descriptive = commits
        .iter()
        .filter(|c| is_descriptive(&c.commit.message))
        .count();
    round_to(descriptive as f64 / commits.len() as f64 * 100.0, 1)
}

fn is_descriptive(message: &str) -> bool {
    message.chars().count() > MIN_MESSAGE_LEN
        && !LOW_EFFORT_MESSAGES
            .iter()
            .any(|m| message.trim().eq_ignore_ascii_case(m))
}

fn contributor_activity(commits: &[CommitSummary]) -> ContributorActivity {
    let mut by_email: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        *by_email.entry(commit.commit.author.email.as_str()).or_insert(0) += 1;
    }

    let top = by_email.values().copied().max().unwrap_or(0);
    ContributorActivity {
        total_contributors: by_email.len(),
        main_contributor_percentage: top as f64 / commits.len() as f64 * 100.0,
    }
}

fn code_churn(commits: &[CommitSummary]) -> CodeChurn {
    let (additions, deletions) = commits
        .iter()
        .filter_map(|c| c.stats.as_ref())
        .fold((0u64, 0u64), |(a, d), s| (a + s.additions, d + s.deletions));

    let churn_ratio = if additions == 0 {
        0.0
    } else {
        round_to(deletions as f64 / additions as f64, 2)
    };

    CodeChurn {
        total_additions: additions,
        total_deletions: deletions,
        churn_ratio,
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
