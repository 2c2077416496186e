use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository as listed by the GitHub API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub fork: bool,
    pub default_branch: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitTree {
    pub sha: String,
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    pub sha: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastCommit {
    pub sha: String,
    pub message: String,
    pub date: Option<DateTime<Utc>>,
}

/// Result of the latest successful code analysis run, replaced wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisData {
    pub total_lines: u64,
    pub complexity_score: u64,
    pub function_count: u64,
    pub class_count: u64,
    pub quality_score: u8,
    pub complexity_level: Option<String>,
    pub maintainability: Option<String>,
    pub architecture_pattern: Option<String>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub tech_insights: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Stored repository metadata plus optional analysis results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositorySnapshot {
    pub id: i64,
    pub user_id: i64,
    pub github_id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub default_branch: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
    pub readme_text: Option<String>,
    pub last_commit: Option<LastCommit>,
    pub analysis_data: Option<AnalysisData>,
    pub updated_at: DateTime<Utc>,
}

impl RepositorySnapshot {
    pub fn last_commit_date(&self) -> Option<DateTime<Utc>> {
        self.last_commit.as_ref().and_then(|c| c.date)
    }

    /// Ref used for tree listing; GitHub resolves `HEAD` to the default branch.
    pub fn tree_ref(&self) -> &str {
        self.default_branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("HEAD")
    }
}

/// Repository metadata as written by a sync; never touches `analysis_data`.
#[derive(Debug, Clone)]
pub struct NewRepository {
    pub github_id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub default_branch: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
    pub readme_text: Option<String>,
    pub last_commit: Option<LastCommit>,
}

impl From<&Repository> for NewRepository {
    fn from(repo: &Repository) -> Self {
        Self {
            github_id: repo.id,
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            description: repo.description.clone(),
            private: repo.private,
            language: repo.language.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            default_branch: repo.default_branch.clone(),
            clone_url: repo.clone_url.clone(),
            html_url: repo.html_url.clone(),
            readme_text: None,
            last_commit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositorySort {
    #[default]
    Name,
    Popular,
    Recent,
}

impl std::str::FromStr for RepositorySort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(RepositorySort::Name),
            "popular" => Ok(RepositorySort::Popular),
            "recent" => Ok(RepositorySort::Recent),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    pub language: Option<String>,
    pub public_only: bool,
    pub sort: RepositorySort,
}

impl RepositoryFilter {
    pub fn apply(&self, repos: Vec<RepositorySnapshot>) -> Vec<RepositorySnapshot> {
        let mut repos: Vec<_> = repos
            .into_iter()
            .filter(|r| !self.public_only || !r.private)
            .filter(|r| match &self.language {
                Some(lang) => r.language.as_deref() == Some(lang.as_str()),
                None => true,
            })
            .collect();

        match self.sort {
            RepositorySort::Name => repos.sort_by(|a, b| a.name.cmp(&b.name)),
            RepositorySort::Popular => repos.sort_by(|a, b| b.stars.cmp(&a.stars)),
            RepositorySort::Recent => {
                repos.sort_by(|a, b| b.last_commit_date().cmp(&a.last_commit_date()))
            }
        }

        repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(
        id: i64,
        name: &str,
        language: &str,
        stars: u32,
        private: bool,
        days_ago: Option<i64>,
    ) -> RepositorySnapshot {
        let now = Utc::now();
        RepositorySnapshot {
            id,
            user_id: 1,
            github_id: id as u64,
            name: name.to_string(),
            full_name: format!("octocat/{}", name),
            description: None,
            private,
            language: Some(language.to_string()),
            stars,
            forks: 0,
            default_branch: None,
            clone_url: None,
            html_url: None,
            readme_text: None,
            last_commit: days_ago.map(|days| LastCommit {
                sha: format!("sha{}", id),
                message: "Update".to_string(),
                date: Some(now - Duration::days(days)),
            }),
            analysis_data: None,
            updated_at: now,
        }
    }

    fn repos() -> Vec<RepositorySnapshot> {
        vec![
            snapshot(1, "zeta", "Rust", 5, false, Some(30)),
            snapshot(2, "alpha", "Ruby", 50, true, None),
            snapshot(3, "mid", "Rust", 12, false, Some(2)),
        ]
    }

    fn names(repos: &[RepositorySnapshot]) -> Vec<&str> {
        repos.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_default_sort_is_by_name() {
        let sorted = RepositoryFilter::default().apply(repos());
        assert_eq!(names(&sorted), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_popular_sort_orders_by_stars() {
        let filter = RepositoryFilter {
            sort: RepositorySort::Popular,
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(repos())), vec!["alpha", "mid", "zeta"]);

        let filter = RepositoryFilter {
            sort: RepositorySort::Popular,
            public_only: true,
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(repos())), vec!["mid", "zeta"]);
    }

    #[test]
    fn test_recent_sort_puts_uncommitted_last() {
        let filter = RepositoryFilter {
            sort: RepositorySort::Recent,
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(repos())), vec!["mid", "zeta", "alpha"]);
    }

    #[test]
    fn test_language_filter() {
        let filter = RepositoryFilter {
            language: Some("Ruby".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(repos())), vec!["alpha"]);

        let filter = RepositoryFilter {
            language: Some("Ruby".into()),
            public_only: true,
            ..Default::default()
        };
        assert!(filter.apply(repos()).is_empty());
    }

    #[test]
    fn test_sort_parses_case_insensitively() {
        assert_eq!("Recent".parse::<RepositorySort>(), Ok(RepositorySort::Recent));
        assert!("stars".parse::<RepositorySort>().is_err());
    }
}
