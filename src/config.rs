use crate::error::{Error, Result};
use std::env;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub database_path: String,
    pub max_analyzed_files: usize,
    pub commit_window: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN")
            .map_err(|_| Error::Config("GITHUB_TOKEN environment variable not set".to_string()))?;

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;

        let anthropic_model = env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "gitinsight.db".to_string());

        let max_analyzed_files = env::var("MAX_ANALYZED_FILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let commit_window = env::var("COMMIT_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        Ok(Self {
            github_token,
            anthropic_api_key,
            anthropic_model,
            database_path,
            max_analyzed_files,
            commit_window,
        })
    }
}

/// Tunables shared by the analysis components.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Largest code files fetched per repository run.
    pub max_analyzed_files: usize,
    /// Commits pulled for pattern analysis.
    pub commit_window: u32,
    pub staleness_days: i64,
    pub recent_activity_days: i64,
    pub readme_excerpt_chars: usize,
    pub similarity_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_analyzed_files: 10,
            commit_window: 100,
            staleness_days: 7,
            recent_activity_days: 90,
            readme_excerpt_chars: 1000,
            similarity_threshold: 0.1,
        }
    }
}

impl From<&Config> for AnalysisConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_analyzed_files: config.max_analyzed_files,
            commit_window: config.commit_window,
            ..Default::default()
        }
    }
}
