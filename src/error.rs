use serde::Serialize;
use thiserror::Error;

use crate::analysis::code_analyzer::AnalysisStage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("No analysis data available for {0}. Please run code analysis first.")]
    AnalysisNotFound(String),

    #[error("Profile analysis not found for {0}. Please run analysis first.")]
    ProfileNotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Code analysis aborted after {stage}: {source}")]
    AnalysisAborted {
        stage: AnalysisStage,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Body returned to callers when an operation fails.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

impl Error {
    /// True for reads of something that has not been produced yet, as opposed
    /// to a failure of the operation itself.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserNotFound(_)
                | Error::RepoNotFound(_)
                | Error::AnalysisNotFound(_)
                | Error::ProfileNotFound(_)
        )
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: self.to_string(),
        }
    }
}
