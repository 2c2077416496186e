pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod llm;
pub mod analysis;
pub mod storage;

pub use config::{AnalysisConfig, Config};
pub use error::{Error, ErrorPayload, Result};
pub use github::{GitHubClient, RepositorySource};
pub use llm::{ClaudeProvider, CompletionProvider};
pub use analysis::AnalysisPipeline;
pub use storage::Storage;
