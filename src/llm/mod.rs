pub mod provider;
pub mod claude;
pub mod prompts;
pub mod parser;

pub use provider::{CompletionBudget, CompletionProvider};
pub use claude::ClaudeProvider;
pub use prompts::{ChatRequest, CodeInsightRequest, ProfileContext, RepositorySummary};
pub use parser::{parse_code_insights, parse_profile_insights, LabeledFields};
