use async_trait::async_trait;
use crate::error::Result;

/// Prompt in, text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
    fn name(&self) -> &str;
}

/// Token budget and sampling temperature of one completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionBudget {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionBudget {
    pub const CODE_INSIGHTS: Self = Self { max_tokens: 800, temperature: 0.3 };
    pub const PROFILE: Self = Self { max_tokens: 1000, temperature: 0.3 };
    pub const CHAT: Self = Self { max_tokens: 300, temperature: 0.7 };
}
