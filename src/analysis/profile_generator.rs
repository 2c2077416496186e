use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::llm::{
    parse_profile_insights, ChatRequest, CompletionBudget, CompletionProvider, ProfileContext,
    RepositorySummary,
};
use crate::models::{ProfileAnalysis, RepositorySnapshot, User};
use crate::storage::Storage;

pub const PROFILE_PENDING_MESSAGE: &str = "Profile analysis has not been completed yet.";

const POPULAR_REPOSITORIES: usize = 5;
const README_SAMPLES: usize = 3;

pub struct ProfileGenerator {
    llm: Arc<dyn CompletionProvider>,
    config: AnalysisConfig,
}

impl ProfileGenerator {
    pub fn new(llm: Arc<dyn CompletionProvider>, config: AnalysisConfig) -> Self {
        Self { llm, config }
    }

    /// Aggregates the stored repositories of a user into prompt input.
    pub fn gather(
        &self,
        user: &User,
        repos: &[RepositorySnapshot],
        now: DateTime<Utc>,
    ) -> ProfileContext {
        let mut languages: Vec<String> = Vec::new();
        for lang in repos.iter().filter_map(|r| r.language.as_deref()) {
            if !languages.iter().any(|l| l == lang) {
                languages.push(lang.to_string());
            }
        }

        let recent_cutoff = now - Duration::days(self.config.recent_activity_days);
        let recently_active_repos = repos
            .iter()
            .filter(|r| r.last_commit_date().is_some_and(|d| d > recent_cutoff))
            .count();

        let mut popular: Vec<&RepositorySnapshot> = repos.iter().collect();
        popular.sort_by(|a, b| b.stars.cmp(&a.stars));
        let popular_repositories = popular
            .into_iter()
            .take(POPULAR_REPOSITORIES)
            .map(|r| RepositorySummary {
                name: r.name.clone(),
                language: r.language.clone(),
                description: r.description.clone(),
                stars: r.stars,
                recent_commit: r.last_commit.as_ref().map(|c| c.message.clone()),
            })
            .collect();

        let readme_samples = repos
            .iter()
            .filter_map(|r| r.readme_text.as_deref())
            .filter(|text| !text.trim().is_empty())
            .take(README_SAMPLES)
            .map(|text| text.chars().take(self.config.readme_excerpt_chars).collect())
            .collect();

        ProfileContext {
            username: user.username.clone(),
            name: user.name.clone(),
            total_repos: repos.len(),
            public_repos: repos.iter().filter(|r| !r.private).count(),
            languages,
            total_stars: repos.iter().map(|r| r.stars as u64).sum(),
            total_forks: repos.iter().map(|r| r.forks as u64).sum(),
            recently_active_repos,
            recent_activity_days: self.config.recent_activity_days,
            popular_repositories,
            readme_samples,
        }
    }

    /// Generates and stores a fresh profile analysis, replacing any previous one.
    pub async fn generate(&self, storage: &Storage, user: &User) -> Result<ProfileAnalysis> {
        let repos = storage.list_repositories(user.id)?;
        tracing::info!(
            "Generating profile analysis for {} from {} repositories",
            user.username,
            repos.len()
        );

        let prompt = self.gather(user, &repos, Utc::now()).to_prompt();
        tracing::debug!("Profile prompt is {} bytes", prompt.len());

        let budget = CompletionBudget::PROFILE;
        let response = self
            .llm
            .complete(&prompt, budget.max_tokens, budget.temperature)
            .await?;
        let insights = parse_profile_insights(&response);

        let analysis = storage.save_profile_analysis(user.id, &insights, Utc::now())?;
        tracing::info!(
            "Stored profile analysis for {} ({} skills, {} technologies)",
            user.username,
            analysis.skills.len(),
            analysis.technologies.len()
        );
        Ok(analysis)
    }

    /// Answers a question about the user from their stored profile analysis.
    pub async fn chat(
        &self,
        storage: &Storage,
        user: &User,
        question: &str,
        context: Option<&str>,
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(Error::Validation("question must not be empty".to_string()));
        }

        let Some(analysis) = storage.get_profile_analysis(user.id)? else {
            tracing::info!("No profile analysis for {}, skipping completion", user.username);
            return Ok(PROFILE_PENDING_MESSAGE.to_string());
        };

        let prompt = ChatRequest {
            user,
            analysis: &analysis,
            question,
            context,
        }
        .to_prompt();

        let budget = CompletionBudget::CHAT;
        let answer = self
            .llm
            .complete(&prompt, budget.max_tokens, budget.temperature)
            .await?;
        Ok(answer.trim().to_string())
    }
}
