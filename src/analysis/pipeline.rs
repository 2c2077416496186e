use std::sync::Arc;

use chrono::{Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::code_analyzer::CodeAnalyzer;
use crate::analysis::commit_patterns::CommitPatternAnalyzer;
use crate::analysis::directory::EngineerDirectory;
use crate::analysis::profile_generator::ProfileGenerator;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::github::RepositorySource;
use crate::llm::CompletionProvider;
use crate::models::{
    AnalysisData, BatchItemResult, CommitPatternReport, DiscoverPage, DiscoverQuery,
    EngineerDetail, LastCommit, NewRepository, NewUser, ProfileAnalysis, ProfileAnalysisView,
    QualityMetrics, RepositoryFilter, RepositorySnapshot, SimilarEngineers, Trending, User,
};
use crate::storage::Storage;

pub struct AnalysisPipeline {
    source: Arc<dyn RepositorySource>,
    code_analyzer: CodeAnalyzer,
    commit_analyzer: CommitPatternAnalyzer,
    profile_generator: ProfileGenerator,
    directory: EngineerDirectory,
    storage: Storage,
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(
        source: impl RepositorySource + 'static,
        llm: impl CompletionProvider + 'static,
        storage: Storage,
        config: AnalysisConfig,
    ) -> Self {
        let source: Arc<dyn RepositorySource> = Arc::new(source);
        let llm: Arc<dyn CompletionProvider> = Arc::new(llm);

        Self {
            code_analyzer: CodeAnalyzer::new(
                source.clone(),
                llm.clone(),
                config.max_analyzed_files,
            ),
            commit_analyzer: CommitPatternAnalyzer::new(source.clone(), config.commit_window),
            profile_generator: ProfileGenerator::new(llm, config.clone()),
            directory: EngineerDirectory::new(config.similarity_threshold),
            source,
            storage,
            config,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn repository(&self, repository_id: i64) -> Result<RepositorySnapshot> {
        self.storage
            .get_repository(repository_id)?
            .ok_or_else(|| Error::RepoNotFound(repository_id.to_string()))
    }

    fn user(&self, user_id: i64) -> Result<User> {
        self.storage
            .get_user(user_id)?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    pub fn find_user(&self, username: &str) -> Result<User> {
        self.storage
            .get_user_by_username(username)?
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    /// Pulls the user and their repositories from GitHub into the store.
    /// README and latest commit lookups are best effort.
    pub async fn sync_repositories(&self, username: &str) -> Result<Vec<RepositorySnapshot>> {
        tracing::info!("Fetching GitHub profile for: {}", username);
        let github_user = self.source.get_user(username).await?;
        let user = self.storage.upsert_user(&NewUser::from(&github_user))?;

        tracing::info!("Fetching repositories...");
        let repos = self.source.list_repositories(&github_user.login).await?;
        tracing::info!("Found {} repositories to sync", repos.len());

        let mut synced = Vec::with_capacity(repos.len());
        for repo in &repos {
            let mut record = NewRepository::from(repo);

            record.readme_text = match self.source.get_readme(&repo.full_name).await {
                Ok(readme) => readme.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    tracing::warn!("README of {} unavailable: {}", repo.full_name, e);
                    None
                }
            };

            record.last_commit = match self.source.list_commits(&repo.full_name, 1).await {
                Ok(commits) => commits.first().map(LastCommit::from),
                Err(e) => {
                    tracing::warn!("Latest commit of {} unavailable: {}", repo.full_name, e);
                    None
                }
            };

            synced.push(self.storage.upsert_repository(user.id, &record)?);
        }

        tracing::info!("Synced {} repositories for {}", synced.len(), username);
        Ok(synced)
    }

    pub fn list_repositories(
        &self,
        user_id: i64,
        filter: &RepositoryFilter,
    ) -> Result<Vec<RepositorySnapshot>> {
        Ok(filter.apply(self.storage.list_repositories(user_id)?))
    }

    pub async fn run_full_analysis(&self, repository_id: i64) -> Result<RepositorySnapshot> {
        let repo = self.repository(repository_id)?;
        self.code_analyzer.run(&self.storage, &repo).await
    }

    pub fn get_quality_metrics(&self, repository_id: i64) -> Result<QualityMetrics> {
        let repo = self.repository(repository_id)?;
        Ok(QualityMetrics::from_analysis(repo.analysis_data.as_ref()))
    }

    pub fn repository_insights(&self, repository_id: i64) -> Result<AnalysisData> {
        let repo = self.repository(repository_id)?;
        repo.analysis_data
            .ok_or(Error::AnalysisNotFound(repo.full_name))
    }

    pub async fn run_commit_analysis(&self, repository_id: i64) -> Result<CommitPatternReport> {
        let repo = self.repository(repository_id)?;
        Ok(self.commit_analyzer.analyze(&repo.full_name).await)
    }

    /// Analyzes the repositories one after another. Every id gets a result,
    /// in input order, whether or not its run succeeded.
    pub async fn run_batch_analysis(&self, repository_ids: &[i64]) -> Vec<BatchItemResult> {
        let pb = progress_bar(repository_ids.len() as u64, "repos");
        let mut results = Vec::with_capacity(repository_ids.len());

        for &id in repository_ids {
            let result = match self.run_full_analysis(id).await {
                Ok(repo) => BatchItemResult::success(repo),
                Err(e) => {
                    tracing::warn!("Batch item {} failed: {}", id, e);
                    BatchItemResult::failure(id, e.to_string())
                }
            };
            results.push(result);
            pb.inc(1);
        }

        pb.finish_with_message("Batch analysis complete");
        results
    }

    pub async fn run_profile_analysis(&self, user_id: i64) -> Result<ProfileAnalysis> {
        let user = self.user(user_id)?;
        self.profile_generator.generate(&self.storage, &user).await
    }

    pub fn get_profile_analysis(&self, user_id: i64) -> Result<ProfileAnalysisView> {
        let user = self.user(user_id)?;
        let analysis = self
            .storage
            .get_profile_analysis(user_id)?
            .ok_or_else(|| Error::ProfileNotFound(user.username.clone()))?;

        let repo_updates = self
            .storage
            .list_repositories(user_id)?
            .into_iter()
            .map(|r| r.updated_at);
        let needs_update = analysis.needs_update(
            repo_updates,
            Utc::now(),
            Duration::days(self.config.staleness_days),
        );

        Ok(ProfileAnalysisView { analysis, needs_update })
    }

    pub async fn chat(
        &self,
        user_id: i64,
        question: &str,
        context: Option<&str>,
    ) -> Result<String> {
        let user = self.user(user_id)?;
        self.profile_generator
            .chat(&self.storage, &user, question, context)
            .await
    }

    pub fn discover(&self, query: &DiscoverQuery) -> Result<DiscoverPage> {
        self.directory.discover(&self.storage, query)
    }

    pub fn similar_to(&self, user_id: i64) -> Result<SimilarEngineers> {
        self.directory.similar_to(&self.storage, user_id)
    }

    pub fn trending(&self) -> Result<Trending> {
        self.directory.trending(&self.storage)
    }

    pub fn engineer_profile(&self, user_id: i64, viewer: Option<i64>) -> Result<EngineerDetail> {
        self.directory.engineer_profile(&self.storage, user_id, viewer)
    }
}

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
        unit
    );
    match ProgressStyle::with_template(&template) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => tracing::debug!("Default progress style kept: {}", e),
    }
    pb
}
