use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::analysis::file_metrics::FileMetricAnalyzer;
use crate::analysis::structure::StructureScanner;
use crate::error::{Error, Result};
use crate::github::RepositorySource;
use crate::llm::{parse_code_insights, CodeInsightRequest, CompletionBudget, CompletionProvider};
use crate::models::{AnalysisData, CodeFile, CodeInsights, CodeMetrics, RepositorySnapshot};
use crate::storage::Storage;

/// Progress of one code analysis run. Errors report the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Idle,
    StructureFetched,
    FilesAnalyzed,
    InsightsGenerated,
    Persisted,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Idle => "Idle",
            AnalysisStage::StructureFetched => "StructureFetched",
            AnalysisStage::FilesAnalyzed => "FilesAnalyzed",
            AnalysisStage::InsightsGenerated => "InsightsGenerated",
            AnalysisStage::Persisted => "Persisted",
        };
        f.write_str(name)
    }
}

pub struct CodeAnalyzer {
    source: Arc<dyn RepositorySource>,
    llm: Arc<dyn CompletionProvider>,
    scanner: StructureScanner,
    file_analyzer: FileMetricAnalyzer,
    max_files: usize,
}

impl CodeAnalyzer {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        llm: Arc<dyn CompletionProvider>,
        max_files: usize,
    ) -> Self {
        Self {
            source,
            llm,
            scanner: StructureScanner::new(),
            file_analyzer: FileMetricAnalyzer::new(),
            max_files,
        }
    }

    /// Runs the whole analysis and replaces the stored analysis data. On
    /// failure the stored data is left as it was.
    pub async fn run(
        &self,
        storage: &Storage,
        repo: &RepositorySnapshot,
    ) -> Result<RepositorySnapshot> {
        tracing::info!("Starting code analysis of {}", repo.full_name);
        let mut stage = AnalysisStage::Idle;

        match self.run_stages(storage, repo, &mut stage).await {
            Ok(updated) => {
                tracing::info!("Code analysis of {} finished", repo.full_name);
                Ok(updated)
            }
            Err(e) => {
                tracing::error!(
                    "Code analysis of {} aborted after {}: {}",
                    repo.full_name,
                    stage,
                    e
                );
                Err(Error::AnalysisAborted {
                    stage,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn run_stages(
        &self,
        storage: &Storage,
        repo: &RepositorySnapshot,
        stage: &mut AnalysisStage,
    ) -> Result<RepositorySnapshot> {
        let tree = self
            .source
            .get_tree(&repo.full_name, repo.tree_ref(), true)
            .await?;
        let structure = self.scanner.scan(&tree);
        advance(stage, AnalysisStage::StructureFetched, repo);

        let selected = structure.select_largest(self.max_files);
        tracing::debug!(
            "{} of {} code files selected in {}",
            selected.len(),
            structure.code_files.len(),
            repo.full_name
        );
        let metrics = self.analyze_files(&repo.full_name, &selected).await;
        advance(stage, AnalysisStage::FilesAnalyzed, repo);

        let prompt = CodeInsightRequest::new(repo, &metrics).to_prompt();
        tracing::debug!("Insight prompt is {} bytes", prompt.len());
        let budget = CompletionBudget::CODE_INSIGHTS;
        let response = self
            .llm
            .complete(&prompt, budget.max_tokens, budget.temperature)
            .await?;
        let insights = parse_code_insights(&response);
        advance(stage, AnalysisStage::InsightsGenerated, repo);

        let data = analysis_data(&metrics, insights);
        storage.save_analysis_data(repo.id, &data)?;
        advance(stage, AnalysisStage::Persisted, repo);

        storage
            .get_repository(repo.id)?
            .ok_or_else(|| Error::RepoNotFound(repo.full_name.clone()))
    }

    /// Fetches and measures each file; unreadable files are skipped.
    pub async fn analyze_files(&self, full_name: &str, files: &[CodeFile]) -> CodeMetrics {
        let mut metrics = CodeMetrics::default();

        for file in files {
            let bytes = match self.source.get_file_content(full_name, &file.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Skipping {} in {}: {}", file.path, full_name, e);
                    continue;
                }
            };

            match String::from_utf8(bytes) {
                Ok(content) => metrics.add(self.file_analyzer.analyze(&file.path, &content)),
                Err(_) => {
                    tracing::warn!("Skipping {} in {}: not valid UTF-8", file.path, full_name)
                }
            }
        }

        metrics
    }
}

fn advance(stage: &mut AnalysisStage, next: AnalysisStage, repo: &RepositorySnapshot) {
    tracing::info!("{}: {} -> {}", repo.full_name, stage, next);
    *stage = next;
}

fn analysis_data(metrics: &CodeMetrics, insights: CodeInsights) -> AnalysisData {
    AnalysisData {
        total_lines: metrics.total_lines,
        complexity_score: metrics.code_complexity,
        function_count: metrics.function_count,
        class_count: metrics.class_count,
        quality_score: insights.quality_score,
        complexity_level: insights.complexity_level,
        maintainability: insights.maintainability,
        architecture_pattern: insights.architecture_pattern,
        strengths: insights.strengths,
        improvements: insights.improvements,
        tech_insights: insights.tech_insights,
        analyzed_at: Utc::now(),
    }
}
