use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::repository::{AnalysisData, RepositorySnapshot};

/// Per-file line heuristics; summed into the repository aggregate, never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetric {
    pub path: String,
    pub lines: u64,
    pub complexity: u64,
    pub functions: u64,
    pub classes: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeFile {
    pub path: String,
    /// Blob sha, enough to re-fetch the content.
    pub content_ref: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepositoryStructure {
    pub total_files: usize,
    pub file_types: BTreeMap<String, usize>,
    pub directories: Vec<String>,
    pub code_files: Vec<CodeFile>,
}

/// Sum of the file metrics of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeMetrics {
    pub total_lines: u64,
    pub code_complexity: u64,
    pub function_count: u64,
    pub class_count: u64,
    pub file_metrics: Vec<FileMetric>,
}

impl CodeMetrics {
    pub fn add(&mut self, metric: FileMetric) {
        self.total_lines += metric.lines;
        self.code_complexity += metric.complexity;
        self.function_count += metric.functions;
        self.class_count += metric.classes;
        self.file_metrics.push(metric);
    }
}

impl FromIterator<FileMetric> for CodeMetrics {
    fn from_iter<I: IntoIterator<Item = FileMetric>>(iter: I) -> Self {
        let mut metrics = CodeMetrics::default();
        for metric in iter {
            metrics.add(metric);
        }
        metrics
    }
}

/// Qualitative fields recovered from the insight completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeInsights {
    pub quality_score: u8,
    pub complexity_level: Option<String>,
    pub maintainability: Option<String>,
    pub architecture_pattern: Option<String>,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub tech_insights: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub complexity_score: u64,
    pub maintainability_index: u8,
    pub quality_score: u8,
    pub total_lines: u64,
    pub function_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QualityMetrics {
    pub fn from_analysis(data: Option<&AnalysisData>) -> Self {
        match data {
            Some(data) => Self {
                complexity_score: data.complexity_score,
                maintainability_index: maintainability_index(data.maintainability.as_deref()),
                quality_score: data.quality_score,
                total_lines: data.total_lines,
                function_count: data.function_count,
                message: None,
            },
            None => Self {
                message: Some(
                    "No analysis data available. Please run code analysis first.".to_string(),
                ),
                ..Default::default()
            },
        }
    }
}

pub fn maintainability_index(level: Option<&str>) -> u8 {
    match level.map(|l| l.trim().to_lowercase()).as_deref() {
        Some("excellent") => 10,
        Some("good") => 8,
        Some("fair") => 6,
        Some("poor") => 3,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub repository_id: i64,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositorySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn success(repository: RepositorySnapshot) -> Self {
        Self {
            repository_id: repository.id,
            status: BatchStatus::Success,
            repository: Some(repository),
            error: None,
        }
    }

    pub fn failure(repository_id: i64, error: String) -> Self {
        Self {
            repository_id,
            status: BatchStatus::Error,
            repository: None,
            error: Some(error),
        }
    }
}
