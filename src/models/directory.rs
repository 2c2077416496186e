use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{ExperienceLevel, ProfileAnalysis};
use super::repository::{AnalysisData, RepositorySnapshot};
use super::user::User;

/// Public card of an engineer with an optional profile analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineerCard {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub repository_count: usize,
    pub total_stars: u64,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub personality: Option<String>,
    pub strengths: Vec<String>,
    pub communication_style: Option<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl EngineerCard {
    pub fn new(
        user: &User,
        profile: Option<&ProfileAnalysis>,
        repos: &[RepositorySnapshot],
    ) -> Self {
        let total_stars = repos.iter().map(|r| r.stars as u64).sum();

        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            repository_count: repos.len(),
            total_stars,
            summary: profile.and_then(|p| p.summary.clone()),
            skills: profile.map(|p| p.skills.clone()).unwrap_or_default(),
            technologies: profile.map(|p| p.technologies.clone()).unwrap_or_default(),
            experience_level: profile.and_then(|p| p.experience_level),
            personality: profile.and_then(|p| p.personality.clone()),
            strengths: profile.map(|p| p.strengths.clone()).unwrap_or_default(),
            communication_style: profile.and_then(|p| p.communication_style.clone()),
            analyzed_at: profile.and_then(|p| p.analyzed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopRepository {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub html_url: Option<String>,
    pub analysis_data: Option<AnalysisData>,
}

impl From<&RepositorySnapshot> for TopRepository {
    fn from(repo: &RepositorySnapshot) -> Self {
        Self {
            id: repo.id,
            name: repo.name.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            stars: repo.stars,
            forks: repo.forks,
            html_url: repo.html_url.clone(),
            analysis_data: repo.analysis_data.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineerDetail {
    #[serde(flatten)]
    pub card: EngineerCard,
    pub top_repositories: Vec<TopRepository>,
    pub languages_used: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscoverQuery {
    pub skills: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub technology: Option<String>,
    pub page: usize,
    pub per_page: usize,
    /// Usually the viewer, who should not discover themselves.
    #[serde(skip)]
    pub exclude_user: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverPage {
    pub engineers: Vec<EngineerCard>,
    pub pagination: Pagination,
    pub filters: DiscoverQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedEngineer {
    #[serde(flatten)]
    pub card: EngineerCard,
    /// Combined similarity as a percentage, one decimal.
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimilarEngineers {
    pub engineers: Vec<RankedEngineer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendingEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trending {
    pub trending_skills: Vec<TrendingEntry>,
    pub trending_technologies: Vec<TrendingEntry>,
}
