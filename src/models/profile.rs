use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Lead => "Lead",
        }
    }

    /// Finds the first level word in free text, e.g. "Senior (8+ years)".
    pub fn detect(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_alphanumeric())
            .find_map(|word| word.parse().ok())
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" => Ok(ExperienceLevel::Lead),
            other => Err(format!("unknown experience level: {}", other)),
        }
    }
}

/// Profile fields recovered from a completion, before they are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileInsights {
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub personality: Option<String>,
    pub strengths: Vec<String>,
    pub communication_style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub technologies: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub personality: Option<String>,
    pub strengths: Vec<String>,
    pub communication_style: Option<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl ProfileAnalysis {
    /// Stale when never stamped, older than `window`, or when any owned
    /// repository changed after the analysis ran.
    pub fn needs_update<I>(&self, repo_updates: I, now: DateTime<Utc>, window: Duration) -> bool
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let Some(analyzed_at) = self.analyzed_at else {
            return true;
        };

        analyzed_at < now - window || repo_updates.into_iter().any(|u| u > analyzed_at)
    }

    pub fn formatted_skills(&self) -> String {
        self.skills.join(", ")
    }

    pub fn formatted_technologies(&self) -> String {
        self.technologies.join(", ")
    }

    pub fn formatted_strengths(&self) -> String {
        self.strengths.join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileAnalysisView {
    #[serde(flatten)]
    pub analysis: ProfileAnalysis,
    pub needs_update: bool,
}
