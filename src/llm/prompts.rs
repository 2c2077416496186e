use crate::models::{CodeMetrics, ProfileAnalysis, RepositorySnapshot, User};

pub const SYSTEM_PROMPT: &str = r#"You are an experienced software engineer reviewing source
repositories and developer activity. Answer exactly in the format requested by the user message.
When a labeled format is requested, start every field on a new line with its uppercase label
followed by a colon, and do not add other uppercase labels."#;

pub mod code_labels {
    pub const QUALITY_SCORE: &str = "QUALITY_SCORE";
    pub const COMPLEXITY_LEVEL: &str = "COMPLEXITY_LEVEL";
    pub const MAINTAINABILITY: &str = "MAINTAINABILITY";
    pub const ARCHITECTURE_PATTERN: &str = "ARCHITECTURE_PATTERN";
    pub const STRENGTHS: &str = "STRENGTHS";
    pub const IMPROVEMENTS: &str = "IMPROVEMENTS";
    pub const TECH_INSIGHTS: &str = "TECH_INSIGHTS";

    pub const ALL: [&str; 7] = [
        QUALITY_SCORE,
        COMPLEXITY_LEVEL,
        MAINTAINABILITY,
        ARCHITECTURE_PATTERN,
        STRENGTHS,
        IMPROVEMENTS,
        TECH_INSIGHTS,
    ];
}

pub mod profile_labels {
    pub const SUMMARY: &str = "SUMMARY";
    pub const SKILLS: &str = "SKILLS";
    pub const TECHNOLOGIES: &str = "TECHNOLOGIES";
    pub const EXPERIENCE: &str = "EXPERIENCE";
    pub const PERSONALITY: &str = "PERSONALITY";
    pub const STRENGTHS: &str = "STRENGTHS";
    pub const COMMUNICATION: &str = "COMMUNICATION";

    pub const ALL: [&str; 7] = [
        SUMMARY,
        SKILLS,
        TECHNOLOGIES,
        EXPERIENCE,
        PERSONALITY,
        STRENGTHS,
        COMMUNICATION,
    ];
}

#[derive(Debug, Clone)]
pub struct CodeInsightRequest<'a> {
    pub repository: &'a RepositorySnapshot,
    pub metrics: &'a CodeMetrics,
}

impl<'a> CodeInsightRequest<'a> {
    pub fn new(repository: &'a RepositorySnapshot, metrics: &'a CodeMetrics) -> Self {
        Self { repository, metrics }
    }

    pub fn to_prompt(&self) -> String {
        let repo = self.repository;
        let metrics = self.metrics;

        let mut prompt = format!(
            "Provide technical insights for the repository '{}' \
based on the code analysis below.\n\n",
            repo.full_name
        );

        prompt.push_str("## Repository\n");
        prompt.push_str(&format!("- Name: {}\n", repo.name));
        prompt.push_str(&format!(
            "- Primary language: {}\n",
            repo.language.as_deref().unwrap_or("unknown")
        ));
        prompt.push_str(&format!(
            "- Description: {}\n\n",
            repo.description.as_deref().unwrap_or("")
        ));

        prompt.push_str("## Code metrics\n");
        prompt.push_str(&format!("- Total lines: {}\n", metrics.total_lines));
        prompt.push_str(&format!("- Total complexity: {}\n", metrics.code_complexity));
        prompt.push_str(&format!("- Functions: {}\n", metrics.function_count));
        prompt.push_str(&format!("- Classes: {}\n", metrics.class_count));
        prompt.push_str(&format!("- Files analyzed: {}\n\n", metrics.file_metrics.len()));

        prompt.push_str("## Files\n");
        for file in &metrics.file_metrics {
            prompt.push_str(&format!(
                "- {}: {} lines, complexity {}\n",
                file.path, file.lines, file.complexity
            ));
        }

        prompt.push_str(
            "\nRespond in exactly this format:\n\n\
QUALITY_SCORE: [quality score from 1 to 10]\n\
COMPLEXITY_LEVEL: [Low/Medium/High]\n\
MAINTAINABILITY: [Poor/Fair/Good/Excellent]\n\
ARCHITECTURE_PATTERN: [architecture pattern in use]\n\
STRENGTHS: [strengths of the code]\n\
IMPROVEMENTS: [suggested improvements]\n\
TECH_INSIGHTS: [technical insights]\n",
        );
        prompt
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepositorySummary {
    pub name: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub stars: u32,
    pub recent_commit: Option<String>,
}

/// Cross-repository aggregate fed to the profile prompt.
#[derive(Debug, Clone, Default)]
pub struct ProfileContext {
    pub username: String,
    pub name: Option<String>,
    pub total_repos: usize,
    pub public_repos: usize,
    pub languages: Vec<String>,
    pub total_stars: u64,
    pub total_forks: u64,
    pub recently_active_repos: usize,
    pub recent_activity_days: i64,
    pub popular_repositories: Vec<RepositorySummary>,
    pub readme_samples: Vec<String>,
}

impl ProfileContext {
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::from(
            "Write a detailed profile of this software engineer \
based on the GitHub data below.\n\n",
        );

        prompt.push_str("## User\n");
        prompt.push_str(&format!("- Username: {}\n", self.username));
        prompt.push_str(&format!("- Name: {}\n\n", self.name.as_deref().unwrap_or("")));

        prompt.push_str("## Repository statistics\n");
        prompt.push_str(&format!("- Total repositories: {}\n", self.total_repos));
        prompt.push_str(&format!("- Public repositories: {}\n", self.public_repos));
        prompt.push_str(&format!("- Languages: {}\n", self.languages.join(", ")));
        prompt.push_str(&format!("- Total stars: {}\n", self.total_stars));
        prompt.push_str(&format!("- Total forks: {}\n", self.total_forks));
        prompt.push_str(&format!(
            "- Repositories with commits in the last {} days: {}\n\n",
            self.recent_activity_days, self.recently_active_repos
        ));

        prompt.push_str("## Popular repositories\n");
        for repo in &self.popular_repositories {
            prompt.push_str(&format!(
                "- {} ({}, {} stars): {}\n",
                repo.name,
                repo.language.as_deref().unwrap_or("unknown"),
                repo.stars,
                repo.description.as_deref().unwrap_or("")
            ));
            if let Some(message) = &repo.recent_commit {
                let subject = message.lines().next().unwrap_or_default();
                prompt.push_str(&format!("  Latest commit: {}\n", subject));
            }
        }

        prompt.push_str("\n## README samples\n");
        prompt.push_str(&self.readme_samples.join("\n---\n"));

        prompt.push_str(
            "\n\nRespond in exactly this format:\n\n\
SUMMARY: [2-3 sentence overall picture of the engineer]\n\
SKILLS: [main skills, comma separated]\n\
TECHNOLOGIES: [technologies used, comma separated]\n\
EXPERIENCE: [one of Junior/Mid/Senior/Lead]\n\
PERSONALITY: [programming style and traits]\n\
STRENGTHS: [strengths, comma separated]\n\
COMMUNICATION: [likely communication style]\n",
        );
        prompt
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub user: &'a User,
    pub analysis: &'a ProfileAnalysis,
    pub question: &'a str,
    pub context: Option<&'a str>,
}

impl<'a> ChatRequest<'a> {
    pub fn to_prompt(&self) -> String {
        let name = self.user.display_name();
        let analysis = self.analysis;

        let mut prompt = format!(
            "You are an assistant who knows the software engineer {} well.\n\
Answer the question using the analysis below.\n\n",
            name
        );

        prompt.push_str("## Basics\n");
        prompt.push_str(&format!("- Name: {}\n", name));
        prompt.push_str(&format!(
            "- Experience level: {}\n",
            analysis.experience_level.map(|l| l.as_str()).unwrap_or("unknown")
        ));
        prompt.push_str(&format!("- Summary: {}\n\n", analysis.summary.as_deref().unwrap_or("")));

        prompt.push_str("## Skills and technologies\n");
        prompt.push_str(&format!("- Skills: {}\n", analysis.formatted_skills()));
        prompt.push_str(&format!("- Technologies: {}\n", analysis.formatted_technologies()));
        prompt.push_str(&format!("- Strengths: {}\n\n", analysis.formatted_strengths()));

        prompt.push_str("## Traits\n");
        prompt.push_str(&format!(
            "- Personality: {}\n",
            analysis.personality.as_deref().unwrap_or("")
        ));
        prompt.push_str(&format!(
            "- Communication style: {}\n\n",
            analysis.communication_style.as_deref().unwrap_or("")
        ));

        prompt.push_str(&format!("Question: {}\n", self.question));
        if let Some(context) = self.context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!("Additional context: {}\n", context));
        }

        prompt.push_str(&format!(
            "\nKeep the answer friendly and specific so the reader becomes curious about {}. \
Answer in at most 200 characters.\n",
            name
        ));
        prompt
    }
}
