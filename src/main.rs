use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gitinsight::models::{
    BatchItemResult, CommitPatternReport, DiscoverPage, DiscoverQuery, EngineerCard,
    EngineerDetail, ExperienceLevel, ProfileAnalysis, ProfileAnalysisView, QualityMetrics,
    RepositoryFilter, RepositorySnapshot, RepositorySort, SimilarEngineers, Trending,
};
use gitinsight::{AnalysisConfig, AnalysisPipeline, ClaudeProvider, Config, GitHubClient, Storage};

#[derive(Parser, Debug)]
#[command(name = "gitinsight")]
#[command(version = "0.1.0")]
#[command(about = "Analyze GitHub repositories and build developer profiles")]
struct Args {
    /// Output format (json, text)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Database path, overrides DATABASE_PATH
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a user and their repositories from GitHub
    Sync {
        #[arg(short, long)]
        username: String,
    },
    /// List stored repositories of a user
    Repos {
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        public_only: bool,
        /// name, popular or recent
        #[arg(long, default_value = "name")]
        sort: RepositorySort,
    },
    /// Run code analysis on one repository
    Analyze { repository_id: i64 },
    /// Run code analysis on several repositories in order
    Batch {
        #[arg(required = true)]
        repository_ids: Vec<i64>,
    },
    /// Quality metrics from the stored analysis
    Metrics { repository_id: i64 },
    /// Stored analysis insights
    Insights { repository_id: i64 },
    /// Commit pattern statistics
    Commits { repository_id: i64 },
    /// Generate or show a profile analysis
    Profile {
        #[arg(short, long)]
        username: String,
        /// Use cached profile if available
        #[arg(long)]
        cached: bool,
    },
    /// Ask a question about an engineer
    Chat {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        context: Option<String>,
    },
    /// Search engineers by skills, experience and technology
    Discover {
        /// Comma separated skills, any of which must match
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
        #[arg(long)]
        experience_level: Option<ExperienceLevel>,
        #[arg(long)]
        technology: Option<String>,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "20")]
        per_page: usize,
        /// Leave this user out of the results
        #[arg(long)]
        viewer: Option<String>,
    },
    /// Engineers with similar skills and technologies
    Similar {
        #[arg(short, long)]
        username: String,
    },
    /// Most common skills and technologies
    Trending,
    /// Detailed engineer page
    Engineer {
        user_id: i64,
        #[arg(long)]
        viewer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gitinsight=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    let database = args.database.clone().unwrap_or_else(|| config.database_path.clone());
    let storage = Storage::new(&database)?;

    let github = GitHubClient::new(&config.github_token)?;
    let llm = ClaudeProvider::new(
        config.anthropic_api_key.clone(),
        Some(config.anthropic_model.clone()),
    )?;

    let pipeline = AnalysisPipeline::new(github, llm, storage, AnalysisConfig::from(&config));

    match &args.command {
        Command::Sync { username } => {
            let repos = pipeline.sync_repositories(username).await?;
            emit(&repos, &args, format_repositories)?;
        }
        Command::Repos { username, language, public_only, sort } => {
            let user = pipeline.find_user(username)?;
            let filter = RepositoryFilter {
                language: language.clone(),
                public_only: *public_only,
                sort: *sort,
            };
            let repos = pipeline.list_repositories(user.id, &filter)?;
            emit(&repos, &args, format_repositories)?;
        }
        Command::Analyze { repository_id } => {
            let repo = pipeline.run_full_analysis(*repository_id).await?;
            emit(&repo, &args, format_analysis)?;
        }
        Command::Batch { repository_ids } => {
            let results = pipeline.run_batch_analysis(repository_ids).await;
            emit(&results, &args, format_batch)?;
        }
        Command::Metrics { repository_id } => {
            let metrics = pipeline.get_quality_metrics(*repository_id)?;
            emit(&metrics, &args, format_metrics)?;
        }
        Command::Insights { repository_id } => {
            let data = pipeline.repository_insights(*repository_id)?;
            emit(&data, &args, |d| serde_json::to_string_pretty(d).unwrap_or_default())?;
        }
        Command::Commits { repository_id } => {
            let report = pipeline.run_commit_analysis(*repository_id).await?;
            emit(&report, &args, format_commits)?;
        }
        Command::Profile { username, cached } => {
            let user = pipeline.find_user(username)?;
            if *cached {
                match pipeline.get_profile_analysis(user.id) {
                    Ok(view) if !view.needs_update => {
                        tracing::info!("Using cached profile from {:?}", view.analysis.analyzed_at);
                        emit(&view, &args, format_profile_view)?;
                        return Ok(());
                    }
                    Ok(_) => tracing::info!("Cached profile is stale, performing fresh analysis"),
                    Err(e) if e.is_not_found() => {
                        tracing::info!("No cached profile found, performing fresh analysis")
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            tracing::info!("Starting profile analysis for: {}", username);
            let analysis = pipeline.run_profile_analysis(user.id).await?;
            emit(&analysis, &args, format_profile)?;
        }
        Command::Chat { username, question, context } => {
            let user = pipeline.find_user(username)?;
            let answer = pipeline.chat(user.id, question, context.as_deref()).await?;
            emit(&answer, &args, |a| a.clone())?;
        }
        Command::Discover { skills, experience_level, technology, page, per_page, viewer } => {
            let exclude_user = match viewer {
                Some(name) => Some(pipeline.find_user(name)?.id),
                None => None,
            };
            let query = DiscoverQuery {
                skills: skills
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                experience_level: *experience_level,
                technology: technology.clone(),
                page: *page,
                per_page: *per_page,
                exclude_user,
            };
            let page = pipeline.discover(&query)?;
            emit(&page, &args, format_discover)?;
        }
        Command::Similar { username } => {
            let user = pipeline.find_user(username)?;
            let similar = pipeline.similar_to(user.id)?;
            emit(&similar, &args, format_similar)?;
        }
        Command::Trending => {
            let trending = pipeline.trending()?;
            emit(&trending, &args, format_trending)?;
        }
        Command::Engineer { user_id, viewer } => {
            let viewer = match viewer {
                Some(name) => Some(pipeline.find_user(name)?.id),
                None => None,
            };
            let detail = pipeline.engineer_profile(*user_id, viewer)?;
            emit(&detail, &args, format_engineer)?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(value: &T, args: &Args, text: impl Fn(&T) -> String) -> anyhow::Result<()> {
    let output = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(value)?,
        _ => text(value),
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output)?;
        tracing::info!("Output written to: {}", path);
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_repositories(repos: &Vec<RepositorySnapshot>) -> String {
    let mut output = format!("\n=== Repositories ({}) ===\n\n", repos.len());
    for repo in repos {
        output.push_str(&format!(
            "  [{}] {} ({}) ★{}{}\n",
            repo.id,
            repo.full_name,
            repo.language.as_deref().unwrap_or("unknown"),
            repo.stars,
            if repo.analysis_data.is_some() { " analyzed" } else { "" }
        ));
    }
    output
}

fn format_analysis(repo: &RepositorySnapshot) -> String {
    let mut output = format!("\n=== Code Analysis: {} ===\n\n", repo.full_name);
    let Some(ref data) = repo.analysis_data else {
        output.push_str("No analysis data stored.\n");
        return output;
    };

    output.push_str(&format!("Total lines: {}\n", data.total_lines));
    output.push_str(&format!("Complexity: {}\n", data.complexity_score));
    output.push_str(&format!("Functions: {}\n", data.function_count));
    output.push_str(&format!("Classes: {}\n", data.class_count));
    output.push_str(&format!("Quality score: {}/10\n", data.quality_score));

    let fields = [
        ("Complexity level", &data.complexity_level),
        ("Maintainability", &data.maintainability),
        ("Architecture", &data.architecture_pattern),
        ("Strengths", &data.strengths),
        ("Improvements", &data.improvements),
        ("Tech insights", &data.tech_insights),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            output.push_str(&format!("{}: {}\n", label, value));
        }
    }

    output.push_str(&format!(
        "\nAnalyzed on: {}\n",
        data.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output
}

fn format_batch(results: &Vec<BatchItemResult>) -> String {
    let mut output = String::from("\n=== Batch Analysis ===\n\n");
    for result in results {
        match (&result.repository, &result.error) {
            (Some(repo), _) => {
                output.push_str(&format!("  + {} {}\n", result.repository_id, repo.full_name))
            }
            (None, Some(error)) => {
                output.push_str(&format!("  - {} {}\n", result.repository_id, error))
            }
            (None, None) => output.push_str(&format!("  ? {}\n", result.repository_id)),
        }
    }
    output
}

fn format_metrics(metrics: &QualityMetrics) -> String {
    if let Some(ref message) = metrics.message {
        return message.clone();
    }
    format!(
        "Complexity: {}\nMaintainability index: {}/10\nQuality score: {}/10\n\
Total lines: {}\nFunctions: {}",
        metrics.complexity_score,
        metrics.maintainability_index,
        metrics.quality_score,
        metrics.total_lines,
        metrics.function_count
    )
}

fn format_commits(report: &CommitPatternReport) -> String {
    if report.is_empty() {
        return "No commits available.".to_string();
    }
    format!(
        "Commits: {}\nPer day: {:.2}\nDescriptive messages: {:.1}%\n\
Contributors: {} (top {:.0}%)\nChurn: +{} -{} (ratio {:.2})",
        report.total_commits,
        report.commit_frequency,
        report.commit_message_quality,
        report.contributor_activity.total_contributors,
        report.contributor_activity.main_contributor_percentage,
        report.code_churn.total_additions,
        report.code_churn.total_deletions,
        report.code_churn.churn_ratio
    )
}

fn format_profile(analysis: &ProfileAnalysis) -> String {
    let mut output = String::from("\n=== Profile Analysis ===\n\n");

    if let Some(ref summary) = analysis.summary {
        output.push_str(&format!("{}\n\n", summary));
    }
    if let Some(level) = analysis.experience_level {
        output.push_str(&format!("Experience Level: {}\n", level));
    }
    output.push_str(&format!("Skills: {}\n", analysis.formatted_skills()));
    output.push_str(&format!("Technologies: {}\n", analysis.formatted_technologies()));
    output.push_str(&format!("Strengths: {}\n", analysis.formatted_strengths()));
    if let Some(ref personality) = analysis.personality {
        output.push_str(&format!("Personality: {}\n", personality));
    }
    if let Some(ref style) = analysis.communication_style {
        output.push_str(&format!("Communication: {}\n", style));
    }
    if let Some(at) = analysis.analyzed_at {
        output.push_str(&format!("\nAnalyzed on: {}\n", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    output
}

fn format_profile_view(view: &ProfileAnalysisView) -> String {
    let mut output = format_profile(&view.analysis);
    if view.needs_update {
        output.push_str("(out of date)\n");
    }
    output
}

fn format_card(card: &EngineerCard) -> String {
    format!(
        "  [{}] {} {} repos, ★{} | {}\n",
        card.id,
        card.username,
        card.repository_count,
        card.total_stars,
        card.skills.join(", ")
    )
}

fn format_discover(page: &DiscoverPage) -> String {
    let mut output = format!(
        "\n=== Engineers (page {}/{}, {} total) ===\n\n",
        page.pagination.current_page,
        page.pagination.total_pages.max(1),
        page.pagination.total_count
    );
    for card in &page.engineers {
        output.push_str(&format_card(card));
    }
    output
}

fn format_similar(similar: &SimilarEngineers) -> String {
    let mut output = String::from("\n=== Similar Engineers ===\n\n");
    if let Some(ref message) = similar.message {
        output.push_str(&format!("{}\n", message));
    }
    for ranked in &similar.engineers {
        output.push_str(&format!("{:>5.1}%", ranked.similarity_score));
        output.push_str(&format_card(&ranked.card));
    }
    output
}

fn format_trending(trending: &Trending) -> String {
    let mut output = String::from("\n=== Trending Skills ===\n\n");
    for entry in &trending.trending_skills {
        output.push_str(&format!("  {} ({})\n", entry.name, entry.count));
    }
    output.push_str("\n=== Trending Technologies ===\n\n");
    for entry in &trending.trending_technologies {
        output.push_str(&format!("  {} ({})\n", entry.name, entry.count));
    }
    output
}

fn format_engineer(detail: &EngineerDetail) -> String {
    let card = &detail.card;
    let mut output = format!("\n=== Engineer: {} ===\n\n", card.username);

    if let Some(ref name) = card.name {
        output.push_str(&format!("Name: {}\n", name));
    }
    if let Some(ref summary) = card.summary {
        output.push_str(&format!("Summary: {}\n", summary));
    }
    output.push_str(&format!(
        "Repositories: {} (★{})\n",
        card.repository_count, card.total_stars
    ));

    output.push_str("\nTop Repositories:\n");
    for repo in &detail.top_repositories {
        output.push_str(&format!(
            "  - {} ({}) ★{}\n",
            repo.name,
            repo.language.as_deref().unwrap_or("unknown"),
            repo.stars
        ));
    }

    output.push_str("\nLanguages:\n");
    for (language, count) in &detail.languages_used {
        output.push_str(&format!("  - {}: {}\n", language, count));
    }
    output
}
