use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use gitinsight::analysis::profile_generator::PROFILE_PENDING_MESSAGE;
use gitinsight::analysis::AnalysisStage;
use gitinsight::models::{
    BatchStatus, CommitAuthor, CommitDetails, CommitSummary, DiscoverQuery, GitHubUser,
    NewRepository, NewUser, Repository, RepositoryOwner, TreeEntry, TreeEntryKind,
};
use gitinsight::{
    AnalysisConfig, AnalysisPipeline, CompletionProvider, Error, RepositorySource, Result,
};

#[derive(Default)]
struct MockSource {
    user: Option<GitHubUser>,
    repositories: Vec<Repository>,
    trees: HashMap<String, Vec<TreeEntry>>,
    files: HashMap<(String, String), Vec<u8>>,
    readmes: HashMap<String, Vec<u8>>,
    commits: HashMap<String, Vec<CommitSummary>>,
}

impl MockSource {
    fn with_file(mut self, full_name: &str, path: &str, content: Vec<u8>) -> Self {
        self.trees.entry(full_name.to_string()).or_default().push(TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Blob,
            sha: format!("sha-{}", path),
            size: Some(content.len() as u64),
        });
        self.files.insert((full_name.to_string(), path.to_string()), content);
        self
    }
}

#[async_trait]
impl RepositorySource for MockSource {
    async fn get_user(&self, username: &str) -> Result<GitHubUser> {
        self.user
            .clone()
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    async fn list_repositories(&self, _owner: &str) -> Result<Vec<Repository>> {
        Ok(self.repositories.clone())
    }

    async fn get_tree(
        &self,
        full_name: &str,
        _git_ref: &str,
        _recursive: bool,
    ) -> Result<Vec<TreeEntry>> {
        self.trees
            .get(full_name)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("Failed to get tree of {}: 500", full_name)))
    }

    async fn get_file_content(&self, full_name: &str, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(&(full_name.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("Failed to get {}: 404", path)))
    }

    async fn get_readme(&self, full_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.readmes.get(full_name).cloned())
    }

    async fn list_commits(&self, full_name: &str, per_page: u32) -> Result<Vec<CommitSummary>> {
        let commits = self
            .commits
            .get(full_name)
            .ok_or_else(|| {
                Error::GitHubApi(format!("Failed to list commits of {}: 409", full_name))
            })?;
        Ok(commits.iter().take(per_page as usize).cloned().collect())
    }
}

#[derive(Clone)]
struct MockCompletion {
    response: String,
    fail: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<(u32, f32)>>>,
}

impl MockCompletion {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, _prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push((max_tokens, temperature));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Completion("service unavailable".into()));
        }
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

const INSIGHTS: &str =
    "QUALITY_SCORE: 8\nCOMPLEXITY_LEVEL: Low\nMAINTAINABILITY: Good\nSTRENGTHS: Small files";

fn ruby_source(lines: usize, branching: usize) -> Vec<u8> {
    (0..lines)
        .map(|i| if i < branching { "return if done" } else { "value = 1" })
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

fn record(github_id: u64, full_name: &str) -> NewRepository {
    let name = full_name.split('/').last().unwrap_or(full_name).to_string();
    NewRepository {
        github_id,
        name,
        full_name: full_name.to_string(),
        description: None,
        private: false,
        language: Some("Ruby".into()),
        stars: github_id as u32,
        forks: 0,
        default_branch: Some("main".into()),
        clone_url: None,
        html_url: None,
        readme_text: None,
        last_commit: None,
    }
}

fn seed_user(pipeline: &AnalysisPipeline, github_id: u64, username: &str) -> i64 {
    pipeline
        .storage()
        .upsert_user(&NewUser {
            github_id,
            username: username.to_string(),
            name: None,
            email: None,
            avatar_url: None,
        })
        .unwrap()
        .id
}

fn seed_repo(pipeline: &AnalysisPipeline, user_id: i64, github_id: u64, full_name: &str) -> i64 {
    pipeline
        .storage()
        .upsert_repository(user_id, &record(github_id, full_name))
        .unwrap()
        .id
}

#[tokio::test]
async fn test_full_analysis_sums_selected_files() {
    let source = MockSource::default()
        .with_file("octo/app", "app/big.rb", ruby_source(100, 2))
        .with_file("octo/app", "app/mid.rb", ruby_source(50, 1))
        .with_file("octo/app", "app/small.rb", ruby_source(20, 0))
        .with_file("octo/app", "app/binary.rb", vec![0xff, 0xfe, 0x00])
        .with_file("octo/app", "README.md", b"# App".to_vec());
    let llm = MockCompletion::new(INSIGHTS);
    let pipeline = AnalysisPipeline::new(
        source,
        llm.clone(),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );

    let user_id = seed_user(&pipeline, 1, "octo");
    let repo_id = seed_repo(&pipeline, user_id, 10, "octo/app");

    let repo = pipeline.run_full_analysis(repo_id).await.unwrap();
    let data = repo.analysis_data.expect("analysis data stored");

    assert_eq!(data.total_lines, 170);
    assert_eq!(data.complexity_score, 3);
    assert_eq!(data.quality_score, 8);
    assert_eq!(data.maintainability.as_deref(), Some("Good"));
    assert_eq!(data.architecture_pattern, None);
    assert_eq!(llm.calls.lock().unwrap().as_slice(), &[(800, 0.3)]);

    let metrics = pipeline.get_quality_metrics(repo_id).unwrap();
    assert_eq!(metrics.maintainability_index, 8);
    assert_eq!(metrics.total_lines, 170);
    assert_eq!(metrics.message, None);
}

#[tokio::test]
async fn test_batch_isolates_failing_item() {
    let source = MockSource::default()
        .with_file("octo/a", "a.rb", ruby_source(10, 1))
        .with_file("octo/c", "c.rb", ruby_source(5, 0));
    let pipeline = AnalysisPipeline::new(
        source,
        MockCompletion::new(INSIGHTS),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );

    let user_id = seed_user(&pipeline, 1, "octo");
    let ids = [
        seed_repo(&pipeline, user_id, 1, "octo/a"),
        seed_repo(&pipeline, user_id, 2, "octo/b"),
        seed_repo(&pipeline, user_id, 3, "octo/c"),
    ];

    let results = pipeline.run_batch_analysis(&ids).await;

    assert_eq!(results.len(), 3);
    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![BatchStatus::Success, BatchStatus::Error, BatchStatus::Success]);
    assert_eq!(results[1].repository_id, ids[1]);
    assert!(!results[1].error.as_deref().unwrap_or_default().is_empty());

    let third = results[2].repository.as_ref().unwrap();
    assert_eq!(third.analysis_data.as_ref().unwrap().total_lines, 5);
}

#[tokio::test]
async fn test_failed_run_keeps_previous_analysis() {
    let source = MockSource::default().with_file("octo/app", "app.rb", ruby_source(12, 3));
    let llm = MockCompletion::new(INSIGHTS);
    let pipeline = AnalysisPipeline::new(
        source,
        llm.clone(),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );

    let user_id = seed_user(&pipeline, 1, "octo");
    let repo_id = seed_repo(&pipeline, user_id, 10, "octo/app");

    let first = pipeline.run_full_analysis(repo_id).await.unwrap();

    llm.fail.store(true, Ordering::SeqCst);
    let err = pipeline.run_full_analysis(repo_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::AnalysisAborted { stage: AnalysisStage::FilesAnalyzed, .. }
    ));

    let stored = pipeline.repository_insights(repo_id).unwrap();
    assert_eq!(Some(&stored), first.analysis_data.as_ref());
}

#[tokio::test]
async fn test_unanalyzed_repository_reads() {
    let pipeline = AnalysisPipeline::new(
        MockSource::default(),
        MockCompletion::new(""),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );
    let user_id = seed_user(&pipeline, 1, "octo");
    let repo_id = seed_repo(&pipeline, user_id, 10, "octo/app");

    let metrics = pipeline.get_quality_metrics(repo_id).unwrap();
    assert_eq!(metrics.quality_score, 0);
    assert!(metrics.message.is_some());

    let err = pipeline.repository_insights(repo_id).unwrap_err();
    assert!(matches!(err, Error::AnalysisNotFound(_)));
    assert!(err.is_not_found());

    assert!(matches!(pipeline.get_quality_metrics(999), Err(Error::RepoNotFound(_))));
}

#[tokio::test]
async fn test_commit_analysis_failure_yields_empty_report() {
    let pipeline = AnalysisPipeline::new(
        MockSource::default(),
        MockCompletion::new(""),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );
    let user_id = seed_user(&pipeline, 1, "octo");
    let repo_id = seed_repo(&pipeline, user_id, 10, "octo/empty");

    let report = pipeline.run_commit_analysis(repo_id).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.commit_frequency, 0.0);
}

#[tokio::test]
async fn test_chat_without_profile_skips_completion() {
    let llm = MockCompletion::new("should not be used");
    let pipeline = AnalysisPipeline::new(
        MockSource::default(),
        llm.clone(),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );
    let user_id = seed_user(&pipeline, 1, "octo");

    let answer = pipeline.chat(user_id, "What do they build?", None).await.unwrap();

    assert_eq!(answer, PROFILE_PENDING_MESSAGE);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_profile_analysis_then_chat() {
    let response = "SUMMARY: Backend engineer.\n\
SKILLS: API design, Testing\n\
TECHNOLOGIES: Ruby, Rails\n\
EXPERIENCE: Senior\n\
PERSONALITY: Careful\n\
STRENGTHS: Mentoring\n\
COMMUNICATION: Direct";
    let llm = MockCompletion::new(response);
    let pipeline = AnalysisPipeline::new(
        MockSource::default(),
        llm.clone(),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );
    let user_id = seed_user(&pipeline, 1, "octo");
    seed_repo(&pipeline, user_id, 10, "octo/app");

    assert!(matches!(pipeline.get_profile_analysis(user_id), Err(Error::ProfileNotFound(_))));

    let analysis = pipeline.run_profile_analysis(user_id).await.unwrap();
    assert_eq!(analysis.skills, vec!["API design", "Testing"]);
    assert_eq!(analysis.technologies, vec!["Ruby", "Rails"]);

    let view = pipeline.get_profile_analysis(user_id).unwrap();
    assert!(!view.needs_update);
    assert_eq!(view.analysis, analysis);

    pipeline.chat(user_id, "What do they build?", Some("hiring")).await.unwrap();
    assert_eq!(llm.calls.lock().unwrap().as_slice(), &[(1000, 0.3), (300, 0.7)]);
}

#[tokio::test]
async fn test_discover_without_matches_is_empty() {
    let llm = MockCompletion::new("SKILLS: Rust\nTECHNOLOGIES: Tokio");
    let pipeline = AnalysisPipeline::new(
        MockSource::default(),
        llm,
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );
    let user_id = seed_user(&pipeline, 1, "octo");
    pipeline.run_profile_analysis(user_id).await.unwrap();

    let page = pipeline
        .discover(&DiscoverQuery {
            skills: vec!["COBOL".into()],
            ..Default::default()
        })
        .unwrap();

    assert!(page.engineers.is_empty());
    assert_eq!(page.pagination.total_count, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[tokio::test]
async fn test_sync_stores_repositories_and_keeps_analysis() {
    let owner = RepositoryOwner { login: "octo".into() };
    let repository = |id: u64, name: &str| Repository {
        id,
        name: name.to_string(),
        full_name: format!("octo/{}", name),
        description: None,
        private: false,
        language: Some("Ruby".into()),
        stargazers_count: 3,
        forks_count: 0,
        fork: false,
        default_branch: Some("main".into()),
        clone_url: None,
        html_url: None,
        owner: owner.clone(),
    };
    let committed = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let commit = CommitSummary {
        sha: "abc".into(),
        commit: CommitDetails {
            message: "Add greeting".into(),
            author: CommitAuthor {
                name: "Octo".into(),
                email: "octo@example.com".into(),
                date: committed - Duration::hours(1),
            },
            committer: Some(CommitAuthor {
                name: "Octo".into(),
                email: "octo@example.com".into(),
                date: committed,
            }),
        },
        author: None,
        stats: None,
    };

    let mut source = MockSource::default().with_file("octo/app", "app.rb", ruby_source(4, 1));
    source.user = Some(GitHubUser {
        login: "octo".into(),
        id: 77,
        name: Some("Octo Cat".into()),
        email: None,
        avatar_url: "https://example.com/a.png".into(),
        bio: None,
        company: None,
        location: None,
        public_repos: 2,
        followers: 0,
        following: 0,
        created_at: committed,
    });
    source.repositories = vec![repository(1, "app"), repository(2, "empty")];
    source.readmes.insert("octo/app".into(), b"# App".to_vec());
    source.commits.insert("octo/app".into(), vec![commit]);

    let pipeline = AnalysisPipeline::new(
        source,
        MockCompletion::new(INSIGHTS),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );

    let synced = pipeline.sync_repositories("octo").await.unwrap();
    assert_eq!(synced.len(), 2);
    assert_eq!(synced[0].readme_text.as_deref(), Some("# App"));
    assert_eq!(synced[0].last_commit_date(), Some(committed));
    assert_eq!(synced[1].readme_text, None);
    assert_eq!(synced[1].last_commit, None);

    pipeline.run_full_analysis(synced[0].id).await.unwrap();
    let resynced = pipeline.sync_repositories("octo").await.unwrap();
    assert_eq!(resynced[0].id, synced[0].id);
    assert_eq!(resynced[0].analysis_data.as_ref().map(|d| d.total_lines), Some(4));

    let user = pipeline.find_user("octo").unwrap();
    assert_eq!(user.name.as_deref(), Some("Octo Cat"));
}

#[tokio::test]
async fn test_unchanged_resync_keeps_profile_fresh() {
    let committed = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let mut source = MockSource::default();
    source.user = Some(GitHubUser {
        login: "octo".into(),
        id: 77,
        name: None,
        email: None,
        avatar_url: "https://example.com/a.png".into(),
        bio: None,
        company: None,
        location: None,
        public_repos: 1,
        followers: 0,
        following: 0,
        created_at: committed,
    });
    source.repositories = vec![Repository {
        id: 1,
        name: "app".into(),
        full_name: "octo/app".into(),
        description: Some("Greeter".into()),
        private: false,
        language: Some("Ruby".into()),
        stargazers_count: 3,
        forks_count: 1,
        fork: false,
        default_branch: Some("main".into()),
        clone_url: None,
        html_url: None,
        owner: RepositoryOwner { login: "octo".into() },
    }];
    source.readmes.insert("octo/app".into(), b"# App".to_vec());
    source.commits.insert(
        "octo/app".into(),
        vec![CommitSummary {
            sha: "abc".into(),
            commit: CommitDetails {
                message: "Add greeting".into(),
                author: CommitAuthor {
                    name: "Octo".into(),
                    email: "octo@example.com".into(),
                    date: committed,
                },
                committer: None,
            },
            author: None,
            stats: None,
        }],
    );

    let pipeline = AnalysisPipeline::new(
        source,
        MockCompletion::new("SKILLS: Ruby"),
        gitinsight::Storage::in_memory().unwrap(),
        AnalysisConfig::default(),
    );

    pipeline.sync_repositories("octo").await.unwrap();
    let user = pipeline.find_user("octo").unwrap();
    pipeline.run_profile_analysis(user.id).await.unwrap();
    assert!(!pipeline.get_profile_analysis(user.id).unwrap().needs_update);

    pipeline.sync_repositories("octo").await.unwrap();
    assert!(!pipeline.get_profile_analysis(user.id).unwrap().needs_update);
}
