use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::models::{
    AnalysisData, ExperienceLevel, LastCommit, NewRepository, NewUser, ProfileAnalysis,
    ProfileInsights, RepositorySnapshot, User,
};

const USER_COLUMNS: &str = "id, github_id, username, name, email, avatar_url";

const REPOSITORY_COLUMNS: &str = "id, user_id, github_id, name, full_name, description, private, \
     language, stars, forks, default_branch, clone_url, html_url, readme_content, \
     last_commit_sha, last_commit_message, last_commit_date, analysis_json, updated_at";

const PROFILE_COLUMNS: &str = "id, user_id, summary, skills_json, technologies_json, \
     experience_level, personality, strengths_json, communication_style, analyzed_at";

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn: Mutex::new(conn) };
        storage.init_db()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn: Mutex::new(conn) };
        storage.init_db()?;
        Ok(storage)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_db(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                github_id INTEGER UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                name TEXT,
                email TEXT,
                avatar_url TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                github_id INTEGER UNIQUE NOT NULL,
                name TEXT NOT NULL,
                full_name TEXT NOT NULL,
                description TEXT,
                private INTEGER NOT NULL DEFAULT 0,
                language TEXT,
                stars INTEGER NOT NULL DEFAULT 0,
                forks INTEGER NOT NULL DEFAULT 0,
                default_branch TEXT,
                clone_url TEXT,
                html_url TEXT,
                readme_content TEXT,
                last_commit_sha TEXT,
                last_commit_message TEXT,
                last_commit_date TEXT,
                analysis_json TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profile_analyses (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                summary TEXT,
                skills_json TEXT NOT NULL DEFAULT '[]',
                technologies_json TEXT NOT NULL DEFAULT '[]',
                experience_level TEXT,
                personality TEXT,
                strengths_json TEXT NOT NULL DEFAULT '[]',
                communication_style TEXT,
                analyzed_at TEXT,
                UNIQUE(user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_repositories_user_id ON repositories(user_id);
            CREATE INDEX IF NOT EXISTS idx_repositories_language ON repositories(language);
            CREATE INDEX IF NOT EXISTS idx_profile_analyses_experience
                ON profile_analyses(experience_level);
            "#,
        )?;

        Ok(())
    }

    pub fn upsert_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO users (github_id, username, name, email, avatar_url, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(github_id) DO UPDATE SET
                username = excluded.username,
                name = excluded.name,
                email = excluded.email,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at
            "#,
            params![
                user.github_id as i64,
                user.username,
                user.name,
                user.email,
                user.avatar_url,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let sql = format!("SELECT {} FROM users WHERE github_id = ?1", USER_COLUMNS);
        Ok(conn.query_row(&sql, params![user.github_id as i64], user_from_row)?)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(self.conn().query_row(&sql, params![id], user_from_row).optional()?)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        Ok(self.conn().query_row(&sql, params![username], user_from_row).optional()?)
    }

    /// Inserts or refreshes repository metadata; stored analysis data survives.
    pub fn upsert_repository(
        &self,
        user_id: i64,
        repo: &NewRepository,
    ) -> Result<RepositorySnapshot> {
        let conn = self.conn();
        let (commit_sha, commit_message, commit_date) = match &repo.last_commit {
            Some(c) => (
                Some(c.sha.clone()),
                Some(c.message.clone()),
                c.date.map(|d| d.to_rfc3339()),
            ),
            None => (None, None, None),
        };

        conn.execute(
            r#"
            INSERT INTO repositories (
                user_id, github_id, name, full_name, description, private, language,
                stars, forks, default_branch, clone_url, html_url, readme_content,
                last_commit_sha, last_commit_message, last_commit_date, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(github_id) DO UPDATE SET
                user_id = excluded.user_id,
                name = excluded.name,
                full_name = excluded.full_name,
                description = excluded.description,
                private = excluded.private,
                language = excluded.language,
                stars = excluded.stars,
                forks = excluded.forks,
                default_branch = excluded.default_branch,
                clone_url = excluded.clone_url,
                html_url = excluded.html_url,
                readme_content = excluded.readme_content,
                last_commit_sha = excluded.last_commit_sha,
                last_commit_message = excluded.last_commit_message,
                last_commit_date = excluded.last_commit_date,
                updated_at = CASE WHEN
                    repositories.user_id IS NOT excluded.user_id
                    OR repositories.name IS NOT excluded.name
                    OR repositories.full_name IS NOT excluded.full_name
                    OR repositories.description IS NOT excluded.description
                    OR repositories.private IS NOT excluded.private
                    OR repositories.language IS NOT excluded.language
                    OR repositories.stars IS NOT excluded.stars
                    OR repositories.forks IS NOT excluded.forks
                    OR repositories.default_branch IS NOT excluded.default_branch
                    OR repositories.clone_url IS NOT excluded.clone_url
                    OR repositories.html_url IS NOT excluded.html_url
                    OR repositories.readme_content IS NOT excluded.readme_content
                    OR repositories.last_commit_sha IS NOT excluded.last_commit_sha
                    OR repositories.last_commit_message IS NOT excluded.last_commit_message
                    OR repositories.last_commit_date IS NOT excluded.last_commit_date
                THEN excluded.updated_at ELSE repositories.updated_at END
            "#,
            params![
                user_id,
                repo.github_id as i64,
                repo.name,
                repo.full_name,
                repo.description,
                repo.private,
                repo.language,
                repo.stars,
                repo.forks,
                repo.default_branch,
                repo.clone_url,
                repo.html_url,
                repo.readme_text,
                commit_sha,
                commit_message,
                commit_date,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let sql = format!("SELECT {} FROM repositories WHERE github_id = ?1", REPOSITORY_COLUMNS);
        Ok(conn.query_row(&sql, params![repo.github_id as i64], repository_from_row)?)
    }

    pub fn get_repository(&self, id: i64) -> Result<Option<RepositorySnapshot>> {
        let sql = format!("SELECT {} FROM repositories WHERE id = ?1", REPOSITORY_COLUMNS);
        Ok(self.conn().query_row(&sql, params![id], repository_from_row).optional()?)
    }

    pub fn list_repositories(&self, user_id: i64) -> Result<Vec<RepositorySnapshot>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM repositories WHERE user_id = ?1 ORDER BY id",
            REPOSITORY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let repos = stmt.query_map(params![user_id], repository_from_row)?;
        repos.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replaces the repository's analysis data wholesale.
    pub fn save_analysis_data(&self, repository_id: i64, data: &AnalysisData) -> Result<()> {
        let analysis_json = serde_json::to_string(data)?;
        let updated = self.conn().execute(
            "UPDATE repositories SET analysis_json = ?1, updated_at = ?2 WHERE id = ?3",
            params![analysis_json, Utc::now().to_rfc3339(), repository_id],
        )?;

        if updated == 0 {
            return Err(Error::RepoNotFound(repository_id.to_string()));
        }
        Ok(())
    }

    /// Writes or replaces the single profile analysis of a user.
    pub fn save_profile_analysis(
        &self,
        user_id: i64,
        insights: &ProfileInsights,
        analyzed_at: DateTime<Utc>,
    ) -> Result<ProfileAnalysis> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO profile_analyses (
                user_id, summary, skills_json, technologies_json, experience_level,
                personality, strengths_json, communication_style, analyzed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                summary = excluded.summary,
                skills_json = excluded.skills_json,
                technologies_json = excluded.technologies_json,
                experience_level = excluded.experience_level,
                personality = excluded.personality,
                strengths_json = excluded.strengths_json,
                communication_style = excluded.communication_style,
                analyzed_at = excluded.analyzed_at
            "#,
            params![
                user_id,
                insights.summary,
                serde_json::to_string(&insights.skills)?,
                serde_json::to_string(&insights.technologies)?,
                insights.experience_level.map(|l| l.as_str()),
                insights.personality,
                serde_json::to_string(&insights.strengths)?,
                insights.communication_style,
                analyzed_at.to_rfc3339(),
            ],
        )?;

        let sql = format!("SELECT {} FROM profile_analyses WHERE user_id = ?1", PROFILE_COLUMNS);
        Ok(conn.query_row(&sql, params![user_id], profile_from_row)?)
    }

    pub fn get_profile_analysis(&self, user_id: i64) -> Result<Option<ProfileAnalysis>> {
        let sql = format!("SELECT {} FROM profile_analyses WHERE user_id = ?1", PROFILE_COLUMNS);
        Ok(self.conn().query_row(&sql, params![user_id], profile_from_row).optional()?)
    }

    pub fn list_profile_analyses(&self) -> Result<Vec<ProfileAnalysis>> {
        let conn = self.conn();
        let sql = format!("SELECT {} FROM profile_analyses ORDER BY user_id", PROFILE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let profiles = stmt.query_map([], profile_from_row)?;
        profiles.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_list(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        github_id: row.get::<_, i64>(1)? as u64,
        username: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        avatar_url: row.get(5)?,
    })
}

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<RepositorySnapshot> {
    let last_commit = row
        .get::<_, Option<String>>(14)?
        .map(|sha| -> rusqlite::Result<LastCommit> {
            Ok(LastCommit {
                sha,
                message: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
                date: parse_timestamp(row.get(16)?),
            })
        })
        .transpose()?;

    let analysis_data = row
        .get::<_, Option<String>>(17)?
        .and_then(|json| match serde_json::from_str::<AnalysisData>(&json) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Ignoring unreadable analysis data: {}", e);
                None
            }
        });

    Ok(RepositorySnapshot {
        id: row.get(0)?,
        user_id: row.get(1)?,
        github_id: row.get::<_, i64>(2)? as u64,
        name: row.get(3)?,
        full_name: row.get(4)?,
        description: row.get(5)?,
        private: row.get(6)?,
        language: row.get(7)?,
        stars: row.get(8)?,
        forks: row.get(9)?,
        default_branch: row.get(10)?,
        clone_url: row.get(11)?,
        html_url: row.get(12)?,
        readme_text: row.get(13)?,
        last_commit,
        analysis_data,
        updated_at: parse_timestamp(row.get(18)?).unwrap_or_else(Utc::now),
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileAnalysis> {
    Ok(ProfileAnalysis {
        id: row.get(0)?,
        user_id: row.get(1)?,
        summary: row.get(2)?,
        skills: parse_list(&row.get::<_, String>(3)?),
        technologies: parse_list(&row.get::<_, String>(4)?),
        experience_level: row
            .get::<_, Option<String>>(5)?
            .and_then(|l| l.parse::<ExperienceLevel>().ok()),
        personality: row.get(6)?,
        strengths: parse_list(&row.get::<_, String>(7)?),
        communication_style: row.get(8)?,
        analyzed_at: parse_timestamp(row.get(9)?),
    })
}
