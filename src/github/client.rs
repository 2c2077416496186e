use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};

use crate::error::{Error, Result};
use crate::github::paginator::Paginator;
use crate::github::rate_limiter::RateLimiter;
use crate::github::source::RepositorySource;
use crate::models::{CommitSummary, GitHubUser, GitTree, Repository, TreeEntry};

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("gitinsight/0.1"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: "https://api.github.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, url: &str, accept: Option<&'static str>) -> Result<Response> {
        self.rate_limiter.wait().await;
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }

        let response = request.send().await?;
        self.rate_limiter.update_from_response(&response);
        Ok(response)
    }

    async fn fail(what: &str, response: Response) -> Error {
        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            if let Some(secs) = retry_after {
                return Error::RateLimited(secs);
            }
        }

        let body = response.text().await.unwrap_or_default();
        Error::GitHubApi(format!("Failed to fetch {}: {} - {}", what, status, body))
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn get_user(&self, username: &str) -> Result<GitHubUser> {
        let url = format!("{}/users/{}", self.base_url, username);
        tracing::info!("Fetching user: {}", username);

        let response = self.get(&url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::UserNotFound(username.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::fail(&format!("user {}", username), response).await);
        }

        Ok(response.json().await?)
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let url = format!("{}/users/{}/repos?type=owner&sort=updated", self.base_url, owner);
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::info!("Fetching repositories for: {}", owner);
        paginator.fetch_all(&url, 100).await
    }

    async fn get_tree(
        &self,
        full_name: &str,
        git_ref: &str,
        recursive: bool,
    ) -> Result<Vec<TreeEntry>> {
        let mut url = format!("{}/repos/{}/git/trees/{}", self.base_url, full_name, git_ref);
        if recursive {
            url.push_str("?recursive=1");
        }

        let response = self.get(&url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::RepoNotFound(full_name.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::fail(&format!("tree of {}", full_name), response).await);
        }

        let tree: GitTree = response.json().await?;
        if tree.truncated {
            tracing::warn!("Tree listing for {} was truncated by GitHub", full_name);
        }
        Ok(tree.tree)
    }

    async fn get_file_content(&self, full_name: &str, path: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.base_url,
            full_name,
            encode_path(path)
        );

        let response = self.get(&url, Some(RAW_MEDIA_TYPE)).await?;
        if !response.status().is_success() {
            return Err(Self::fail(&format!("{} in {}", path, full_name), response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn get_readme(&self, full_name: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/repos/{}/readme", self.base_url, full_name);

        let response = self.get(&url, Some(RAW_MEDIA_TYPE)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("No README found for {}", full_name);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(&format!("README of {}", full_name), response).await);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn list_commits(&self, full_name: &str, per_page: u32) -> Result<Vec<CommitSummary>> {
        let url = format!("{}/repos/{}/commits", self.base_url, full_name);
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::debug!("Fetching commits for: {}", full_name);
        paginator.fetch_limited(&url, per_page.clamp(1, 100), per_page).await
    }
}

/// Percent-encodes each segment of a repository path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
