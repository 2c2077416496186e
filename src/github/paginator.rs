use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::github::rate_limiter::RateLimiter;

pub struct Paginator<'a> {
    client: &'a Client,
    rate_limiter: &'a RateLimiter,
}

struct Page<T> {
    items: Vec<T>,
    has_next: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a Client, rate_limiter: &'a RateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
    ) -> Result<Vec<T>> {
        self.fetch_limited(base_url, per_page, u32::MAX).await
    }

    pub async fn fetch_limited<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
        max_items: u32,
    ) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let Page { items, has_next } = self.fetch_page(base_url, per_page, page).await?;
            let items_count = items.len();
            all_items.extend(items);

            if all_items.len() >= max_items as usize || !has_next || items_count < per_page as usize
            {
                break;
            }

            page += 1;
        }

        all_items.truncate(max_items as usize);
        Ok(all_items)
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Page<T>> {
        self.rate_limiter.wait().await;

        let separator = if base_url.contains('?') { "&" } else { "?" };
        let url = format!("{}{}per_page={}&page={}", base_url, separator, per_page, page);

        tracing::debug!("Fetching: {}", url);
        let response = self.client.get(&url).send().await?;
        self.rate_limiter.update_from_response(&response);

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Failed to fetch {}: {} - {}",
                url, status, body
            )));
        }

        // Check for next page in Link header
        let has_next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("rel=\"next\""))
            .unwrap_or(false);

        let items = response.json().await?;
        Ok(Page { items, has_next })
    }
}
