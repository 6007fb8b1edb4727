use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{http_client, send, DiffChunk, HostError, HostingService, PullRequest};

pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0";

const PAGE_LEN: &str = "50";
const JSON: &str = "application/json";

/// Bitbucket Cloud client bound to one repository.
/// Authenticates with username + app password (basic auth).
pub struct BitbucketClient {
    http: reqwest::Client,
    base_url: String,
    repo: String,
    username: String,
    token: String,
}

#[derive(Deserialize)]
struct Author {
    display_name: Option<String>,
    nickname: Option<String>,
}

#[derive(Deserialize)]
struct Href {
    href: Option<String>,
}

#[derive(Deserialize)]
struct Links {
    html: Option<Href>,
}

#[derive(Deserialize)]
struct PullResponse {
    id: Option<u64>,
    #[serde(default)]
    title: String,
    author: Option<Author>,
    description: Option<String>,
    links: Option<Links>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    values: Vec<PullResponse>,
    next: Option<String>,
}

impl BitbucketClient {
    pub fn new(repo: &str, username: &str, token: &str, base_url: &str) -> Result<Self, HostError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo: super::parse_repo_slug(repo)?,
            username: username.to_string(),
            token: token.to_string(),
        })
    }

    fn pulls_url(&self) -> String {
        format!("{}/repositories/{}/pullrequests", self.base_url, self.repo)
    }

    fn request(&self, method: reqwest::Method, url: &str, accept: &str) -> reqwest::RequestBuilder {
        debug!(%method, %url, "request");
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.token))
            .header("Accept", accept)
    }

    fn to_pull_request(&self, pull: PullResponse) -> PullRequest {
        let author = pull
            .author
            .and_then(|a| a.display_name.or(a.nickname))
            .unwrap_or_else(|| "unknown".to_string());
        let url = pull
            .links
            .and_then(|l| l.html)
            .and_then(|h| h.href)
            .unwrap_or_default();
        PullRequest {
            id: pull.id,
            title: pull.title,
            author,
            description: pull.description,
            url,
            repository: self.repo.clone(),
        }
    }
}

#[async_trait]
impl HostingService for BitbucketClient {
    fn repository(&self) -> &str {
        &self.repo
    }

    /// Follows the `next` link until the last page. The link already carries
    /// the query string, so it is used as-is.
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, HostError> {
        let mut pulls = Vec::new();
        let mut request = self
            .request(reqwest::Method::GET, &self.pulls_url(), JSON)
            .query(&[("state", "OPEN"), ("pagelen", PAGE_LEN)]);
        loop {
            let page: Page = send(request).await?.json().await?;
            debug!(received = page.values.len(), "fetched page");
            pulls.extend(page.values.into_iter().map(|p| self.to_pull_request(p)));
            match page.next {
                Some(next) if !next.is_empty() => {
                    request = self.request(reqwest::Method::GET, &next, JSON);
                }
                _ => break,
            }
        }
        Ok(pulls)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_pull_request(&self, id: u64) -> Result<PullRequest, HostError> {
        let url = format!("{}/{id}", self.pulls_url());
        let pull: PullResponse = send(self.request(reqwest::Method::GET, &url, JSON))
            .await?
            .json()
            .await?;
        if pull.id.is_none() {
            return Err(HostError::UnexpectedResponse(format!(
                "pull request {id} response has no id"
            )));
        }
        Ok(self.to_pull_request(pull))
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_changes(&self, id: u64) -> Result<DiffChunk, HostError> {
        let url = format!("{}/{id}/diff", self.pulls_url());
        let diff = send(self.request(reqwest::Method::GET, &url, "text/plain"))
            .await?
            .text()
            .await?;
        debug!(diff_bytes = diff.len(), "received PR diff");
        Ok(DiffChunk::Unified(diff))
    }

    #[instrument(skip(self, text), fields(repo = %self.repo, chars = text.len()))]
    async fn post_comment(&self, id: u64, text: &str) -> Result<(), HostError> {
        let url = format!("{}/{id}/comments", self.pulls_url());
        let request = self
            .request(reqwest::Method::POST, &url, JSON)
            .json(&serde_json::json!({ "content": { "raw": text } }));
        send(request).await?;
        Ok(())
    }
}
