use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{http_client, send, DiffChunk, FilePatch, HostError, HostingService, PullRequest};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// GitHub REST client bound to one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    repo: String,
    token: String,
}

#[derive(Deserialize)]
struct User {
    login: Option<String>,
}

#[derive(Deserialize)]
struct BaseRepo {
    full_name: Option<String>,
}

#[derive(Deserialize)]
struct Base {
    repo: Option<BaseRepo>,
}

#[derive(Deserialize)]
struct PullResponse {
    number: Option<u64>,
    #[serde(default)]
    title: String,
    user: Option<User>,
    body: Option<String>,
    #[serde(default)]
    html_url: String,
    base: Option<Base>,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
    #[serde(default)]
    status: String,
    patch: Option<String>,
}

impl GitHubClient {
    pub fn new(repo: &str, token: &str, base_url: &str) -> Result<Self, HostError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo: super::parse_repo_slug(repo)?,
            token: token.to_string(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/repos/{}{}", self.base_url, self.repo, path);
        debug!(%url, "GET");
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    fn to_pull_request(&self, pull: PullResponse) -> PullRequest {
        let repository = pull
            .base
            .and_then(|b| b.repo)
            .and_then(|r| r.full_name)
            .unwrap_or_else(|| self.repo.clone());
        PullRequest {
            id: pull.number,
            title: pull.title,
            author: pull
                .user
                .and_then(|u| u.login)
                .unwrap_or_else(|| "unknown".to_string()),
            description: pull.body,
            url: pull.html_url,
            repository,
        }
    }

    /// Walk `per_page=100` pages until one comes back short.
    async fn paginate<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<T>, HostError> {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let request = self
                .get(path)
                .query(extra)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let chunk: Vec<T> = send(request).await?.json().await?;
            let len = chunk.len();
            items.extend(chunk);
            debug!(page, received = len, "fetched page");
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

#[async_trait]
impl HostingService for GitHubClient {
    fn repository(&self) -> &str {
        &self.repo
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, HostError> {
        let pulls: Vec<PullResponse> = self.paginate("/pulls", &[("state", "open")]).await?;
        Ok(pulls
            .into_iter()
            .map(|p| self.to_pull_request(p))
            .collect())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_pull_request(&self, id: u64) -> Result<PullRequest, HostError> {
        let pull: PullResponse = send(self.get(&format!("/pulls/{id}")))
            .await?
            .json()
            .await?;
        if pull.number.is_none() {
            return Err(HostError::UnexpectedResponse(format!(
                "pull request {id} response has no number"
            )));
        }
        Ok(self.to_pull_request(pull))
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_changes(&self, id: u64) -> Result<DiffChunk, HostError> {
        let files: Vec<FileResponse> = self.paginate(&format!("/pulls/{id}/files"), &[]).await?;
        debug!(files = files.len(), "received PR files");
        Ok(DiffChunk::Patches(
            files
                .into_iter()
                .map(|f| FilePatch {
                    filename: f.filename,
                    status: f.status,
                    patch: f.patch,
                })
                .collect(),
        ))
    }

    #[instrument(skip(self, text), fields(repo = %self.repo, chars = text.len()))]
    async fn post_comment(&self, id: u64, text: &str) -> Result<(), HostError> {
        let url = format!("{}/repos/{}/issues/{id}/comments", self.base_url, self.repo);
        debug!(%url, "POST");
        let request = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&serde_json::json!({ "body": text }));
        send(request).await?;
        Ok(())
    }
}
