pub mod bitbucket;
pub mod github;
pub mod types;

pub use types::{DiffChunk, FilePatch, PullRequest};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::report::ErrorKind;

/// Timeout for every hosting-service call (listing, fetch, comment).
pub const HOST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "pr-reviewer/0.1";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Hosting API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Hosting API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected hosting API response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid repository: {0}")]
    InvalidRepo(String),
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Request(e) if e.is_decode() => ErrorKind::Protocol,
            HostError::Request(_) | HostError::Status { .. } => ErrorKind::Transport,
            HostError::UnexpectedResponse(_) => ErrorKind::Protocol,
            HostError::InvalidRepo(_) => ErrorKind::Configuration,
        }
    }
}

/// The pull request operations the reviewer needs from a code host.
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Repository this client is bound to, as `workspace/name`.
    fn repository(&self) -> &str;

    /// All open pull requests, pagination already flattened, in host order.
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, HostError>;

    /// A single pull request by number.
    async fn get_pull_request(&self, id: u64) -> Result<PullRequest, HostError>;

    /// The changed content of a pull request. A given host always returns
    /// the same `DiffChunk` variant.
    async fn get_changes(&self, id: u64) -> Result<DiffChunk, HostError>;

    /// Post `text` as a top-level comment on the pull request.
    async fn post_comment(&self, id: u64, text: &str) -> Result<(), HostError>;
}

/// Parse a repository reference into `workspace/name`.
///
/// Accepts a bare slug (`org/repo`), a web URL
/// (`https://github.com/org/repo/pull/3`) or a clone URL ending in `.git`.
/// Only the first two path segments are kept.
pub fn parse_repo_slug(value: &str) -> Result<String, HostError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HostError::InvalidRepo("repository is empty".to_string()));
    }

    let segments: Vec<String> = if trimmed.contains("://") {
        let parsed =
            reqwest::Url::parse(trimmed).map_err(|_| HostError::InvalidRepo(trimmed.to_string()))?;
        parsed
            .path_segments()
            .ok_or_else(|| HostError::InvalidRepo(trimmed.to_string()))?
            .filter(|segment| !segment.is_empty())
            .take(2)
            .map(str::to_string)
            .collect()
    } else {
        trimmed
            .splitn(2, '/')
            .map(|s| s.trim_matches('/').to_string())
            .collect()
    };

    match segments.as_slice() {
        [workspace, name] if !workspace.is_empty() && !name.is_empty() => {
            let name = name.strip_suffix(".git").unwrap_or(name);
            if name.is_empty() || name.contains('/') {
                return Err(HostError::InvalidRepo(format!(
                    "{trimmed} (expected <workspace>/<repo>)"
                )));
            }
            Ok(format!("{workspace}/{name}"))
        }
        _ => Err(HostError::InvalidRepo(format!(
            "{trimmed} (expected <workspace>/<repo>)"
        ))),
    }
}

/// Shared reqwest client for hosting-service calls.
fn http_client() -> Result<reqwest::Client, HostError> {
    Ok(reqwest::Client::builder()
        .timeout(HOST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Send a request and turn a non-success status into `HostError::Status`.
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, HostError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HostError::Status { status, body });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug_forms() {
        assert_eq!(parse_repo_slug("workspace/repo").unwrap(), "workspace/repo");
        assert_eq!(
            parse_repo_slug("https://bitbucket.org/workspace/repo").unwrap(),
            "workspace/repo"
        );
        assert_eq!(
            parse_repo_slug("https://bitbucket.org/workspace/repo.git").unwrap(),
            "workspace/repo"
        );
        assert_eq!(
            parse_repo_slug("https://github.com/org/repo/pull/42").unwrap(),
            "org/repo"
        );
        assert_eq!(parse_repo_slug("  org/repo.git ").unwrap(), "org/repo");
    }

    #[test]
    fn test_parse_invalid_slug() {
        assert!(parse_repo_slug("").is_err());
        assert!(parse_repo_slug("just-a-name").is_err());
        assert!(parse_repo_slug("https://bitbucket.org/workspace").is_err());
        assert!(parse_repo_slug("org/repo/extra").is_err());
        assert!(parse_repo_slug("/repo").is_err());
    }

    #[test]
    fn test_error_kinds() {
        let status = HostError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(status.kind(), ErrorKind::Transport);
        assert_eq!(
            HostError::UnexpectedResponse("x".to_string()).kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            HostError::InvalidRepo("x".to_string()).kind(),
            ErrorKind::Configuration
        );
    }
}
