pub mod batch;
pub mod budget;
pub mod prompt;

pub use prompt::{build_prompt, PromptSettings};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::llm::{ChatCompletion, ChatMessage, LlmError};
use crate::pr::{HostError, HostingService, PullRequest};
use crate::report::{ErrorKind, ReviewResult};

pub const SYSTEM_PROMPT: &str =
    "Act as a senior backend engineer. Provide concise, actionable code review.";

/// Low temperature keeps reviews close to deterministic.
pub const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Pull request record has no id")]
    MissingId,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::MissingId => ErrorKind::Validation,
            ReviewError::Host(e) => e.kind(),
            ReviewError::Llm(e) => e.kind(),
        }
    }
}

/// Reviews pull requests from one host with one chat endpoint.
pub struct Reviewer<'a> {
    host: &'a dyn HostingService,
    chat: &'a dyn ChatCompletion,
    settings: PromptSettings,
    post_comments: bool,
}

impl<'a> Reviewer<'a> {
    pub fn new(
        host: &'a dyn HostingService,
        chat: &'a dyn ChatCompletion,
        settings: PromptSettings,
        post_comments: bool,
    ) -> Self {
        Self {
            host,
            chat,
            settings,
            post_comments,
        }
    }

    pub fn host(&self) -> &dyn HostingService {
        self.host
    }

    /// Fetch changes, ask the model, optionally post the answer back.
    /// Collaborator errors are returned untouched.
    #[instrument(skip_all)]
    pub async fn review(&self, pr: &PullRequest) -> Result<ReviewResult, ReviewError> {
        let id = pr.id.ok_or(ReviewError::MissingId)?;

        let changes = self.host.get_changes(id).await?;
        debug!(diff_chars = changes.char_count(), "fetched changes");

        let prompt = build_prompt(pr, &changes, &self.settings);
        let messages = conversation(prompt);

        info!(pr = id, "sending pull request for review");
        let review = self.chat.complete(&messages, TEMPERATURE).await?;

        if self.post_comments {
            self.host.post_comment(id, &review).await?;
            info!(pr = id, "posted review comment");
        }

        Ok(ReviewResult {
            id,
            title: pr.title.clone(),
            url: pr.url.clone(),
            review,
        })
    }

    /// Single-PR mode: fetch the pull request by number and review it.
    pub async fn review_by_id(&self, id: u64) -> Result<ReviewResult, ReviewError> {
        let pr = self.host.get_pull_request(id).await?;
        self.review(&pr).await
    }
}

/// System instruction followed by the prompt as the only user message.
pub fn conversation(prompt: String) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}
