mod config;
mod llm;
mod pr;
mod report;
mod review;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use llm::gigachat::GigaChatClient;
use pr::bitbucket::BitbucketClient;
use pr::github::GitHubClient;
use pr::HostingService;
use review::{batch, Reviewer};

/// PR Reviewer — sends GitHub or Bitbucket Pull Requests to a GigaChat
/// (OpenAI-compatible) endpoint for a quick code review.
///
/// With a PR number, reviews that one pull request. Without one, reviews
/// every open pull request and posts each review back as a comment.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    /// Pull Request number to review. Omit to review all open PRs.
    pr: Option<u64>,

    /// Code host to talk to
    #[arg(long, value_enum, default_value_t = Provider::Github)]
    provider: Provider,

    /// Repository as owner/name or URL. Overrides GITHUB_REPO / BITBUCKET_REPO.
    #[arg(long)]
    repo: Option<String>,

    /// GitHub token. Overrides GITHUB_TOKEN.
    #[arg(long)]
    github_token: Option<String>,

    /// Bitbucket username (app password auth). Overrides BITBUCKET_USERNAME.
    #[arg(long)]
    bitbucket_username: Option<String>,

    /// Bitbucket app password. Overrides BITBUCKET_TOKEN.
    #[arg(long)]
    bitbucket_token: Option<String>,

    /// Bitbucket API base url. Overrides BITBUCKET_API_URL.
    #[arg(long)]
    bitbucket_api_url: Option<String>,

    /// GigaChat token. Overrides GIGACHAT_TOKEN.
    #[arg(long)]
    gigachat_token: Option<String>,

    /// GigaChat API base url. Overrides GIGACHAT_API_URL.
    #[arg(long)]
    gigachat_url: Option<String>,

    /// GigaChat model name. Overrides GIGACHAT_MODEL.
    #[arg(long)]
    gigachat_model: Option<String>,

    /// Post the review as a PR comment in single-PR mode
    /// (review-all mode always posts)
    #[arg(long)]
    post: bool,

    /// Optional output file path for a markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging for troubleshooting
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Github,
    Bitbucket,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            repo: self.repo.clone(),
            github_token: self.github_token.clone(),
            bitbucket_username: self.bitbucket_username.clone(),
            bitbucket_token: self.bitbucket_token.clone(),
            bitbucket_api_url: self.bitbucket_api_url.clone(),
            gigachat_token: self.gigachat_token.clone(),
            gigachat_url: self.gigachat_url.clone(),
            gigachat_model: self.gigachat_model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let config = config::Config::load(&cli.overrides())?;

    let host: Box<dyn HostingService> = match cli.provider {
        Provider::Github => {
            let settings = config.github()?;
            Box::new(GitHubClient::new(&settings.repo, &settings.token, &settings.api_url)?)
        }
        Provider::Bitbucket => {
            let settings = config.bitbucket()?;
            Box::new(BitbucketClient::new(
                &settings.repo,
                &settings.username,
                &settings.token,
                &settings.api_url,
            )?)
        }
    };
    let llm_settings = config.llm()?;
    let chat = GigaChatClient::new(&llm_settings.token, &llm_settings.api_url, &llm_settings.model)?;
    let prompt_settings = config.prompt_settings();
    debug!(
        provider = ?cli.provider,
        repo = %host.repository(),
        model = %llm_settings.model,
        max_diff_chars = prompt_settings.max_diff_chars,
        "configuration resolved"
    );

    let (reviews, failed) = match cli.pr {
        Some(id) => {
            let reviewer = Reviewer::new(host.as_ref(), &chat, prompt_settings, cli.post);
            let result = reviewer
                .review_by_id(id)
                .instrument(info_span!("review_pr", pr = id))
                .await
                .map_err(|e| format!("Failed to review PR #{id}: {e}"))?;
            (vec![result], 0)
        }
        None => {
            let reviewer = Reviewer::new(host.as_ref(), &chat, prompt_settings, true);
            let outcomes = batch::review_open(&reviewer)
                .await
                .map_err(|e| format!("Failed to list open PRs: {e}"))?;
            let mut failed = 0usize;
            for outcome in &outcomes {
                if let report::ReviewOutcome::Failed { id, kind, message } = outcome {
                    failed += 1;
                    let pr = id.map_or_else(|| "?".to_string(), |id| id.to_string());
                    warn!(pr = %pr, %kind, "not reviewed: {message}");
                }
            }
            if failed > 0 {
                warn!(failed, total = outcomes.len(), "some pull requests were not reviewed");
            }
            (report::successes(outcomes), failed)
        }
    };

    report::output(&reviews, failed, cli.output.as_deref())?;
    info!(reviews = reviews.len(), "done");
    Ok(())
}
