use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::llm::gigachat;
use crate::pr::{bitbucket, github};
use crate::review::budget::DEFAULT_MAX_CHARS;
use crate::review::prompt::{PromptSettings, DEFAULT_LANGUAGE};

pub const CONFIG_FILE: &str = ".pr-reviewer.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Top-level configuration loaded from .pr-reviewer.toml.
/// All fields are optional; environment variables and CLI flags fill
/// and override them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub bitbucket: BitbucketConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// Repository as `owner/name` or URL
    pub repo: Option<String>,
    pub token: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BitbucketConfig {
    /// Repository as `workspace/name` or URL
    pub repo: Option<String>,
    pub username: Option<String>,
    /// App password
    pub token: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewConfig {
    /// Characters of diff content allowed in one prompt
    pub max_diff_chars: Option<usize>,
    /// Language the review is written in
    pub language: Option<String>,
}

/// Values passed on the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo: Option<String>,
    pub github_token: Option<String>,
    pub bitbucket_username: Option<String>,
    pub bitbucket_token: Option<String>,
    pub bitbucket_api_url: Option<String>,
    pub gigachat_token: Option<String>,
    pub gigachat_url: Option<String>,
    pub gigachat_model: Option<String>,
}

/// Resolved GitHub connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub repo: String,
    pub token: String,
    pub api_url: String,
}

/// Resolved Bitbucket connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketSettings {
    pub repo: String,
    pub username: String,
    pub token: String,
    pub api_url: String,
}

/// Resolved chat endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub token: String,
    pub api_url: String,
    pub model: String,
}

impl Config {
    /// Load .pr-reviewer.toml from the current directory (if present),
    /// overlay the process environment, then the CLI overrides.
    pub fn load(overrides: &Overrides) -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay environment variables. Unset or empty variables leave the
    /// current value alone.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        overlay(&mut self.github.repo, var("GITHUB_REPO"));
        overlay(&mut self.github.token, var("GITHUB_TOKEN"));
        overlay(&mut self.github.api_url, var("GITHUB_API_URL"));

        overlay(
            &mut self.bitbucket.repo,
            var("BITBUCKET_REPO").or_else(|| var("BITBUCKET_REPO_URL")),
        );
        overlay(&mut self.bitbucket.username, var("BITBUCKET_USERNAME"));
        overlay(&mut self.bitbucket.token, var("BITBUCKET_TOKEN"));
        overlay(&mut self.bitbucket.api_url, var("BITBUCKET_API_URL"));

        overlay(&mut self.llm.token, var("GIGACHAT_TOKEN"));
        overlay(&mut self.llm.api_url, var("GIGACHAT_API_URL"));
        overlay(&mut self.llm.model, var("GIGACHAT_MODEL"));
    }

    /// Overlay CLI values. `repo` applies to both hosts; only the selected
    /// one is ever resolved.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        overlay(&mut self.github.repo, overrides.repo.clone());
        overlay(&mut self.bitbucket.repo, overrides.repo.clone());
        overlay(&mut self.github.token, overrides.github_token.clone());
        overlay(&mut self.bitbucket.username, overrides.bitbucket_username.clone());
        overlay(&mut self.bitbucket.token, overrides.bitbucket_token.clone());
        overlay(&mut self.bitbucket.api_url, overrides.bitbucket_api_url.clone());
        overlay(&mut self.llm.token, overrides.gigachat_token.clone());
        overlay(&mut self.llm.api_url, overrides.gigachat_url.clone());
        overlay(&mut self.llm.model, overrides.gigachat_model.clone());
    }

    pub fn github(&self) -> Result<GitHubSettings, ConfigError> {
        Ok(GitHubSettings {
            repo: required(&self.github.repo, "GITHUB_REPO")?,
            token: required(&self.github.token, "GITHUB_TOKEN")?,
            api_url: self
                .github
                .api_url
                .clone()
                .unwrap_or_else(|| github::DEFAULT_API_URL.to_string()),
        })
    }

    pub fn bitbucket(&self) -> Result<BitbucketSettings, ConfigError> {
        Ok(BitbucketSettings {
            repo: required(&self.bitbucket.repo, "BITBUCKET_REPO or BITBUCKET_REPO_URL")?,
            username: required(&self.bitbucket.username, "BITBUCKET_USERNAME")?,
            token: required(&self.bitbucket.token, "BITBUCKET_TOKEN")?,
            api_url: self
                .bitbucket
                .api_url
                .clone()
                .unwrap_or_else(|| bitbucket::DEFAULT_API_URL.to_string()),
        })
    }

    pub fn llm(&self) -> Result<LlmSettings, ConfigError> {
        Ok(LlmSettings {
            token: required(&self.llm.token, "GIGACHAT_TOKEN")?,
            api_url: self
                .llm
                .api_url
                .clone()
                .unwrap_or_else(|| gigachat::DEFAULT_API_URL.to_string()),
            model: self
                .llm
                .model
                .clone()
                .unwrap_or_else(|| gigachat::DEFAULT_MODEL.to_string()),
        })
    }

    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            max_diff_chars: self.review.max_diff_chars.unwrap_or(DEFAULT_MAX_CHARS),
            language: self
                .review
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }
    }
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}
