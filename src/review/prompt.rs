use super::budget::{budget, budget_chunks, DEFAULT_MAX_CHARS};
use crate::pr::{DiffChunk, PullRequest};

pub const NO_DESCRIPTION: &str = "No description provided.";

pub const DEFAULT_LANGUAGE: &str = "Russian";

/// Settings fixed for the lifetime of a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    /// Characters of diff content allowed in the prompt
    pub max_diff_chars: usize,
    /// Natural language the review should be written in
    pub language: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            max_diff_chars: DEFAULT_MAX_CHARS,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Render the review prompt for a pull request.
///
/// Layout: metadata header, then either one `File:`/`Patch:` section per
/// file with a non-empty patch or a single `Diff:` section, then the review
/// instructions. Pure: the same input always gives the same text.
pub fn build_prompt(pr: &PullRequest, diff: &DiffChunk, settings: &PromptSettings) -> String {
    let mut prompt = header(pr);

    match diff {
        DiffChunk::Patches(files) => {
            let with_patch: Vec<_> = files
                .iter()
                .filter_map(|f| f.body().map(|body| (f, body)))
                .collect();
            let budgeted = budget_chunks(
                with_patch.iter().map(|(_, body)| *body),
                settings.max_diff_chars,
            );
            let sections: Vec<String> = budgeted
                .iter()
                .map(|chunk| {
                    let (file, _) = with_patch[chunk.index];
                    format!(
                        "\nFile: {} ({})\nPatch:\n{}\n",
                        file.filename, file.status, chunk.text
                    )
                })
                .collect();
            prompt.push_str(&sections.join("\n"));
        }
        DiffChunk::Unified(text) => {
            let body = budget([text.as_str()], settings.max_diff_chars);
            prompt.push_str(&format!("\nDiff:\n{body}"));
        }
    }

    prompt.push('\n');
    prompt.push_str(&instructions(&settings.language));
    prompt
}

fn header(pr: &PullRequest) -> String {
    let id = pr.id.map_or_else(|| "?".to_string(), |id| id.to_string());
    let description = pr
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_DESCRIPTION);
    format!(
        "Repository: {}\nPull Request: #{} {}\nAuthor: {}\nURL: {}\nDescription:\n{}\n",
        pr.repository, id, pr.title, pr.author, pr.url, description
    )
}

fn instructions(language: &str) -> String {
    format!(
        "Review the pull request. Highlight critical issues first, then suggestions \
         and improvements. Keep the answer concise and write it in {language}."
    )
}
