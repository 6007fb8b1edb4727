pub mod types;

pub use types::{successes, ErrorKind, ReviewOutcome, ReviewResult};

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Print reviews to the terminal (default) or write them to a markdown file.
///
/// `failed` counts pull requests that could not be reviewed; it only changes
/// the text shown when there is no review at all.
#[instrument(skip(reviews), fields(reviews = reviews.len()))]
pub fn output(
    reviews: &[ReviewResult],
    failed: usize,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing reviews to terminal");
            print!("{}", render_terminal(reviews, failed));
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing reviews to file");
            std::fs::write(path, render_markdown(reviews, failed))?;
            Ok(())
        }
    }
}

/// Terminal layout:
///
/// [PR #42] Add OAuth2 login flow
/// https://github.com/org/repo/pull/42
/// <review text>
/// ----------------------------------------
fn render_terminal(reviews: &[ReviewResult], failed: usize) -> String {
    if reviews.is_empty() {
        return empty_message(failed);
    }

    let mut out = String::new();
    for review in reviews {
        out.push_str(&format!(
            "{}\n",
            format!("[PR #{}] {}", review.id, review.title).as_str().bold()
        ));
        if !review.url.is_empty() {
            out.push_str(&format!("{}\n", review.url.as_str().cyan()));
        }
        out.push_str(&review.review);
        out.push('\n');
        out.push_str(&"-".repeat(40));
        out.push('\n');
    }
    out
}

fn render_markdown(reviews: &[ReviewResult], failed: usize) -> String {
    if reviews.is_empty() {
        return empty_message(failed);
    }

    let mut md = String::new();
    for review in reviews {
        md.push_str(&format!("# PR #{}: \"{}\"\n\n", review.id, review.title));
        if !review.url.is_empty() {
            md.push_str(&format!("<{}>\n\n", review.url));
        }
        md.push_str(review.review.trim_end());
        md.push_str("\n\n");
    }
    md
}

fn empty_message(failed: usize) -> String {
    if failed == 0 {
        "No open pull requests.\n".to_string()
    } else {
        format!("No pull requests were reviewed ({failed} failed).\n")
    }
}
