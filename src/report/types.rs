/// Category of a failure, used to classify batch outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid credentials / repository settings
    Configuration,
    /// Connection failure or non-success HTTP status
    Transport,
    /// Success response with an unexpected body
    Protocol,
    /// Malformed input to the reviewer itself (e.g. a PR without an id)
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Protocol => write!(f, "protocol"),
            ErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// The review produced for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewResult {
    /// PR number
    pub id: u64,
    /// PR title
    pub title: String,
    /// PR web URL (may be empty when the host omitted it)
    pub url: String,
    /// Review text returned by the model
    pub review: String,
}

/// Per-item result of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Reviewed(ReviewResult),
    Failed {
        /// PR number, if the record had one
        id: Option<u64>,
        kind: ErrorKind,
        message: String,
    },
}

/// Keep only the successful reviews, preserving order.
pub fn successes(outcomes: Vec<ReviewOutcome>) -> Vec<ReviewResult> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            ReviewOutcome::Reviewed(result) => Some(result),
            ReviewOutcome::Failed { .. } => None,
        })
        .collect()
}
