/// Snapshot of a pull request as listed or fetched from the hosting service.
/// Note: not Deserialize — each client maps its own API JSON into this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number. `None` when the listing returned a record without one;
    /// such records are rejected before review.
    pub id: Option<u64>,
    /// PR title
    pub title: String,
    /// Author display name (or login)
    pub author: String,
    /// PR description, if the author wrote one
    pub description: Option<String>,
    /// Canonical web URL
    pub url: String,
    /// Owning repository as `workspace/name`
    pub repository: String,
}

/// A single changed file as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// File path (e.g., "src/auth/config.rs")
    pub filename: String,
    /// Change status as reported upstream (added, modified, removed, renamed...).
    /// Passed through untouched.
    pub status: String,
    /// Patch text. Absent for binary files and oversized diffs.
    pub patch: Option<String>,
}

impl FilePatch {
    /// The patch body, if there is anything to show.
    pub fn body(&self) -> Option<&str> {
        self.patch.as_deref().filter(|p| !p.is_empty())
    }
}

/// Changed content of a pull request, in whichever shape the host provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffChunk {
    /// One unified diff covering the whole PR (Bitbucket).
    Unified(String),
    /// Ordered per-file patches (GitHub).
    Patches(Vec<FilePatch>),
}

impl DiffChunk {
    /// Total characters of diff content carried by this chunk.
    pub fn char_count(&self) -> usize {
        match self {
            DiffChunk::Unified(text) => text.chars().count(),
            DiffChunk::Patches(files) => files
                .iter()
                .filter_map(FilePatch::body)
                .map(|p| p.chars().count())
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(name: &str, body: Option<&str>) -> FilePatch {
        FilePatch {
            filename: name.to_string(),
            status: "modified".to_string(),
            patch: body.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_patch_has_no_body() {
        assert_eq!(patch("logo.png", None).body(), None);
        assert_eq!(patch("empty.txt", Some("")).body(), None);
        assert_eq!(patch("a.rs", Some("+x")).body(), Some("+x"));
    }

    #[test]
    fn test_char_count_skips_missing_patches() {
        let chunk = DiffChunk::Patches(vec![
            patch("a.rs", Some("abc")),
            patch("logo.png", None),
            patch("b.rs", Some("déf")),
        ]);
        assert_eq!(chunk.char_count(), 6);
        assert_eq!(DiffChunk::Unified("0123456789".to_string()).char_count(), 10);
    }
}
