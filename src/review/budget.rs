use std::borrow::Cow;

/// Appended to diff content that was cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "\n... truncated ...";

/// Characters of diff content allowed in one prompt unless configured otherwise.
pub const DEFAULT_MAX_CHARS: usize = 12_000;

/// A chunk that made it into the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budgeted<'a> {
    /// Position of the chunk in the input sequence
    pub index: usize,
    /// Chunk text, ending in [`TRUNCATION_MARKER`] when `truncated` is set
    pub text: Cow<'a, str>,
    pub truncated: bool,
}

impl Budgeted<'_> {
    fn mark_truncated(&mut self) {
        if !self.truncated {
            self.text.to_mut().push_str(TRUNCATION_MARKER);
            self.truncated = true;
        }
    }
}

/// Fit `chunks` into `max_chars` characters, in order.
///
/// Chunks are taken whole while they fit. The first chunk that does not fit
/// is cut to the remaining characters, gets the marker, and ends the pass.
/// If a chunk uses up the budget exactly and non-empty input is left over,
/// that chunk gets the marker instead. A zero budget yields nothing at all.
pub fn budget_chunks<'a, I>(chunks: I, max_chars: usize) -> Vec<Budgeted<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut emitted: Vec<Budgeted<'a>> = Vec::new();
    let mut used = 0usize;
    let mut chunks = chunks.into_iter().enumerate();

    while let Some((index, chunk)) = chunks.next() {
        let remaining = max_chars.saturating_sub(used);
        if remaining == 0 {
            let dropped_content = !chunk.is_empty() || chunks.any(|(_, c)| !c.is_empty());
            if dropped_content {
                if let Some(last) = emitted.last_mut() {
                    last.mark_truncated();
                }
            }
            break;
        }

        match char_boundary(chunk, remaining) {
            Some(cut) => {
                let mut text = String::with_capacity(cut + TRUNCATION_MARKER.len());
                text.push_str(&chunk[..cut]);
                text.push_str(TRUNCATION_MARKER);
                emitted.push(Budgeted {
                    index,
                    text: Cow::Owned(text),
                    truncated: true,
                });
                break;
            }
            None => {
                used += chunk.chars().count();
                emitted.push(Budgeted {
                    index,
                    text: Cow::Borrowed(chunk),
                    truncated: false,
                });
            }
        }
    }

    emitted
}

/// Concatenation of the budgeted chunks.
pub fn budget<'a, I>(chunks: I, max_chars: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    budget_chunks(chunks, max_chars)
        .into_iter()
        .map(|b| b.text)
        .collect()
}

/// Byte offset after the first `max_chars` characters of `text`,
/// or `None` if the whole text fits.
fn char_boundary(text: &str, max_chars: usize) -> Option<usize> {
    text.char_indices().nth(max_chars).map(|(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content<'a>(chunk: &'a Budgeted<'_>) -> &'a str {
        chunk
            .text
            .strip_suffix(TRUNCATION_MARKER)
            .filter(|_| chunk.truncated)
            .unwrap_or(chunk.text.as_ref())
    }

    #[test]
    fn test_everything_fits() {
        assert_eq!(budget(["abc", "def"], 10), "abcdef");
        let chunks = budget_chunks(["abc", "def"], 10);
        assert!(chunks.iter().all(|c| !c.truncated));
    }

    #[test]
    fn test_cut_inside_second_chunk_stops_pass() {
        let chunks = budget_chunks(["abc", "defgh", "ijk"], 5);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "abc");
        assert_eq!(chunks[1].index, 1);
        assert_eq!(content(&chunks[1]), "de");
        assert_eq!(chunks[1].text, format!("de{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_single_text_is_cut_with_marker() {
        assert_eq!(
            budget(["0123456789abcdefghij"], 10),
            format!("0123456789{TRUNCATION_MARKER}")
        );
    }

    #[test]
    fn test_zero_budget_emits_nothing() {
        assert!(budget_chunks(["abc", "def"], 0).is_empty());
        assert_eq!(budget(["abc"], 0), "");
    }

    #[test]
    fn test_exact_fit_with_leftover_marks_last_chunk() {
        let chunks = budget_chunks(["abcde", "fg"], 5);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].truncated);
        assert_eq!(content(&chunks[0]), "abcde");
    }

    #[test]
    fn test_exact_fit_without_leftover_has_no_marker() {
        assert_eq!(budget(["abc", "de"], 5), "abcde");
        assert_eq!(budget(["abc", "de", ""], 5), "abcde");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(budget(["héllo wörld"], 5), format!("héllo{TRUNCATION_MARKER}"));
        assert_eq!(budget(["日本語"], 3), "日本語");
    }

    #[test]
    fn test_marker_iff_input_exceeds_budget() {
        let inputs: [&[&str]; 5] = [
            &["a", "bb", "ccc"],
            &["abcdef"],
            &["", "xyz", ""],
            &["ab", "", "cd", "e"],
            &[],
        ];
        for chunks in inputs {
            let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
            for max in 1..=8 {
                let out = budget_chunks(chunks.iter().copied(), max);
                let kept: usize = out.iter().map(|b| content(b).chars().count()).sum();
                let marked = out.iter().any(|b| b.truncated);
                assert!(kept <= max, "{chunks:?} max={max}");
                assert_eq!(marked, total > max, "{chunks:?} max={max}");
            }
        }
    }
}
