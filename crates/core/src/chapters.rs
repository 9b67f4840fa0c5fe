//! Manuscript chunking: chapter-heading detection with a fixed-size fallback.
//!
//! The import pipeline feeds each [`Chunk`] to the model as one chapter. A
//! manuscript with at least two recognisable headings is split on them;
//! anything else is sliced into [`FALLBACK_CHUNK_CHARS`]-sized pieces cut at
//! paragraph or whitespace boundaries.

use std::sync::LazyLock;

use regex::Regex;

/// Target size of a fallback slice, in characters.
pub const FALLBACK_CHUNK_CHARS: usize = 12_000;

/// Headings longer than this are treated as prose, not headings.
const MAX_HEADING_CHARS: usize = 80;

/// Leading text shorter than this (title pages, dedications) is dropped.
const MIN_PREAMBLE_CHARS: usize = 200;

const NUMBER_WORD: &str = "one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|\
thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|thirty|forty|fifty|\
sixty|seventy|eighty|ninety|hundred";

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    let number = format!(r"(?:\d+|[ivxlcdm]+|(?:{NUMBER_WORD})(?:[\s-](?:{NUMBER_WORD}))*)");
    let pattern = format!(
        r"(?i)^\s*(?:(?:chapter|ch\.|part)\s+{number}|prologue|epilogue)\b\s*[:.\-]?\s*(.*?)\s*$"
    );
    Regex::new(&pattern).expect("valid regex")
});

/// One manuscript slice destined to become a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the manuscript.
    pub index: usize,
    /// Heading line as written (`"Chapter 3: The Fall"`), if any.
    pub heading: Option<String>,
    /// Title text following the heading number, if any.
    pub title: Option<String>,
    pub text: String,
}

impl Chunk {
    /// Best human title: explicit title, else the heading, else `Part N`.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.heading.clone())
            .unwrap_or_else(|| format!("Part {}", self.index + 1))
    }
}

/// Parse a single line as a chapter heading, returning the trailing title.
///
/// Returns `None` when the line is not a heading, `Some(None)` for a bare
/// heading (`"Chapter 4"`), and `Some(Some(title))` otherwise.
pub fn parse_heading(line: &str) -> Option<Option<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    let caps = HEADING_RE.captures(trimmed)?;
    let title = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());
    Some(title)
}

/// Split a manuscript into chunks.
pub fn split_manuscript(text: &str) -> Vec<Chunk> {
    let headings = find_headings(text);
    if headings.len() >= 2 {
        split_on_headings(text, &headings)
    } else {
        split_fixed(text, FALLBACK_CHUNK_CHARS)
    }
}

struct Heading {
    start: usize,
    body_start: usize,
    line: String,
    title: Option<String>,
}

fn find_headings(text: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some(title) = parse_heading(line) {
            found.push(Heading {
                start: offset,
                body_start: offset + line.len(),
                line: line.trim().to_string(),
                title,
            });
        }
        offset += line.len();
    }
    found
}

fn split_on_headings(text: &str, headings: &[Heading]) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    let preamble = text[..headings[0].start].trim();
    if preamble.chars().count() >= MIN_PREAMBLE_CHARS {
        chunks.push(Chunk {
            index: 0,
            heading: None,
            title: None,
            text: preamble.to_string(),
        });
    }

    for (i, heading) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map_or(text.len(), |next| next.start);
        let body = text[heading.body_start..end].trim();
        if body.is_empty() {
            continue;
        }
        chunks.push(Chunk {
            index: chunks.len(),
            heading: Some(heading.line.clone()),
            title: heading.title.clone(),
            text: body.to_string(),
        });
    }
    chunks
}

/// Slice `text` into pieces of roughly `max_chars` characters.
///
/// Each cut prefers the last blank line in the window, then the last
/// whitespace, and only splits mid-word when the window has neither.
pub fn split_fixed(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(idx, _)| idx);
        let cut = if window_end == rest.len() {
            rest.len()
        } else {
            let window = &rest[..window_end];
            window
                .rfind("\n\n")
                .filter(|&i| i > window.len() / 2)
                .or_else(|| window.rfind(char::is_whitespace).filter(|&i| i > 0))
                .unwrap_or(window_end)
        };
        let piece = rest[..cut].trim();
        if !piece.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                heading: None,
                title: None,
                text: piece.to_string(),
            });
        }
        rest = rest[cut..].trim_start();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_heading_styles() {
        assert_eq!(parse_heading("Chapter 12"), Some(None));
        assert_eq!(
            parse_heading("CHAPTER TWELVE: The Fall"),
            Some(Some("The Fall".to_string()))
        );
        assert_eq!(parse_heading("Ch. 3 - Arrival"), Some(Some("Arrival".to_string())));
        assert_eq!(parse_heading("Chapter twenty-one"), Some(None));
        assert_eq!(parse_heading("Prologue"), Some(None));
        assert_eq!(parse_heading("  Epilogue: After  "), Some(Some("After".to_string())));
        assert_eq!(parse_heading("Part IV"), Some(None));
    }

    #[test]
    fn prose_is_not_a_heading() {
        assert_eq!(parse_heading("Chapters of her life went by."), None);
        assert_eq!(parse_heading("The chapter 3 notes were lost"), None);
        assert_eq!(parse_heading(""), None);
        let long = format!("Chapter 1 {}", "word ".repeat(30));
        assert_eq!(parse_heading(&long), None);
    }

    #[test]
    fn splits_on_headings() {
        let text = "Chapter 1: Dawn\nShe woke.\n\nChapter 2\nHe slept.\nStill sleeping.\n";
        let chunks = split_manuscript(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title.as_deref(), Some("Dawn"));
        assert_eq!(chunks[0].text, "She woke.");
        assert_eq!(chunks[1].heading.as_deref(), Some("Chapter 2"));
        assert_eq!(chunks[1].display_title(), "Chapter 2");
        assert_eq!(chunks[1].text, "He slept.\nStill sleeping.");
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn long_preamble_becomes_first_chunk() {
        let preamble = "Front matter. ".repeat(20);
        let text = format!("{preamble}\nChapter 1\nOne.\nChapter 2\nTwo.\n");
        let chunks = split_manuscript(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].heading.is_none());
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn single_heading_falls_back_to_fixed_slices() {
        let body = "word ".repeat(5_000);
        let text = format!("Chapter 1\n{body}");
        let chunks = split_manuscript(&text);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.heading.is_none()));
        assert!(chunks
            .iter()
            .all(|c| c.text.chars().count() <= FALLBACK_CHUNK_CHARS));
    }

    #[test]
    fn fixed_split_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(70), "b".repeat(50));
        let chunks = split_fixed(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a".repeat(70));
        assert_eq!(chunks[1].text, "b".repeat(50));
    }

    #[test]
    fn fixed_split_of_empty_text_is_empty() {
        assert!(split_fixed("   ", 100).is_empty());
    }
}
