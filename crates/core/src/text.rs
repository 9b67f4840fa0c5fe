//! Plain-text helpers shared by the pipeline, prompts and exports.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(p|div|h[1-6]|li|blockquote)>|<br\s*/?>").expect("valid regex"));

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> i32 {
    text.split_whitespace().count() as i32
}

/// Truncate to at most `max_chars` characters, appending `".."` when cut.
///
/// Counts characters, not bytes, so multi-byte text never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}..", &text[..idx]),
        None => text.to_string(),
    }
}

/// Cut to at most `max_chars` characters without any marker.
pub fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// Strip HTML tags from rich-text content, keeping block boundaries as
/// newlines and decoding the common entities.
pub fn strip_html(html: &str) -> String {
    let with_breaks = BLOCK_END_RE.replace_all(html, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the XML/HTML entities that appear in editor and `.docx` output.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(count_words("  The   quick\nbrown\tfox "), 4);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn truncate_appends_marker_only_when_cut() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc..");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語..");
    }

    #[test]
    fn tail_keeps_last_characters() {
        assert_eq!(tail_chars("abcdef", 2), "ef");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("日本語", 1), "語");
    }

    #[test]
    fn clip_has_no_marker() {
        assert_eq!(clip_chars("abcdef", 4), "abcd");
    }

    #[test]
    fn strip_html_keeps_paragraphs() {
        let html = "<p>She ran.</p><p>He &amp; I <b>waited</b>.</p>";
        assert_eq!(strip_html(html), "She ran.\nHe & I waited.");
    }
}
