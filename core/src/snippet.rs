use crate::tokenizer::token_spans;
use std::collections::HashSet;

/// Highlight marker pair wrapped around matched terms.
pub const HIGHLIGHT_OPEN: &str = "<mark>";
pub const HIGHLIGHT_CLOSE: &str = "</mark>";
/// Appended on each edge where the excerpt truncates a longer field.
pub const ELLIPSIS: &str = "...";

/// Target excerpt width around a match, in tokens.
pub const SNIPPET_TOKENS: usize = 30;
/// Browse-mode excerpt width, in characters.
pub const BROWSE_CHARS: usize = 200;

/// Leading excerpt for browse mode: the first `BROWSE_CHARS` characters of
/// content, with an ellipsis marker only when content actually exceeds the
/// window.
pub fn browse_snippet(content: &str) -> String {
    match content.char_indices().nth(BROWSE_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &content[..cut]),
        None => content.to_string(),
    }
}

/// Excerpt of ~`SNIPPET_TOKENS` tokens around the first occurrence of any
/// query term in `content`, with every matched occurrence inside the
/// window wrapped in the highlight markers. Falls back to the browse
/// excerpt when no term occurs in the content (e.g. the match was in the
/// title).
pub fn match_snippet(content: &str, terms: &[String]) -> String {
    let term_set: HashSet<&str> = terms.iter().map(String::as_str).collect();
    if term_set.is_empty() {
        return browse_snippet(content);
    }

    let spans = token_spans(content);
    let Some(first) = spans.iter().position(|t| term_set.contains(t.term.as_str())) else {
        return browse_snippet(content);
    };

    // Window the match with about a third of the budget as lead-in.
    let end = (first.saturating_sub(SNIPPET_TOKENS / 3) + SNIPPET_TOKENS).min(spans.len());
    let start = end.saturating_sub(SNIPPET_TOKENS);

    let mut out = String::new();
    if start > 0 {
        out.push_str(ELLIPSIS);
    }
    let mut cursor = spans[start].start;
    for span in &spans[start..end] {
        out.push_str(&content[cursor..span.start]);
        let surface = &content[span.start..span.end];
        if term_set.contains(span.term.as_str()) {
            out.push_str(HIGHLIGHT_OPEN);
            out.push_str(surface);
            out.push_str(HIGHLIGHT_CLOSE);
        } else {
            out.push_str(surface);
        }
        cursor = span.end;
    }
    if end < spans.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, prefix: &str) -> String {
        (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn browse_snippet_short_content_untouched() {
        assert_eq!(browse_snippet("short body"), "short body");
    }

    #[test]
    fn browse_snippet_truncates_with_ellipsis() {
        let content = "x".repeat(450);
        let s = browse_snippet(&content);
        assert!(s.ends_with(ELLIPSIS));
        assert_eq!(s.chars().count(), BROWSE_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn browse_snippet_exactly_at_boundary_has_no_ellipsis() {
        let content = "y".repeat(BROWSE_CHARS);
        assert_eq!(browse_snippet(&content), content);
    }

    #[test]
    fn highlights_every_occurrence_in_window() {
        let content = "Apoptosis regulates growth; apoptosis also prunes cells.";
        let s = match_snippet(content, &["apoptosis".to_string()]);
        assert_eq!(s.matches(HIGHLIGHT_OPEN).count(), 2);
        assert!(s.contains("<mark>Apoptosis</mark>"));
        assert!(s.contains("<mark>apoptosis</mark>"));
        // Whole field fits the window: no ellipsis on either edge.
        assert!(!s.contains(ELLIPSIS));
    }

    #[test]
    fn window_truncation_marks_both_edges() {
        let content = format!("{} apoptosis {}", words(60, "pre"), words(60, "post"));
        let s = match_snippet(&content, &["apoptosis".to_string()]);
        assert!(s.starts_with(ELLIPSIS));
        assert!(s.ends_with(ELLIPSIS));
        assert!(s.contains("<mark>apoptosis</mark>"));
        // ~30 tokens survive between the markers.
        let inner = s.trim_start_matches(ELLIPSIS).trim_end_matches(ELLIPSIS);
        assert_eq!(inner.split_whitespace().count(), SNIPPET_TOKENS);
    }

    #[test]
    fn match_near_start_keeps_leading_edge() {
        let content = format!("apoptosis {}", words(60, "w"));
        let s = match_snippet(&content, &["apoptosis".to_string()]);
        assert!(s.starts_with(HIGHLIGHT_OPEN));
        assert!(s.ends_with(ELLIPSIS));
    }

    #[test]
    fn falls_back_to_browse_when_terms_absent_from_content() {
        let content = "A body that never mentions the query term.";
        let s = match_snippet(content, &["mitochondria".to_string()]);
        assert_eq!(s, browse_snippet(content));
    }

    #[test]
    fn preserves_inter_token_punctuation() {
        let content = "Bone loss, muscle atrophy: spaceflight effects.";
        let s = match_snippet(content, &["atrophy".to_string()]);
        assert!(s.contains("loss, muscle"));
        assert!(s.contains("<mark>atrophy</mark>:"));
    }
}
