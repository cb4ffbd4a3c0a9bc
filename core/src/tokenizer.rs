use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
}

/// A token together with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    /// Normalized form used for matching.
    pub term: String,
    pub start: usize,
    pub end: usize,
}

/// NFKC-fold and lower-case a single matched token.
fn normalize(token: &str) -> String {
    token.nfkc().collect::<String>().to_lowercase()
}

/// Tokenize text into normalized terms.
///
/// Policy: scan for runs of Unicode letters/digits, NFKC-normalize and
/// lower-case each run, drop empty results. No stemming, no stopword
/// removal. Indexing and query parsing both go through here, so a term
/// that indexes is always findable by the same surface form.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| normalize(m.as_str()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Tokenize text keeping the byte span of each token in the original,
/// un-normalized text. Snippet extraction uses the spans to slice and
/// highlight surface forms while matching on normalized terms.
pub fn token_spans(text: &str) -> Vec<TokenSpan> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| TokenSpan { term: normalize(m.as_str()), start: m.start(), end: m.end() })
        .filter(|t| !t.term.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_alphanumeric() {
        let toks = tokenize("Cell-signaling: Apoptosis (2024)!");
        assert_eq!(toks, vec!["cell", "signaling", "apoptosis", "2024"]);
    }

    #[test]
    fn keeps_stopwords_and_inflections() {
        // No stemming and no stopword list: "the" and "running" index as-is.
        let toks = tokenize("The mice were running");
        assert_eq!(toks, vec!["the", "mice", "were", "running"]);
    }

    #[test]
    fn folds_unicode() {
        let toks = tokenize("Café ﬁbroblast");
        assert!(toks.contains(&"café".to_string()));
        assert!(toks.contains(&"fibroblast".to_string()));
    }

    #[test]
    fn spans_point_into_source_text() {
        let text = "Gene expression, RNA.";
        let spans = token_spans(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[0].start..spans[0].end], "Gene");
        assert_eq!(spans[0].term, "gene");
        assert_eq!(&text[spans[2].start..spans[2].end], "RNA");
        assert_eq!(spans[2].term, "rna");
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("--- !!! ---").is_empty());
    }
}
