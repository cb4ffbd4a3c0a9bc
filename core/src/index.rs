use crate::article::{Article, ArticleId};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single index entry: how often a term occurs in one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub article_id: ArticleId,
    pub frequency: u32,
}

/// A document that matched every query term, with its summed frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub article_id: ArticleId,
    pub frequency: u32,
}

/// Term → (article id → frequency) over title and content.
///
/// Postings live in `BTreeMap`s keyed by article id, so every iteration is
/// ascending-id and lookups stay deterministic. `doc_terms` records the
/// distinct terms each article contributed, letting `retract` remove
/// exactly those postings without a full index scan.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeMap<ArticleId, u32>>,
    doc_terms: HashMap<ArticleId, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms in the index.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of articles with postings.
    pub fn doc_count(&self) -> usize {
        self.doc_terms.len()
    }

    /// (Re)index an article's title and content, replacing any prior
    /// postings for its id first so upsert never leaves residue.
    pub fn index(&mut self, article: &Article) {
        self.retract(article.article_id);

        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in tokenize(&article.title).into_iter().chain(tokenize(&article.content)) {
            *counts.entry(term).or_insert(0) += 1;
        }

        let mut terms: Vec<String> = Vec::with_capacity(counts.len());
        for (term, tf) in counts {
            self.postings.entry(term.clone()).or_default().insert(article.article_id, tf);
            terms.push(term);
        }
        self.doc_terms.insert(article.article_id, terms);
    }

    /// Remove every posting for the article. No-op for unknown ids.
    pub fn retract(&mut self, id: ArticleId) {
        let Some(terms) = self.doc_terms.remove(&id) else { return };
        for term in terms {
            if let Some(plist) = self.postings.get_mut(&term) {
                plist.remove(&id);
                if plist.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
    }

    /// AND lookup: articles containing every one of `terms` at least once,
    /// with term frequencies summed across the query terms. Results come
    /// back in ascending article id order. An empty term slice matches
    /// nothing.
    pub fn lookup(&self, terms: &[String]) -> Vec<Candidate> {
        if terms.is_empty() {
            return Vec::new();
        }
        let mut lists: Vec<&BTreeMap<ArticleId, u32>> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings.get(term) {
                Some(plist) => lists.push(plist),
                // A term with no postings empties the whole intersection.
                None => return Vec::new(),
            }
        }
        // Drive the scan from the shortest posting list.
        let shortest = lists
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| l.len())
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut out = Vec::new();
        'docs: for (&id, &tf) in lists[shortest] {
            let mut total = tf;
            for (i, plist) in lists.iter().enumerate() {
                if i == shortest {
                    continue;
                }
                match plist.get(&id) {
                    Some(&other_tf) => total += other_tf,
                    None => continue 'docs,
                }
            }
            out.push(Candidate { article_id: id, frequency: total });
        }
        out
    }

    /// Postings for one term, ascending by article id. Mostly for tests
    /// and consistency checks.
    pub fn postings(&self, term: &str) -> Vec<Posting> {
        self.postings
            .get(term)
            .map(|plist| {
                plist
                    .iter()
                    .map(|(&article_id, &frequency)| Posting { article_id, frequency })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct indexed terms for one article, unsorted.
    pub fn terms_for(&self, id: ArticleId) -> Option<&[String]> {
        self.doc_terms.get(&id).map(|v| v.as_slice())
    }
}
