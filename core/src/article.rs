use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type ArticleId = u32;

/// How the article body was obtained. Serialized upper-case to match the
/// scrape manifest and the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    Html,
    Pdf,
    Error,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Html => "HTML",
            ContentType::Pdf => "PDF",
            ContentType::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTML" => Ok(ContentType::Html),
            "PDF" => Ok(ContentType::Pdf),
            "ERROR" => Ok(ContentType::Error),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// Canonical article record. `article_id` is assigned at scrape time and is
/// stable across re-ingestion; re-upserting the same id replaces the whole
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub article_id: ArticleId,
    pub url: String,
    pub title: String,
    pub content: String,
    pub word_count: u32,
    pub content_type: ContentType,
    /// Provenance: path of the scraped text file this record came from.
    pub file_path: String,
}

/// Whitespace-split word count, the same rule the scraper applies when it
/// writes the manifest.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Aggregate view over the current article set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_articles: u64,
    pub total_words: u64,
    /// Rounded to the nearest integer; 0 for an empty store.
    pub average_words: u64,
    pub content_types: BTreeMap<ContentType, u64>,
}

/// The Document Store: canonical article records keyed by id, kept in id
/// order so browse mode iterates ascending without a sort.
#[derive(Debug, Default)]
pub struct ArticleStore {
    articles: BTreeMap<ArticleId, Article>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace, returning the prior record if any.
    pub fn upsert(&mut self, article: Article) -> Option<Article> {
        self.articles.insert(article.article_id, article)
    }

    pub fn get(&self, id: ArticleId) -> Option<&Article> {
        self.articles.get(&id)
    }

    pub fn remove(&mut self, id: ArticleId) -> Option<Article> {
        self.articles.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Articles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    /// Full scan; cheap at this corpus size.
    pub fn statistics(&self) -> Statistics {
        let total_articles = self.articles.len() as u64;
        let total_words: u64 = self.articles.values().map(|a| a.word_count as u64).sum();
        let mut content_types: BTreeMap<ContentType, u64> = BTreeMap::new();
        for a in self.articles.values() {
            *content_types.entry(a.content_type).or_insert(0) += 1;
        }
        let average_words = if total_articles == 0 {
            0
        } else {
            (total_words as f64 / total_articles as f64).round() as u64
        };
        Statistics { total_articles, total_words, average_words, content_types }
    }
}
