use crate::article::{Article, ArticleId, ArticleStore, ContentType, Statistics};
use crate::error::SearchError;
use crate::index::InvertedIndex;
use crate::snippet::{browse_snippet, match_snippet};
use crate::tokenizer::tokenize;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Hard ceiling on flat search results, matching the API's limit clamp.
pub const MAX_RESULTS: usize = 100;

/// One search result as surfaced to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub article_id: ArticleId,
    pub url: String,
    pub title: String,
    pub word_count: u32,
    pub content_type: ContentType,
    pub snippet: String,
}

/// One window of paginated results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: usize,
    pub hits: Vec<SearchHit>,
    /// Heuristic: true when the full ranked result count reached
    /// `per_page * page`. Can report a phantom next page when the result
    /// set ends exactly on a page boundary.
    pub has_more: bool,
}

struct EngineState {
    store: ArticleStore,
    index: InvertedIndex,
}

/// The search service: Document Store and Inverted Index behind a single
/// writer lock, so no reader ever observes an article without its postings
/// or postings without their article.
///
/// One long-lived instance is constructed at startup and shared by
/// reference; there is no ambient global.
pub struct SearchEngine {
    state: RwLock<EngineState>,
    max_results: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState { store: ArticleStore::new(), index: InvertedIndex::new() }),
            max_results: MAX_RESULTS,
        }
    }

    /// Build an engine from an already-ingested article set, e.g. a loaded
    /// archive. The index is derived state and is rebuilt here.
    pub fn from_articles<I>(articles: I) -> Self
    where
        I: IntoIterator<Item = Article>,
    {
        let engine = Self::new();
        for article in articles {
            engine.upsert(article);
        }
        engine
    }

    /// Insert or fully replace the record keyed by `article_id`. Store and
    /// index are updated in one critical section.
    pub fn upsert(&self, article: Article) {
        let mut state = self.state.write();
        state.index.index(&article);
        state.store.upsert(article);
    }

    /// Remove the record and retract it from the index.
    pub fn delete(&self, id: ArticleId) -> Result<(), SearchError> {
        let mut state = self.state.write();
        if state.store.remove(id).is_none() {
            return Err(SearchError::NotFound(id));
        }
        state.index.retract(id);
        Ok(())
    }

    /// Point lookup. Absence is `NotFound`, distinct from an empty search.
    pub fn get(&self, id: ArticleId) -> Result<Article, SearchError> {
        self.state.read().store.get(id).cloned().ok_or(SearchError::NotFound(id))
    }

    pub fn statistics(&self) -> Statistics {
        self.state.read().store.statistics()
    }

    pub fn article_count(&self) -> usize {
        self.state.read().store.len()
    }

    /// Snapshot of all articles in ascending id order, for archiving.
    pub fn export(&self) -> Vec<Article> {
        self.state.read().store.iter().cloned().collect()
    }

    /// Ranked search. An empty or blank query is browse mode: the first
    /// `limit` articles by ascending id. `limit` must be positive and is
    /// clamped to `MAX_RESULTS`.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if limit == 0 {
            return Err(SearchError::InvalidInput("limit must be positive".into()));
        }
        let limit = limit.min(self.max_results);
        let state = self.state.read();
        Self::search_locked(&state, query, limit)
    }

    /// Paginated search over the same ranked order: compute the first
    /// `per_page * page` results and slice the requested window. O(p·s)
    /// recomputation per request; fine at tens of thousands of documents.
    /// Unlike `search`, the internal limit is not clamped, otherwise deep
    /// pages would be unreachable.
    pub fn page(&self, query: &str, page: usize, per_page: usize) -> Result<SearchPage, SearchError> {
        if page == 0 || per_page == 0 {
            return Err(SearchError::InvalidInput("page and per_page must be positive".into()));
        }
        let limit = per_page.saturating_mul(page);
        let state = self.state.read();
        let full = Self::search_locked(&state, query, limit)?;

        let has_more = full.len() >= limit;
        let start = (page - 1).saturating_mul(per_page).min(full.len());
        let hits = full.into_iter().skip(start).take(per_page).collect();
        Ok(SearchPage { page, hits, has_more })
    }

    fn search_locked(state: &EngineState, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if query.trim().is_empty() {
            return Ok(state
                .store
                .iter()
                .take(limit)
                .map(|a| Self::hit(a, browse_snippet(&a.content)))
                .collect());
        }

        let mut terms = tokenize(query);
        // Duplicate query terms neither tighten the AND nor double-count tf.
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = state.index.lookup(&terms);
        // Highest summed tf first; ascending article id breaks ties. The
        // stable sort keeps lookup's id order within equal scores.
        candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        candidates.truncate(limit);

        let mut hits = Vec::with_capacity(candidates.len());
        for c in candidates {
            let Some(article) = state.store.get(c.article_id) else {
                tracing::error!(article_id = c.article_id, "posting references missing article");
                return Err(SearchError::IndexInconsistency(format!(
                    "posting references missing article {}",
                    c.article_id
                )));
            };
            hits.push(Self::hit(article, match_snippet(&article.content, &terms)));
        }
        Ok(hits)
    }

    fn hit(article: &Article, snippet: String) -> SearchHit {
        SearchHit {
            article_id: article.article_id,
            url: article.url.clone(),
            title: article.title.clone(),
            word_count: article.word_count,
            content_type: article.content_type,
            snippet,
        }
    }
}
