use anyhow::{anyhow, Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{header, Client};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scraper")]
#[command(about = "Scrape biology article pages into text files and a manifest")]
struct Cli {
    /// Publications CSV; the URL is taken from the second column
    #[arg(long, default_value = "SB_publication_PMC.csv")]
    input: String,
    /// Directory for the per-article text files
    #[arg(long, default_value = "scraped_articles")]
    output_dir: String,
    /// Manifest CSV consumed by the indexer
    #[arg(long, default_value = "scraped_summary.csv")]
    manifest: String,
    /// Resume checkpoint
    #[arg(long, default_value = "scraping_progress.json")]
    progress: String,
    /// Delay before each request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// User-Agent header for all requests
    #[arg(long, default_value = "biosearch-scraper/0.1 (research corpus builder)")]
    user_agent: String,
    /// Stop after this many URLs (all by default)
    #[arg(long)]
    limit: Option<usize>,
}

/// Resume state, saved every few articles so an interrupted run skips
/// what it already fetched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Progress {
    completed_urls: HashSet<String>,
    success_count: u64,
    error_count: u64,
}

/// One manifest row. ERROR outcomes are tracked here too but filtered out
/// when the manifest is written.
#[derive(Debug, Serialize)]
struct ManifestRow {
    article_id: u32,
    url: String,
    word_count: u32,
    saved_file_path: String,
    content_type: String,
}

struct ArticleScraper {
    client: Client,
    output_dir: PathBuf,
    manifest_path: PathBuf,
    progress_path: PathBuf,
    progress: Progress,
    rows: Vec<ManifestRow>,
    content_selectors: Vec<Selector>,
    body_selector: Selector,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let urls = load_urls_from_csv(Path::new(&args.input))
        .with_context(|| format!("reading publications CSV {}", args.input))?;
    if urls.is_empty() {
        return Err(anyhow!("no valid URLs in {}", args.input));
    }
    let total = match args.limit {
        Some(n) => urls.len().min(n),
        None => urls.len(),
    };

    let mut scraper = ArticleScraper::new(&args)?;
    tracing::info!(
        total,
        previously_completed = scraper.progress.completed_urls.len(),
        output_dir = %args.output_dir,
        "starting scrape"
    );

    for (article_id, url) in urls.into_iter().take(total) {
        if scraper.progress.completed_urls.contains(&url) {
            tracing::info!(article_id, %url, "already processed, skipping");
            continue;
        }
        sleep(Duration::from_millis(args.delay_ms)).await;

        scraper.scrape_article(article_id, &url).await;

        let processed = scraper.progress.success_count + scraper.progress.error_count;
        tracing::info!(
            processed,
            total,
            successes = scraper.progress.success_count,
            errors = scraper.progress.error_count,
            "progress"
        );
        if processed % 10 == 0 {
            scraper.checkpoint()?;
        }
    }
    scraper.checkpoint()?;

    let succ = scraper.progress.success_count;
    let err = scraper.progress.error_count;
    let rate = if succ + err > 0 { succ as f64 / (succ + err) as f64 * 100.0 } else { 0.0 };
    tracing::info!(
        successes = succ,
        errors = err,
        success_rate = format!("{rate:.1}%"),
        manifest = %args.manifest,
        "scraping complete"
    );
    Ok(())
}

impl ArticleScraper {
    fn new(args: &Cli) -> Result<Self> {
        fs::create_dir_all(&args.output_dir)?;
        let client = Client::builder()
            .user_agent(args.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(args.timeout_secs))
            .build()?;

        let progress_path = PathBuf::from(&args.progress);
        let progress = load_progress(&progress_path);

        let content_selectors = [
            "main",
            "article",
            ".main-content",
            ".content",
            ".article-content",
            ".abstract",
            ".full-text",
            ".article-body",
        ]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect();

        Ok(Self {
            client,
            output_dir: PathBuf::from(&args.output_dir),
            manifest_path: PathBuf::from(&args.manifest),
            progress_path,
            progress,
            rows: Vec::new(),
            content_selectors,
            body_selector: Selector::parse("body").expect("valid selector"),
        })
    }

    /// Fetch and persist one article; failures are recorded as ERROR rows
    /// and never abort the run.
    async fn scrape_article(&mut self, article_id: u32, url: &str) {
        tracing::info!(article_id, %url, "processing article");
        match self.try_scrape(article_id, url).await {
            Ok(row) => {
                self.progress.completed_urls.insert(url.to_string());
                self.progress.success_count += 1;
                tracing::info!(article_id, word_count = row.word_count, "scraped");
                self.rows.push(row);
            }
            Err(err) => {
                self.progress.error_count += 1;
                tracing::error!(article_id, %url, %err, "scrape failed");
                self.rows.push(ManifestRow {
                    article_id,
                    url: url.to_string(),
                    word_count: 0,
                    saved_file_path: "ERROR".into(),
                    content_type: "ERROR".into(),
                });
            }
        }
    }

    async fn try_scrape(&self, article_id: u32, url: &str) -> Result<ManifestRow> {
        let is_pdf = self.is_pdf_url(url).await;
        let raw = if is_pdf {
            tracing::info!(article_id, "extracting PDF content");
            self.extract_pdf_content(url).await?
        } else {
            tracing::info!(article_id, "extracting HTML content");
            self.extract_html_content(url).await?
        };

        let cleaned = clean_text(&raw);
        if cleaned.len() < 100 {
            return Err(anyhow!("extracted text is too short or empty"));
        }

        let filename = format!("article_{article_id}.txt");
        let filepath = self.output_dir.join(&filename);
        fs::write(&filepath, &cleaned)?;

        Ok(ManifestRow {
            article_id,
            url: url.to_string(),
            word_count: cleaned.split_whitespace().count() as u32,
            saved_file_path: filepath.to_string_lossy().into_owned(),
            content_type: if is_pdf { "PDF".into() } else { "HTML".into() },
        })
    }

    /// `.pdf` suffix, else a HEAD request's content type; assume HTML when
    /// the probe fails.
    async fn is_pdf_url(&self, url: &str) -> bool {
        if url.to_lowercase().ends_with(".pdf") {
            return true;
        }
        match self.client.head(url).send().await {
            Ok(resp) => resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_lowercase().contains("application/pdf"))
                .unwrap_or(false),
            Err(err) => {
                tracing::warn!(%url, %err, "could not determine content type");
                false
            }
        }
    }

    async fn extract_html_content(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        let doc = Html::parse_document(&body);

        for sel in &self.content_selectors {
            if let Some(el) = doc.select(sel).next() {
                return Ok(element_text(el));
            }
        }
        doc.select(&self.body_selector)
            .next()
            .map(element_text)
            .ok_or_else(|| anyhow!("no content extracted"))
    }

    async fn extract_pdf_content(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        let text = pdf_extract::extract_text_from_mem(&bytes)?;
        Ok(text)
    }

    /// Save the checkpoint and rewrite the manifest (successful rows only).
    fn checkpoint(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.progress)?;
        fs::write(&self.progress_path, json)?;

        let mut writer = csv::Writer::from_path(&self.manifest_path)?;
        for row in self.rows.iter().filter(|r| r.content_type != "ERROR") {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn load_progress(path: &Path) -> Progress {
    match fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(%err, "could not parse progress file, starting fresh");
                Progress::default()
            }
        },
        Err(_) => Progress::default(),
    }
}

/// Text of an element with per-chunk trimming, one line per text node.
fn element_text(el: ElementRef) -> String {
    el.text().map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("\n")
}

lazy_static! {
    static ref WS_RE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref JUNK_RE: Regex =
        Regex::new(r#"[^\w\s.,;:!?\-()\[\]{}"'/\\]"#).expect("valid regex");
    static ref SPACES_RE: Regex = Regex::new(r" +").expect("valid regex");
}

/// Collapse whitespace, drop characters outside the allowed set, and trim.
fn clean_text(text: &str) -> String {
    let text = WS_RE.replace_all(text, " ");
    let text = JUNK_RE.replace_all(&text, " ");
    let text = SPACES_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Parse the publications CSV: header row skipped, URL in the second
/// column, ids numbered from 1 in row order. Tolerates the pipe-separated
/// variant of the input file.
fn load_urls_from_csv(path: &Path) -> Result<Vec<(u32, String)>> {
    let raw = fs::read(path)?;
    let head = &raw[..raw.len().min(1000)];
    let delimiter = if head.contains(&b'|') { b'|' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(raw.as_slice());

    let mut urls = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let Some(url) = record.get(1).map(str::trim) else { continue };
        if url.starts_with("http") {
            urls.push(((i + 1) as u32, url.to_string()));
        }
    }
    tracing::info!(count = urls.len(), file = %path.display(), "loaded URLs");
    Ok(urls)
}
