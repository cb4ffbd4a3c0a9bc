use anyhow::{Context, Result};
use biosearch_core::persist::{save_archive, ArchiveMeta, ArchivePaths, ARCHIVE_VERSION};
use biosearch_core::{Article, ArticleId, ContentType, SearchEngine};
use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::path::Path;

/// One row of the scrape manifest (`scraped_summary.csv`).
#[derive(Debug, Deserialize)]
struct ManifestRow {
    article_id: ArticleId,
    url: String,
    word_count: u32,
    saved_file_path: String,
    content_type: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load scraped articles into a searchable archive", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an archive from a scrape manifest and its text files
    Build {
        /// Path to the manifest CSV
        #[arg(long, default_value = "scraped_summary.csv")]
        manifest: String,
        /// Output archive directory
        #[arg(long, default_value = "./archive")]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { manifest, output } => build_archive(&manifest, &output),
    }
}

fn build_archive(manifest: &str, output: &str) -> Result<()> {
    let engine = SearchEngine::new();
    let (loaded, skipped) = ingest_manifest(Path::new(manifest), &engine)
        .with_context(|| format!("reading manifest {manifest}"))?;
    tracing::info!(loaded, skipped, "ingested manifest");

    let articles = engine.export();
    let paths = ArchivePaths::new(output);
    let meta = ArchiveMeta {
        num_articles: articles.len() as u64,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: ARCHIVE_VERSION,
    };
    save_archive(&paths, &articles, &meta)?;

    tracing::info!(output, num_articles = articles.len(), "archive build complete");
    Ok(())
}

/// Upsert one article per manifest row whose text file is readable.
/// Rows marked ERROR and unreadable files are skipped with a warning.
/// Returns (loaded, skipped).
fn ingest_manifest(manifest: &Path, engine: &SearchEngine) -> Result<(usize, usize)> {
    let mut reader = csv::Reader::from_path(manifest)?;
    let mut loaded = 0usize;
    let mut skipped = 0usize;

    for row in reader.deserialize() {
        let row: ManifestRow = row?;
        let content_type: ContentType = match row.content_type.parse() {
            Ok(ct) => ct,
            Err(err) => {
                tracing::warn!(article_id = row.article_id, %err, "skipping row");
                skipped += 1;
                continue;
            }
        };
        if content_type == ContentType::Error {
            tracing::warn!(article_id = row.article_id, "skipping failed scrape");
            skipped += 1;
            continue;
        }
        let content = match fs::read_to_string(&row.saved_file_path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    article_id = row.article_id,
                    file = %row.saved_file_path,
                    %err,
                    "skipping unreadable file"
                );
                skipped += 1;
                continue;
            }
        };

        let title = derive_title(&content, &row.url);
        engine.upsert(Article {
            article_id: row.article_id,
            url: row.url,
            title,
            content,
            word_count: row.word_count,
            content_type,
            file_path: row.saved_file_path,
        });
        loaded += 1;
    }
    Ok((loaded, skipped))
}

lazy_static! {
    static ref PMC_RE: Regex = Regex::new(r"PMC\d+").expect("valid regex");
}

const FALLBACK_TITLE: &str = "Biology Research Article";

/// Title for a record the manifest carries none for: the first substantial
/// content line, else a PMC-derived label, else a generic one.
fn derive_title(content: &str, url: &str) -> String {
    for line in content.lines() {
        let line = line.trim();
        if line.len() > 20 && line.len() < 200 {
            let line = line.trim_matches(|c: char| !c.is_alphanumeric() && c != '_');
            if !line.is_empty() {
                return line.to_string();
            }
        }
    }
    if let Some(m) = PMC_RE.find(url) {
        return format!("{FALLBACK_TITLE} - {}", m.as_str());
    }
    FALLBACK_TITLE.to_string()
}
