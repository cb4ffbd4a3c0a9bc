use crate::article::Article;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Archive directory metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveMeta {
    pub num_articles: u64,
    pub created_at: String,
    pub version: u32,
}

pub const ARCHIVE_VERSION: u32 = 1;

/// Well-known file locations inside an archive directory.
pub struct ArchivePaths {
    pub root: PathBuf,
}

impl ArchivePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn articles(&self) -> PathBuf {
        self.root.join("articles.bin")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Write the article set and its metadata. Only articles are persisted;
/// the inverted index is derived state and is rebuilt on load.
pub fn save_archive(paths: &ArchivePaths, articles: &[Article], meta: &ArchiveMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.articles())?;
    let bytes = bincode::serialize(articles)?;
    f.write_all(&bytes)?;

    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_archive(paths: &ArchivePaths) -> Result<(Vec<Article>, ArchiveMeta)> {
    let mut f = File::open(paths.articles())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let articles: Vec<Article> = bincode::deserialize(&buf)?;

    let mut f = File::open(paths.meta())?;
    let mut json = String::new();
    f.read_to_string(&mut json)?;
    let meta: ArchiveMeta = serde_json::from_str(&json)?;
    Ok((articles, meta))
}
