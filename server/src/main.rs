use anyhow::Result;
use biosearch_core::persist::{load_archive, ArchivePaths};
use biosearch_core::SearchEngine;
use biosearch_server::build_app;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Archive directory produced by the indexer
    #[arg(long, default_value = "./archive")]
    archive: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let paths = ArchivePaths::new(&args.archive);
    let engine = match load_archive(&paths) {
        Ok((articles, meta)) => {
            tracing::info!(
                archive = %args.archive,
                num_articles = articles.len(),
                created_at = %meta.created_at,
                "loaded archive"
            );
            SearchEngine::from_articles(articles)
        }
        Err(err) => {
            tracing::warn!(archive = %args.archive, %err, "no readable archive, starting empty");
            SearchEngine::new()
        }
    };

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app = build_app(Arc::new(engine), admin_token);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
