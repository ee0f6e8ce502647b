use anyhow::{Context, Result};
use clap::Parser;
use hb_docs_data::{config, logging, server};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "dev-server")]
#[command(about = "Serve the generated documentation data over HTTP")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    bind: Option<String>,

    /// Data root to serve (defaults to the configured target root)
    #[arg(short, long)]
    data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let args = Args::parse();

    let mut loader = config::loader_for(args.config.as_deref())
        .override_path("paths.target_root", args.data.as_deref())?;
    if let Some(bind) = args.bind {
        loader = loader.set_override("server.bind", bind)?;
    }
    let config = loader.build().context("failed to load configuration")?;

    let app = server::router(&config.paths.target_root);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    info!(bind = %config.server.bind, data = %config.paths.target_root.display(), "dev server running");
    println!("🚀 Dev server running on http://{}", config.server.bind);
    println!("📖 Data available at http://{}/data/index.json", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
