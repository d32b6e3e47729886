use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use automator_server::{router, AppState, DEFAULT_MAX_JOBS};
use project_automator::Config;

#[derive(Parser)]
#[command(name = "automator-server")]
#[command(version)]
#[command(about = "Serve the project-automator web client and stream organize runs over SSE")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:3000", help = "Address to listen on")]
    bind: SocketAddr,
    #[arg(long, default_value = "public", help = "Directory served for non-API paths")]
    static_dir: PathBuf,
    #[arg(short, long, help = "Output directory [default: public/assets]")]
    output: Option<PathBuf>,
    #[arg(long, env = "AUTOMATOR_CONFIG", help = "JSON config file")]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_MAX_JOBS, help = "Organize jobs allowed to run at once")]
    max_jobs: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("automator_server=info,project_automator=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load_or_default(args.config.as_deref()).context("failed to load config")?;
    let config = match args.output {
        Some(output) => config.with_output_dir(output),
        None => config,
    };

    let app = router(AppState::new(config, args.max_jobs), &args.static_dir);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("Server running at http://{}", args.bind);

    axum::serve(listener, app).await.context("server error")
}
