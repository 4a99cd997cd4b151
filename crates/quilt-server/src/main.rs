use std::path::PathBuf;

use clap::Parser;

use quilt_server::{QuiltServer, ServerConfig, ServerResult};

#[derive(Parser)]
#[command(name = "quilt-server", about = "Host Quilt stores over HTTP", version)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    QuiltServer::new(config).serve().await
}
