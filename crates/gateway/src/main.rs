use anyhow::Context;
use clap::Parser;

use upload_gateway::telemetry::{self, SERVICE_NAME};
use upload_gateway::{GatewayConfig, GatewayServer, ServerState};

#[derive(Debug, Parser)]
#[command(name = "upload-gateway")]
struct Cli {
    /// Port to serve the HTTP server on (overrides PORT, default 8080)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    telemetry::init();
    if let Err(err) = run().await {
        let chained = err.chain().map(|e| e.to_string()).collect::<Vec<_>>();
        tracing::error!(error.cause_chain = ?chained, "{SERVICE_NAME} failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        port = config.port,
        secrets_backend = %config.secrets_backend,
        namespace = ?config.pod_namespace,
        max_upload_bytes = config.max_upload_bytes,
        "loaded gateway configuration"
    );
    tracing::debug!(registry = ?config.registry, swagger_dir = %config.swagger_dir.display());

    let state = ServerState::from_config(config).await?;
    GatewayServer::new(state).serve().await
}
