use tracing_subscriber::EnvFilter;

pub const SERVICE_NAME: &str = "upload-gateway";

const DEFAULT_DIRECTIVES: &str = "upload_gateway=info,cluster_secrets=info,tower_http=info";

/// Installs the global fmt subscriber. `RUST_LOG` overrides the defaults.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}
