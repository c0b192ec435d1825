use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wardops_core::{CoreConfig, HospitalStore};

/// Main entry point for the WardOps application
///
/// Opens the hospital store and serves the REST API.
///
/// # Environment Variables
/// - `WARDOPS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `WARDOPS_FIXTURES`: YAML fixture file to seed the store (default: built-in fixtures)
/// - `WARDOPS_FACILITY`: Facility name shown on the dashboard (default: "General Hospital")
///
/// # Errors
/// Returns an error if the configuration or fixtures are invalid, or if the server cannot bind
/// or fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardops=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("WARDOPS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::from_values(
        std::env::var("WARDOPS_FIXTURES").ok(),
        std::env::var("WARDOPS_FACILITY").ok(),
    )?;

    tracing::info!("++ Starting WardOps REST on {} for {}", rest_addr, cfg.facility_name());

    let store = HospitalStore::open(&cfg)?;
    api_rest::serve(&rest_addr, store).await
}
