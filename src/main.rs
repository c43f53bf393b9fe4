use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caps_core::config::{data_dir_from_env_value, load_facility, store_kind_from_env_value};
use caps_core::constants::{DATA_DIR_ENV, FACILITY_FILE_ENV, STORE_ENV};
use caps_core::{CoreConfig, Registry};

mod rest;

/// Environment variable naming the REST listen address.
const REST_ADDR_ENV: &str = "CAPS_REST_ADDR";

/// Main entry point for the CAPS registry server
///
/// Resolves configuration once, opens the record store and serves the REST API (with
/// OpenAPI/Swagger UI) until the process is stopped.
///
/// # Environment Variables
/// - `CAPS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CAPS_DATA_DIR`: Directory for registry data (default: "caps_data")
/// - `CAPS_FACILITY_FILE`: Optional facility identity YAML (default: built-in identity)
/// - `CAPS_STORE`: `file` or `memory` (default: "file")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the facility file cannot be read or parsed,
/// - the data directory cannot be created, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("caps_run=info".parse()?)
                .add_directive("caps_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = data_dir_from_env_value(std::env::var(DATA_DIR_ENV).ok());
    let facility_file = std::env::var(FACILITY_FILE_ENV).ok().map(PathBuf::from);
    let facility = load_facility(facility_file.as_deref())?;
    let store_kind = store_kind_from_env_value(std::env::var(STORE_ENV).ok())?;

    let cfg = Arc::new(CoreConfig::new(data_dir, facility, store_kind)?);
    let registry = Arc::new(Registry::open(&cfg)?);

    tracing::info!(
        "++ Serving {} (CNES {}) from {:?} store at {}",
        cfg.facility().name,
        cfg.facility().cnes,
        cfg.store_kind(),
        cfg.data_dir().display()
    );
    tracing::info!("++ Starting CAPS REST on {}", rest_addr);

    let app = rest::router(rest::AppState::new(cfg, registry));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
