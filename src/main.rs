use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medconnect_api_stub::{ADDR_ENV, DEFAULT_ADDR, StubState};

/// Main entry point for the MedConnect development backend
///
/// Serves the in-memory API under `/api` so the client and CLI have something to talk to.
///
/// # Environment Variables
/// - `MEDCONNECT_STUB_ADDR`: listen address (default: "127.0.0.1:4000")
/// - `MEDCONNECT_STUB_SEED`: set to `false` to start with no users or cases
///
/// # Errors
/// Returns an error if the logging filter is invalid, the address cannot be bound, or the
/// server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medconnect_api_stub=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.into());
    let seed = std::env::var("MEDCONNECT_STUB_SEED")
        .map(|v| v.trim() != "false")
        .unwrap_or(true);
    let state = if seed {
        StubState::seeded()
    } else {
        StubState::new()
    };

    tracing::info!("-- Starting MedConnect API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    medconnect_api_stub::serve(listener, state).await?;

    Ok(())
}
