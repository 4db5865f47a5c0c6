// Address Book - Web Server
// REST API over the in-memory entity store

use std::sync::Arc;

use address_book::logging::init_tracing;
use address_book::{build_router, seed, AppState, EntityStore, ServerArgs};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.verbose)?;

    info!("Address Book server v{} starting...", address_book::VERSION);

    let store = Arc::new(EntityStore::with_retry_policy(args.retry_policy()));
    info!("Retry policy: {:?}", store.retry_policy());
    let seeded = seed::populate(&store, args.seed);
    info!("Seeded {} entities", seeded);

    if args.simulate_outages {
        info!("Simulating backend outages on create");
    }

    let state = AppState::new(Arc::clone(&store), args.api_config());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    println!("\n🚀 Server running on http://{}", args.bind);
    println!("   API: http://{}/api/entity", args.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
