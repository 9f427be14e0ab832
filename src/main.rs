//! Mr Tech shop server entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Create the uploads directory
//! 3. Connect to Redis
//! 4. Build router with API routes + static file serving
//! 5. Start Axum server
//!
//! Also supports `gen-secret` subcommand for generating an `AUTH_SECRET`.

use mrtech::{
    auth::{generate_signing_key, AppState},
    config::Config,
    routes, storage,
};
use std::error::Error;

fn print_usage() {
    eprintln!("Usage: mrtech [gen-secret]");
    eprintln!();
    eprintln!("With no arguments, starts the server.");
    eprintln!();
    eprintln!("  gen-secret   Print a random signing key for AUTH_SECRET");
    eprintln!();
    eprintln!("Then set in .env:");
    eprintln!("  AUTH_SECRET=<output>");
    eprintln!("  ADMIN_PASSWORD=<your password>");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Check for gen-secret subcommand
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("gen-secret") => {
            println!("{}", generate_signing_key());
            return Ok(());
        }
        Some(_) => {
            print_usage();
            std::process::exit(1);
        }
        None => {}
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env()?;
    tracing::info!("Starting mrtech on {}", config.bind_addr);

    if config.admin_password.is_none() || config.auth_secret.is_none() {
        tracing::warn!("ADMIN_PASSWORD or AUTH_SECRET is not set; admin login is disabled");
    }

    storage::upload::init_uploads(&config.uploads_dir).await?;

    // Connect to Redis and verify the connection before accepting traffic
    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    redis_client.get_multiplexed_async_connection().await?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(redis_client, config);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
