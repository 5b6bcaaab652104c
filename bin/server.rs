// YC Roster - Directory API server

use anyhow::{Context, Result};
use tracing::info;
use yc_roster::api::{router, AppState};
use yc_roster::logging::{self, LogTarget};
use yc_roster::{open_database, Config};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    println!("🌐 YC Roster - Directory API");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env()?;
    let target = match &config.log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Stderr,
    };
    logging::init(&config.log_level, target)?;

    if !config.db_path.exists() {
        eprintln!("❌ Database not found at {}", config.db_path.display());
        eprintln!("   Run: yc-roster import --companies <csv> --founders <csv>");
        eprintln!("   to import the directory first.");
        std::process::exit(1);
    }

    let conn = open_database(&config.db_path)?;
    println!("✓ Database opened: {}", config.db_path.display());

    let app = router(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "API server listening");
    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/companies", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
