use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use interviewer_core::InterviewService;

use crate::api;

pub async fn handle_serve(service: Arc<InterviewService>, port: u16) -> Result<()> {
    let router = api::create_router(service);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("Interview API on http://localhost:{}/api", port).bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();
    info!(port, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
