use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::EnvFilter;

use ssv_domain::config::{Config, ConfigSeverity};
use ssv_gateway::{api, bootstrap};

#[derive(Parser)]
#[command(name = "ssvirt", about = "Self-service virtualization control plane")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "ssvirt.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API gateway and reconcilers (default).
    Serve,
    /// Validate the configuration and exit.
    ConfigValidate,
    /// Print the version and exit.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            init_tracing(&config);
            run_server(Arc::new(config)).await
        }
        Some(Command::ConfigValidate) => {
            let issues = config.validate(bootstrap::production_profile());
            for issue in &issues {
                eprintln!("{issue}");
            }
            if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
                std::process::exit(1);
            }
            println!("configuration OK");
            Ok(())
        }
        Some(Command::Version) => {
            println!("ssvirt {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize tracing from the `[log]` config section.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Start the gateway with the given configuration.
async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ssvirt starting");

    let shutdown = CancellationToken::new();
    let state = bootstrap::build_app_state(config.clone(), shutdown.clone()).await?;

    // ── Reconcilers ──────────────────────────────────────────────────
    bootstrap::spawn_reconcilers(&state);

    // ── Concurrency limit (backpressure protection) ──────────────────
    let max_concurrent = std::env::var("SSVIRT_MAX_CONCURRENT_REQUESTS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(256);
    tracing::info!(max_concurrent, "concurrency limit set");

    // ── Router ───────────────────────────────────────────────────────
    let app = api::router(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.api.request_timeout_secs,
        )))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state.clone());

    // ── Bind ─────────────────────────────────────────────────────────
    if !config.api.tls_cert.is_empty() {
        // Certificate loading is delegated to the fronting proxy / mesh.
        tracing::warn!("api.tls_cert set: TLS is expected to terminate in front of this listener");
    }
    let addr = format!("{}:{}", config.api.bind, config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "ssvirt listening");

    // ── Signal handling ──────────────────────────────────────────────
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::info!("shutdown signal received; draining connections");
            shutdown.cancel();
        });
    }

    // ── Serve until drained, with a hard deadline after the signal ───
    let grace = Duration::from_secs(config.api.shutdown_grace_secs);
    let server = {
        let shutdown = shutdown.clone();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await });
        async move { server.await }
    };
    let forced = {
        let shutdown = shutdown.clone();
        async move {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        }
    };
    tokio::select! {
        result = server => result.context("server error")?,
        _ = forced => {
            tracing::error!("drain deadline exceeded; forcing shutdown");
            std::process::exit(1);
        }
    }

    // Reconcilers share the token; give them a moment, then release the pool.
    shutdown.cancel();
    state.store.close().await;
    tracing::info!("ssvirt stopped");
    Ok(())
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            return std::future::pending().await;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
