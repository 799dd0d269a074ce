use charge_board::clock::{Clock, SystemClock};
use charge_board::feed::{FeedSource, ReservationSource};
use charge_board::state::AppState;
use charge_board::{api, config, schedule};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

fn init_tracing(level: &str) {
    let level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// Current-thread runtime: every timer and evaluation runs on one thread,
// and local offset detection below stays sound.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path();
    let config = config::load_default()?;
    init_tracing(config.logging_level());
    tracing::info!(
        config_path = %config_path.display(),
        app = %config.app.name,
        "charge-board starting"
    );

    let clock: Arc<dyn Clock> = match config.utc_offset()? {
        Some(offset) => Arc::new(SystemClock::with_offset(offset)),
        None => Arc::new(SystemClock::local()),
    };
    tracing::info!(offset = %clock.offset(), "Board clock ready");

    let state = Arc::new(RwLock::new(AppState::new(config.initial_screen())));
    let source = FeedSource::from_setting(config.source_url().as_deref(), config.fixture_dir());
    if let FeedSource::Invalid(reason) = &source {
        tracing::warn!(reason = %reason, "Reservation source rejected, board will stay empty");
    } else {
        tracing::info!(source = %source.describe(), "Reservation source configured");
    }

    let timing = config.timing();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tasks = vec![
        schedule::spawn_redraw_task(
            Arc::clone(&state),
            Arc::clone(&clock),
            timing.clock_tick,
            shutdown_rx.clone(),
        ),
        schedule::spawn_refresh_task(
            source,
            Arc::clone(&state),
            Arc::clone(&clock),
            timing.refresh_interval,
            timing.fetch_timeout,
            shutdown_rx.clone(),
        ),
        schedule::spawn_rotation_task(
            Arc::clone(&state),
            Arc::clone(&clock),
            timing.rotation_interval,
            shutdown_rx,
        ),
    ];

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop timers; an in-flight retrieval is dropped unapplied.
    let _ = shutdown_tx.send(true);
    for task in tasks {
        if let Err(err) = task.await {
            tracing::warn!(error = %err, "Scheduler task ended abnormally");
        }
    }
    tracing::info!("charge-board stopped");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl+C"),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl+C");
    }
}
