use crate::board::{Screen, publish_board};
use crate::clock::Clock;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Flip the active screen and republish the board.
pub fn rotate_screen(state: &Arc<RwLock<AppState>>, clock: &dyn Clock) -> Result<Screen, AppError> {
    let screen = {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        guard.rotate_screen()
    };
    publish_board(state, clock)?;
    Ok(screen)
}

/// Toggle the screen every `period`, first toggle one period after start.
/// Never touches the record set.
pub fn spawn_rotation_task(
    state: Arc<RwLock<AppState>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_ms = period.as_millis(), "Starting rotation task");
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            match rotate_screen(&state, clock.as_ref()) {
                Ok(screen) => debug!(screen = ?screen, "Rotated board"),
                Err(err) => warn!(error = %err, "Failed to rotate board"),
            }
        }
        debug!("Rotation task stopped");
    })
}

/// Re-evaluate the board every `period` so records move between buckets as
/// time passes, even when nothing else changes.
pub fn spawn_redraw_task(
    state: Arc<RwLock<AppState>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if let Err(err) = publish_board(&state, clock.as_ref()) {
                warn!(error = %err, "Failed to redraw board");
            }
        }
        debug!("Redraw task stopped");
    })
}
