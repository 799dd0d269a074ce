use crate::board::reservation::decode_records;
use crate::board::{normalize, publish_board};
use crate::clock::Clock;
use crate::error::AppError;
use crate::feed::{FetchError, ReservationSource};
use crate::state::{AppState, RefreshOutcome, RefreshReport};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Fetch, decode and normalise the feed, then install the result. Any
/// failure leaves the board with an empty record set rather than the
/// previous one.
pub async fn run_refresh_cycle<S>(
    source: &S,
    state: &Arc<RwLock<AppState>>,
    clock: &dyn Clock,
    timeout: Duration,
) -> Result<RefreshOutcome, AppError>
where
    S: ReservationSource,
{
    let fetched = match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(result) => result,
        Err(_elapsed) => Err(FetchError::Timeout(timeout)),
    };

    let now = clock.now();
    let (records, outcome) = match fetched.and_then(|payload| decode_records(&payload, now.offset()))
    {
        Ok(records) => {
            let records = normalize(&records, now);
            debug!(count = records.len(), "Reservation feed refreshed");
            let record_count = records.len();
            (records, RefreshOutcome::Ok { record_count })
        }
        Err(err) => {
            warn!(
                source = %source.describe(),
                error = %err,
                "Refresh failed, clearing records"
            );
            (
                Vec::new(),
                RefreshOutcome::Failed {
                    reason: err.to_string(),
                },
            )
        }
    };

    {
        let mut guard = state.write().map_err(|_| AppError::StateLock)?;
        guard.set_records(records);
        guard.set_last_refresh(RefreshReport {
            finished_at: now,
            outcome: outcome.clone(),
        });
    }
    publish_board(state, clock)?;

    Ok(outcome)
}

/// Run the refresh cycle immediately and then every `interval`. Cycles run
/// back to back inside one task, so a slow fetch delays the next tick
/// instead of overlapping it.
pub fn spawn_refresh_task<S>(
    source: S,
    state: Arc<RwLock<AppState>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: ReservationSource + 'static,
{
    tokio::spawn(async move {
        info!(
            source = %source.describe(),
            interval_ms = interval.as_millis(),
            "Starting refresh task"
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                result = run_refresh_cycle(&source, &state, clock.as_ref(), timeout) => {
                    match result {
                        Ok(RefreshOutcome::Ok { record_count }) => {
                            info!(records = record_count, "Refresh complete");
                        }
                        Ok(RefreshOutcome::Failed { .. }) => {}
                        Err(err) => warn!(error = %err, "Refresh cycle could not update state"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown during refresh, discarding in-flight retrieval");
                    break;
                }
            }
        }
        debug!("Refresh task stopped");
    })
}
