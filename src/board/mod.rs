use crate::clock::Clock;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

pub mod classify;
pub mod normalize;
pub mod reservation;
pub mod view;

pub use classify::{Classification, classify};
pub use normalize::{any_visible, normalize};
pub use reservation::{RemarkKind, Reservation, TemporalStatus};
pub use view::{Screen, ViewModel, assemble};

/// Classify and assemble in one pass for a single instant.
pub fn evaluate(records: &[Reservation], screen: Screen, now: OffsetDateTime) -> ViewModel {
    assemble(&classify(records, now), screen, now)
}

/// Re-evaluate the board against a fresh `now` and publish it. Runs under a
/// single write lock so records and screen are read as one snapshot.
pub fn publish_board(
    state: &Arc<RwLock<AppState>>,
    clock: &dyn Clock,
) -> Result<ViewModel, AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let board = evaluate(guard.records(), guard.active_screen(), clock.now());
    guard.set_board(board.clone());
    Ok(board)
}
