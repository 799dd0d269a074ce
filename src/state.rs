use crate::board::{Reservation, Screen, ViewModel};
use time::OffsetDateTime;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Ok { record_count: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub finished_at: OffsetDateTime,
    pub outcome: RefreshOutcome,
}

/// Engine state. `records` is written only by the refresh task and
/// `active_screen` only by the rotation task; everything else reads.
#[derive(Debug)]
pub struct AppState {
    records: Vec<Reservation>,
    active_screen: Screen,
    last_refresh: Option<RefreshReport>,
    board: Option<ViewModel>,
    board_tx: watch::Sender<Option<ViewModel>>,
}

impl AppState {
    pub fn new(initial_screen: Screen) -> Self {
        let (board_tx, _board_rx) = watch::channel(None);
        Self {
            records: Vec::new(),
            active_screen: initial_screen,
            last_refresh: None,
            board: None,
            board_tx,
        }
    }

    pub fn records(&self) -> &[Reservation] {
        &self.records
    }

    /// Replace the record set wholesale.
    pub fn set_records(&mut self, records: Vec<Reservation>) {
        self.records = records;
    }

    pub fn active_screen(&self) -> Screen {
        self.active_screen
    }

    pub fn rotate_screen(&mut self) -> Screen {
        self.active_screen = self.active_screen.toggled();
        self.active_screen
    }

    pub fn last_refresh(&self) -> Option<&RefreshReport> {
        self.last_refresh.as_ref()
    }

    pub fn set_last_refresh(&mut self, report: RefreshReport) {
        self.last_refresh = Some(report);
    }

    pub fn board(&self) -> Option<&ViewModel> {
        self.board.as_ref()
    }

    pub fn subscribe_board(&self) -> watch::Receiver<Option<ViewModel>> {
        self.board_tx.subscribe()
    }

    pub fn set_board(&mut self, board: ViewModel) {
        self.board = Some(board.clone());
        // No subscribers is fine; the snapshot above is still served.
        self.board_tx.send_replace(Some(board));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Screen::default())
    }
}
