//! View model handed to the display layer.
//!
//! Plain data only: ordered rows with display strings and flags. Colours,
//! layout and typography belong to whatever renders it.

use crate::board::classify::Classification;
use crate::board::reservation::Reservation;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Upcoming,
    Ongoing,
}

impl Screen {
    pub fn toggled(self) -> Self {
        match self {
            Self::Upcoming => Self::Ongoing,
            Self::Ongoing => Self::Upcoming,
        }
    }

    /// Screen shown after `rotations` toggles starting from `self`.
    #[cfg(test)]
    pub fn after_rotations(self, rotations: u64) -> Self {
        if rotations % 2 == 0 {
            self
        } else {
            self.toggled()
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming reservations",
            Self::Ongoing => "Charging now",
        }
    }

    pub fn columns(self) -> Vec<Column> {
        match self {
            Self::Upcoming => vec![
                Column::Vehicle,
                Column::Start,
                Column::End,
                Column::Lane,
                Column::Remark,
            ],
            Self::Ongoing => vec![Column::Vehicle, Column::Lane, Column::Remark, Column::Soc],
        }
    }

    fn empty_message(self) -> &'static str {
        match self {
            Self::Upcoming => "No upcoming reservations",
            Self::Ongoing => "No vehicles charging right now",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Vehicle,
    Start,
    End,
    Lane,
    Remark,
    Soc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub license_plate: String,
    pub start: String,
    pub end: String,
    pub lane: String,
    pub remark: String,
    pub soc: String,
    pub is_alert: bool,
    pub is_ongoing: bool,
    pub show_time: bool,
    pub show_soc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoardCounts {
    pub upcoming: usize,
    pub ongoing_allowed: usize,
    pub action_required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub screen: Screen,
    pub title: &'static str,
    pub columns: Vec<Column>,
    /// Idling vehicles, shown above the active screen whatever it is.
    pub action_required: Vec<BoardRow>,
    pub rows: Vec<BoardRow>,
    pub counts: BoardCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
    #[serde(skip)]
    pub rendered_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
struct RowKind {
    is_alert: bool,
    is_ongoing: bool,
    show_time: bool,
    show_soc: bool,
}

pub fn assemble(
    classification: &Classification,
    screen: Screen,
    rendered_at: OffsetDateTime,
) -> ViewModel {
    let offset = rendered_at.offset();
    let alert_kind = RowKind {
        is_alert: true,
        is_ongoing: true,
        show_time: false,
        show_soc: true,
    };

    let rows: Vec<BoardRow> = match screen {
        Screen::Upcoming => build_rows(
            &classification.upcoming,
            RowKind {
                is_alert: false,
                is_ongoing: false,
                show_time: true,
                show_soc: false,
            },
            offset,
        ),
        Screen::Ongoing => classification
            .ongoing_allowed
            .iter()
            .map(|record| {
                let kind = RowKind {
                    is_alert: record.remark_kind().is_alert(),
                    ..alert_kind
                };
                build_row(record, kind, offset)
            })
            .collect(),
    };

    let empty_message = rows.is_empty().then(|| screen.empty_message());

    ViewModel {
        screen,
        title: screen.title(),
        columns: screen.columns(),
        action_required: build_rows(&classification.action_required, alert_kind, offset),
        rows,
        counts: BoardCounts {
            upcoming: classification.upcoming.len(),
            ongoing_allowed: classification.ongoing_allowed.len(),
            action_required: classification.action_required.len(),
        },
        empty_message,
        rendered_at,
    }
}

fn build_rows(records: &[Reservation], kind: RowKind, offset: UtcOffset) -> Vec<BoardRow> {
    records
        .iter()
        .map(|record| build_row(record, kind, offset))
        .collect()
}

fn build_row(record: &Reservation, kind: RowKind, offset: UtcOffset) -> BoardRow {
    BoardRow {
        license_plate: display_text(record.license_plate.as_deref()),
        start: display_time(record.start_time, offset),
        end: display_time(record.end_time, offset),
        lane: display_text(record.lane.as_deref()),
        remark: display_text(record.remark.as_deref()),
        soc: record
            .soc
            .map(|soc| format!("{soc}%"))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        is_alert: kind.is_alert,
        is_ongoing: kind.is_ongoing,
        show_time: kind.show_time,
        show_soc: kind.show_soc,
    }
}

fn display_text(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

fn display_time(value: Option<OffsetDateTime>, offset: UtcOffset) -> String {
    let format = format_description!("[hour]:[minute]");
    value
        .and_then(|instant| instant.checked_to_offset(offset))
        .and_then(|instant| instant.format(format).ok())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
