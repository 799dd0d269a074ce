//! Time-shifting of stale feeds onto the current day.
//!
//! The decision is made for the feed as a whole: if any record is still
//! ongoing or upcoming, nothing moves. Only a feed that lies entirely in the
//! past (typically a demo fixture) is re-anchored onto today, each record
//! keeping its own time of day and duration.

use crate::board::reservation::{Reservation, TemporalStatus};
use time::OffsetDateTime;
use tracing::debug;

/// True if at least one record is ongoing or strictly upcoming at `now`.
pub fn any_visible(records: &[Reservation], now: OffsetDateTime) -> bool {
    records.iter().any(|record| {
        matches!(
            record.status_at(now),
            TemporalStatus::Ongoing | TemporalStatus::Upcoming
        )
    })
}

pub fn normalize(records: &[Reservation], now: OffsetDateTime) -> Vec<Reservation> {
    if any_visible(records, now) {
        return records.to_vec();
    }

    if !records.is_empty() {
        debug!(
            count = records.len(),
            date = %now.date(),
            "Feed has no visible records, shifting onto today"
        );
    }
    records
        .iter()
        .map(|record| shift_onto_day(record, now))
        .collect()
}

/// Move a record's start onto `now`'s calendar date (in `now`'s offset) and
/// rebuild its end from the original duration. Records without a start, or
/// whose shifted window falls outside the representable range, are returned
/// unchanged.
pub fn shift_onto_day(record: &Reservation, now: OffsetDateTime) -> Reservation {
    let Some(start) = record.start_time else {
        return record.clone();
    };
    let Some(local_start) = start.checked_to_offset(now.offset()) else {
        debug!(start = %start, "Start has no local date, leaving record unshifted");
        return record.clone();
    };
    let shifted_start = local_start.replace_date(now.date());
    let end_time = match record.duration() {
        Some(duration) => match shifted_start.checked_add(duration) {
            Some(end) => Some(end),
            None => {
                debug!(
                    start = %start,
                    duration = %duration,
                    "Shifted end out of range, leaving record unshifted"
                );
                return record.clone();
            }
        },
        None => None,
    };

    Reservation {
        start_time: Some(shifted_start),
        end_time,
        ..record.clone()
    }
}
