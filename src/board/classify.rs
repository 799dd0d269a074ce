use crate::board::reservation::{Reservation, TemporalStatus};
use time::OffsetDateTime;

/// Buckets derived from one evaluation instant. Rebuilt from scratch on
/// every call; nothing is carried between evaluations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Start strictly after now and not already charging/idling.
    pub upcoming: Vec<Reservation>,
    /// Window contains now, inclusive at both ends.
    pub ongoing_all: Vec<Reservation>,
    /// Ongoing with a charging or idling remark.
    pub ongoing_allowed: Vec<Reservation>,
    /// Ongoing and idling.
    pub action_required: Vec<Reservation>,
}

/// Partition `records` at `now`. Each bucket is ordered by start time, ties
/// keep input order.
pub fn classify(records: &[Reservation], now: OffsetDateTime) -> Classification {
    let mut ordered: Vec<&Reservation> = records.iter().collect();
    // Stable sort; undated records go last.
    ordered.sort_by_key(|record| (record.start_time.is_none(), record.start_time));

    let mut classification = Classification::default();
    for record in ordered {
        let remark = record.remark_kind();
        match record.status_at(now) {
            TemporalStatus::Upcoming if !remark.is_allowed() => {
                classification.upcoming.push(record.clone());
            }
            TemporalStatus::Ongoing => {
                classification.ongoing_all.push(record.clone());
                if remark.is_allowed() {
                    classification.ongoing_allowed.push(record.clone());
                }
                if remark.is_alert() {
                    classification.action_required.push(record.clone());
                }
            }
            TemporalStatus::Upcoming | TemporalStatus::Expired => {}
        }
    }
    classification
}
