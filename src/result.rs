//! The Result Shaper (`spec.md` §4.3): projects the single label matrix a
//! RAPTOR call produces into one of the three `keep` shapes. All three are
//! views over the same computed labels — the search runs once, per
//! `spec.md` §9 ("implement once, project three ways").

use crate::raptor::{transfers_for_round, Keep, Labels};
use crate::time::{Duration, Time};
use crate::timetable::TimetableStore;

/// One row of a RAPTOR result table (`spec.md` §4.3/§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub stop_id: crate::time::Id,
    pub travel_time: Duration,
    pub journey_departure_time: Time,
    pub journey_arrival_time: Time,
    pub min_arrival_time: Time,
    pub transfers: u32,
}

/// A RAPTOR result table. Always carries the full column schema, even when
/// `rows` is empty (`spec.md` §7's "empty results always carry the full
/// column schema").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaptorResult {
    pub rows: Vec<Row>,
}

impl RaptorResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Projects `labels` into the table shape named by `keep`.
pub fn shape(store: &TimetableStore, labels: &Labels, keep: Keep) -> RaptorResult {
    match keep {
        Keep::Earliest => shape_earliest(store, labels),
        Keep::Shortest => shape_shortest(store, labels),
        Keep::All => shape_all(store, labels),
    }
}

fn shape_earliest(store: &TimetableStore, labels: &Labels) -> RaptorResult {
    let rows = reached_stops(labels)
        .map(|(stop_idx, arrival, round)| row(store, labels.t0, stop_idx, arrival, round))
        .collect();
    RaptorResult { rows }
}

fn shape_shortest(store: &TimetableStore, labels: &Labels) -> RaptorResult {
    // Identical content to `earliest` — `travel_time` and `min_arrival_time`
    // are both carried on every row (`spec.md` §4.3); the two `keep` values
    // differ only in which column callers are expected to sort/read by.
    shape_earliest(store, labels)
}

fn shape_all(store: &TimetableStore, labels: &Labels) -> RaptorResult {
    let mut rows = Vec::new();
    for stop_idx in 0..store.stop_count() as u32 {
        let mut previous: Option<Time> = None;
        for (round, snapshot) in labels.snapshots.iter().enumerate() {
            let Some(arrival) = snapshot[stop_idx as usize] else { continue };
            if previous == Some(arrival) {
                continue;
            }
            previous = Some(arrival);
            rows.push(row(store, labels.t0, stop_idx, arrival, round as u32));
        }
    }
    RaptorResult { rows }
}

fn reached_stops(labels: &Labels) -> impl Iterator<Item = (u32, Time, u32)> + '_ {
    labels.final_arrival.iter().enumerate().filter_map(|(i, arrival)| {
        arrival.map(|arrival| (i as u32, arrival, labels.final_round[i].expect("arrival implies a round")))
    })
}

fn row(store: &TimetableStore, t0: Time, stop_idx: u32, arrival: Time, round: u32) -> Row {
    Row {
        stop_id: store.stops[stop_idx as usize].id.clone(),
        travel_time: arrival - t0,
        journey_departure_time: t0,
        journey_arrival_time: arrival,
        min_arrival_time: arrival,
        transfers: transfers_for_round(round),
    }
}
