//! The Timetable Store: an immutable, index-first in-memory representation
//! of `stop_times` grouped by trip, `transfers` as a from-stop adjacency
//! list, and a pre-resolved per-date active-service set.
//!
//! Grounded on `Repository` in the teacher repository: stops/trips are
//! `Box<[T]>` slices addressed by `u32` index, with a `HashMap<Arc<str>, u32>`
//! id lookup layered on top so the RAPTOR core's hot loop never touches a
//! string key.

mod builder;
pub mod csv_loader;

pub use builder::TimetableBuilder;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::time::{Duration, Id, Time};

/// A physical point where passengers can board or alight. Stop names are
/// not unique: platforms of the same station commonly share a name.
#[derive(Debug, Clone)]
pub struct Stop {
    pub index: u32,
    pub id: Id,
    pub name: Arc<str>,
}

/// One scheduled vehicle journey. Stop-time rows sharing a `trip_idx`
/// belong to this trip, ordered by `sequence`.
#[derive(Debug, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Id,
}

/// One (trip, stop visit) event.
#[derive(Debug, Clone, Copy)]
pub struct StopTime {
    pub trip_idx: u32,
    pub stop_idx: u32,
    pub sequence: u32,
    pub arrival_time: Time,
    pub departure_time: Time,
}

/// A directed walking edge between two stops. Self-transfers (platform to
/// itself) are permitted with `min_transfer_time` zero or more.
#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub from_stop_idx: u32,
    pub to_stop_idx: u32,
    pub min_transfer_time: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Slice {
    pub start: u32,
    pub count: u32,
}

/// A read-only, pre-indexed timetable. Built once via [`TimetableBuilder`]
/// and shared across any number of [`crate::filter::prepare`] /
/// [`crate::raptor::Raptor`] calls.
#[derive(Debug, Clone, Default)]
pub struct TimetableStore {
    pub stops: Box<[Stop]>,
    pub trips: Box<[Trip]>,
    pub stop_times: Box<[StopTime]>,
    pub transfers: Box<[Transfer]>,

    stop_lookup: HashMap<Id, u32>,
    trip_lookup: HashMap<Id, u32>,
    /// name -> every stop index sharing that name (platforms of a station).
    stop_name_index: HashMap<Arc<str>, Box<[u32]>>,
    /// trip_idx -> contiguous range within `stop_times`, sorted by sequence.
    trip_to_stop_slice: Box<[Slice]>,
    /// stop_idx -> outgoing transfer indices.
    stop_to_transfers: Box<[Box<[u32]>]>,
    /// trip id -> the dates it is known to run, pre-resolved by the caller
    /// (or the `calendar_dates.txt`-only loader in [`csv_loader`]). This
    /// stands in for the calendar/exception-expansion collaborator that is
    /// out of scope for this engine.
    service_dates: HashMap<NaiveDate, HashSet<Id>>,
}

impl TimetableStore {
    pub fn builder() -> TimetableBuilder {
        TimetableBuilder::default()
    }

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        self.stop_lookup.get(id).map(|idx| &self.stops[*idx as usize])
    }

    pub fn stop_index(&self, id: &str) -> Option<u32> {
        self.stop_lookup.get(id).copied()
    }

    /// All stop indices sharing `name`, for the `travel_times` wrapper's
    /// stop-name-to-stop-id-set expansion.
    pub fn stop_indices_by_name(&self, name: &str) -> &[u32] {
        self.stop_name_index
            .get(name)
            .map(|v| v.as_ref())
            .unwrap_or(&[])
    }

    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        self.trip_lookup.get(id).map(|idx| &self.trips[*idx as usize])
    }

    /// The stop-time rows of a trip, in `stop_sequence` order.
    pub fn stop_times_by_trip_idx(&self, trip_idx: u32) -> &[StopTime] {
        let slice = self.trip_to_stop_slice[trip_idx as usize];
        let start = slice.start as usize;
        &self.stop_times[start..start + slice.count as usize]
    }

    pub fn transfers_by_stop_idx(&self, stop_idx: u32) -> impl Iterator<Item = &Transfer> {
        self.stop_to_transfers[stop_idx as usize]
            .iter()
            .map(|idx| &self.transfers[*idx as usize])
    }

    /// Trip ids active on `date`, or `None` if the date has no service at
    /// all (distinct from "empty set" — both are treated as "no active
    /// service" by the Filter/Preparer, but the distinction is kept so a
    /// caller can tell a genuinely unknown date from a quiet Sunday).
    pub fn active_trips_on(&self, date: NaiveDate) -> Option<&HashSet<Id>> {
        self.service_dates.get(&date)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_resolves_stop_time_order_and_lookups() {
        let store = TimetableStore::builder()
            .stop("s1", "Stop One")
            .stop("s2", "Stop Two")
            .trip("t1")
            .stop_time("t1", "s1", 1, "07:00:00", "07:00:00")
            .stop_time("t1", "s2", 2, "07:10:00", "07:10:00")
            .transfer("s1", "s2", 30)
            .service_date(NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(), "t1")
            .build()
            .unwrap();

        let trip = store.trip_by_id("t1").unwrap();
        let stop_times = store.stop_times_by_trip_idx(trip.index);
        assert_eq!(stop_times.len(), 2);
        assert_eq!(stop_times[0].arrival_time.as_seconds(), 25200);
        assert_eq!(stop_times[1].arrival_time.as_seconds(), 25800);

        let s1 = store.stop_by_id("s1").unwrap();
        let transfers: Vec<_> = store.transfers_by_stop_idx(s1.index).collect();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].min_transfer_time.as_seconds(), 30);

        let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        assert!(store.active_trips_on(date).unwrap().contains("t1"));
    }
}
