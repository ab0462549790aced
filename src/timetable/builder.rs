//! Incremental construction of a [`TimetableStore`], grounded on
//! `Repository::load_gtfs`'s load-then-index pipeline: rows are pushed in
//! arbitrary order, then indices (`trip_to_stop_slice`, `stop_to_transfers`,
//! `stop_name_index`) are built in one pass at `build()` time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::time::{Duration, Time};

use super::{Slice, Stop, StopTime, TimetableStore, Transfer, Trip};

#[derive(Default)]
pub struct TimetableBuilder {
    stops: Vec<(Arc<str>, Arc<str>)>,
    trips: Vec<Arc<str>>,
    stop_times: Vec<(Arc<str>, Arc<str>, u32, Time, Time)>,
    transfers: Vec<(Arc<str>, Arc<str>, Duration)>,
    service_dates: HashMap<NaiveDate, HashSet<Arc<str>>>,
}

impl TimetableBuilder {
    pub fn stop(mut self, id: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        self.stops.push((id.into(), name.into()));
        self
    }

    pub fn trip(mut self, id: impl Into<Arc<str>>) -> Self {
        self.trips.push(id.into());
        self
    }

    /// `arrival`/`departure` are `"HH:MM:SS"` strings, matching the
    /// `stop_times.txt` convention (overnight hours past 24 allowed).
    pub fn stop_time(
        mut self,
        trip_id: impl Into<Arc<str>>,
        stop_id: impl Into<Arc<str>>,
        sequence: u32,
        arrival: &str,
        departure: &str,
    ) -> Self {
        let arrival = Time::from_hms(arrival).expect("malformed arrival time in fixture");
        let departure = Time::from_hms(departure).expect("malformed departure time in fixture");
        self.stop_times
            .push((trip_id.into(), stop_id.into(), sequence, arrival, departure));
        self
    }

    pub fn transfer(
        mut self,
        from_stop_id: impl Into<Arc<str>>,
        to_stop_id: impl Into<Arc<str>>,
        min_transfer_time_secs: u32,
    ) -> Self {
        self.transfers.push((
            from_stop_id.into(),
            to_stop_id.into(),
            Duration::from_seconds(min_transfer_time_secs),
        ));
        self
    }

    pub fn service_date(mut self, date: NaiveDate, trip_id: impl Into<Arc<str>>) -> Self {
        self.service_dates.entry(date).or_default().insert(trip_id.into());
        self
    }

    pub fn build(self) -> Result<TimetableStore> {
        let mut stop_lookup = HashMap::with_capacity(self.stops.len());
        let stops: Box<[Stop]> = self
            .stops
            .into_iter()
            .enumerate()
            .map(|(i, (id, name))| {
                stop_lookup.insert(id.clone(), i as u32);
                Stop { index: i as u32, id, name }
            })
            .collect();

        let mut trip_lookup = HashMap::with_capacity(self.trips.len());
        let trips: Box<[Trip]> = self
            .trips
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                trip_lookup.insert(id.clone(), i as u32);
                Trip { index: i as u32, id }
            })
            .collect();

        let stop_idx_of = |id: &str| -> Result<u32> {
            stop_lookup
                .get(id)
                .copied()
                .ok_or_else(|| Error::internal(format!("stop_times/transfers reference unknown stop '{id}'")))
        };
        let trip_idx_of = |id: &str| -> Result<u32> {
            trip_lookup
                .get(id)
                .copied()
                .ok_or_else(|| Error::internal(format!("stop_times reference unknown trip '{id}'")))
        };

        let mut by_trip: HashMap<u32, Vec<StopTime>> = HashMap::new();
        for (trip_id, stop_id, sequence, arrival_time, departure_time) in self.stop_times {
            let trip_idx = trip_idx_of(&trip_id)?;
            let stop_idx = stop_idx_of(&stop_id)?;
            by_trip.entry(trip_idx).or_default().push(StopTime {
                trip_idx,
                stop_idx,
                sequence,
                arrival_time,
                departure_time,
            });
        }

        let mut stop_times = Vec::with_capacity(by_trip.values().map(Vec::len).sum());
        let mut trip_to_stop_slice = vec![Slice::default(); trips.len()];
        for trip_idx in 0..trips.len() as u32 {
            let mut rows = by_trip.remove(&trip_idx).unwrap_or_default();
            rows.sort_unstable_by_key(|st| st.sequence);
            for window in rows.windows(2) {
                if window[1].sequence == window[0].sequence {
                    return Err(Error::internal(format!(
                        "trip '{}' has duplicate stop_sequence {}",
                        trips[trip_idx as usize].id, window[0].sequence
                    )));
                }
                if window[1].departure_time < window[0].arrival_time {
                    return Err(Error::internal(format!(
                        "trip '{}' is not monotonically non-decreasing in time at sequence {}",
                        trips[trip_idx as usize].id, window[1].sequence
                    )));
                }
            }
            let start = stop_times.len() as u32;
            let count = rows.len() as u32;
            trip_to_stop_slice[trip_idx as usize] = Slice { start, count };
            stop_times.extend(rows);
        }

        let mut transfers = Vec::with_capacity(self.transfers.len());
        let mut stop_to_transfers: Vec<Vec<u32>> = vec![Vec::new(); stops.len()];
        for (from_id, to_id, min_transfer_time) in self.transfers {
            let from_stop_idx = stop_idx_of(&from_id)?;
            let to_stop_idx = stop_idx_of(&to_id)?;
            let transfer_idx = transfers.len() as u32;
            transfers.push(Transfer { from_stop_idx, to_stop_idx, min_transfer_time });
            stop_to_transfers[from_stop_idx as usize].push(transfer_idx);
        }

        let mut stop_name_index: HashMap<Arc<str>, Vec<u32>> = HashMap::new();
        for stop in stops.iter() {
            stop_name_index.entry(stop.name.clone()).or_default().push(stop.index);
        }

        Ok(TimetableStore {
            stops,
            trips,
            stop_times: stop_times.into_boxed_slice(),
            transfers: transfers.into_boxed_slice(),
            stop_lookup,
            trip_lookup,
            stop_name_index: stop_name_index
                .into_iter()
                .map(|(k, v)| (k, v.into_boxed_slice()))
                .collect(),
            trip_to_stop_slice: trip_to_stop_slice.into_boxed_slice(),
            stop_to_transfers: stop_to_transfers
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
            service_dates: self.service_dates,
        })
    }
}
