//! Route-pattern construction: groups trips that visit the same ordered
//! stop-id sequence, exactly the equivalence class `spec.md` §3/§4.4/§9
//! calls a route-pattern. Materialized fresh from the *filtered* stop_times
//! at the start of each RAPTOR invocation (eligible trips depend on the
//! date/window), grounded on
//! `blaise::repository::source::gtfs::generate_raptor_routes`'s
//! stop-sequence-fingerprint grouping.
//!
//! Unlike the teacher's linear `find_earliest_trip` scan, the earliest
//! boardable trip at a stop is found by binary search (`partition_point`)
//! against the per-pattern trip list sorted by departure time, per
//! `spec.md` §4.4's explicit requirement.

use std::collections::HashMap;

use crate::filter::FilteredTimetable;
use crate::time::Time;
use crate::timetable::StopTime;

/// One equivalence class of trips sharing an ordered stop-id sequence.
pub(crate) struct Pattern {
    pub stop_ids: Box<[u32]>,
    /// Trip stop-time rows, one row per trip (outer) per position (inner),
    /// sorted by departure time at `stop_ids[0]`. The FIFO assumption
    /// (trips on a pattern never overtake one another) makes this ordering
    /// valid at every subsequent position too.
    grid: Box<[Box<[StopTime]>]>,
}

impl Pattern {
    /// The row index of the earliest trip still boardable at `pos` given a
    /// rider ready no earlier than `ready`, or `None` if every trip on this
    /// pattern has already departed.
    pub(crate) fn earliest_boardable(&self, pos: usize, ready: Time) -> Option<usize> {
        let idx = self.grid.partition_point(|row| row[pos].departure_time < ready);
        (idx < self.grid.len()).then_some(idx)
    }

    pub(crate) fn stop_time(&self, trip_row: usize, pos: usize) -> StopTime {
        self.grid[trip_row][pos]
    }

    pub(crate) fn len(&self) -> usize {
        self.stop_ids.len()
    }
}

/// Builds every route-pattern touched by `timetable`'s filtered stop_times,
/// plus a `stop_idx -> [(pattern_idx, position)]` index used to find which
/// patterns serve a marked stop in O(1) amortized per stop.
pub(crate) fn build(timetable: &FilteredTimetable) -> (Box<[Pattern]>, Box<[Box<[(u32, u32)]>]>) {
    let mut by_trip: HashMap<u32, Vec<StopTime>> = HashMap::new();
    for st in timetable.stop_times.iter() {
        by_trip.entry(st.trip_idx).or_default().push(*st);
    }
    for rows in by_trip.values_mut() {
        rows.sort_unstable_by_key(|st| st.sequence);
    }

    let mut groups: HashMap<Vec<u32>, Vec<u32>> = HashMap::new();
    for (&trip_idx, rows) in by_trip.iter() {
        let fingerprint: Vec<u32> = rows.iter().map(|st| st.stop_idx).collect();
        groups.entry(fingerprint).or_default().push(trip_idx);
    }

    let patterns: Vec<Pattern> = groups
        .into_iter()
        .map(|(stop_ids, mut trip_idxs)| {
            trip_idxs.sort_unstable_by_key(|trip_idx| by_trip[trip_idx][0].departure_time);
            let grid = trip_idxs
                .iter()
                .map(|trip_idx| by_trip[trip_idx].clone().into_boxed_slice())
                .collect();
            Pattern { stop_ids: stop_ids.into_boxed_slice(), grid }
        })
        .collect();

    let mut stop_to_patterns: Vec<Vec<(u32, u32)>> = vec![Vec::new(); timetable.store.stop_count()];
    for (p_idx, pattern) in patterns.iter().enumerate() {
        for (pos, &stop_idx) in pattern.stop_ids.iter().enumerate() {
            stop_to_patterns[stop_idx as usize].push((p_idx as u32, pos as u32));
        }
    }

    (
        patterns.into_boxed_slice(),
        stop_to_patterns.into_iter().map(Vec::into_boxed_slice).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::prepare;
    use crate::timetable::TimetableStore;
    use chrono::NaiveDate;

    #[test]
    fn groups_trips_by_stop_sequence_and_sorts_by_departure() {
        let store = TimetableStore::builder()
            .stop("a", "A")
            .stop("b", "B")
            .trip("late")
            .trip("early")
            .stop_time("late", "a", 1, "08:00:00", "08:00:00")
            .stop_time("late", "b", 2, "08:10:00", "08:10:00")
            .stop_time("early", "a", 1, "07:00:00", "07:00:00")
            .stop_time("early", "b", 2, "07:10:00", "07:10:00")
            .service_date(NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(), "late")
            .service_date(NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(), "early")
            .build()
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let filtered = prepare(&store, date, Time::MIN, Time::from_seconds(100_000)).unwrap();

        let (patterns, stop_to_patterns) = build(&filtered);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].len(), 2);
        assert_eq!(patterns[0].stop_time(0, 0).departure_time.as_seconds(), 25200);
        assert_eq!(patterns[0].stop_time(1, 0).departure_time.as_seconds(), 28800);

        let a_idx = store.stop_index("a").unwrap();
        assert_eq!(stop_to_patterns[a_idx as usize].len(), 1);

        let boarded = patterns[0].earliest_boardable(0, Time::from_seconds(26000)).unwrap();
        assert_eq!(boarded, 1);
    }
}
