//! The Filter/Preparer: restricts a [`TimetableStore`] to the stop_times of
//! one service date and one absolute time window, bundling the full
//! `transfers` and `stops` tables alongside so every downstream call is
//! total (per `spec.md` §4.1 / §9 — "do not rely on ambient attributes").
//!
//! Grounded on `blaise::repository::Repository` acting as a cross-referenced
//! bundle of tables; here it is an explicit, short-lived view rather than a
//! mutable owning struct.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::time::Time;
use crate::timetable::{StopTime, TimetableStore};

/// A [`TimetableStore`] restricted to one service date and time window.
///
/// Carries the filtered `stop_times` plus a reference to the full
/// `transfers` and `stops` tables (via `store`), so a [`crate::raptor`] call
/// never needs anything beyond this one struct.
#[derive(Debug)]
pub struct FilteredTimetable<'a> {
    pub store: &'a TimetableStore,
    pub stop_times: Box<[StopTime]>,
    pub window: (Time, Time),
}

impl<'a> FilteredTimetable<'a> {
    /// Filtered stop_time rows at `stop_idx`, in no particular order.
    pub(crate) fn events_at(&self, stop_idx: u32) -> impl Iterator<Item = &StopTime> {
        self.stop_times.iter().filter(move |st| st.stop_idx == stop_idx)
    }
}

/// Restricts `store` to trips active on `date` whose stop events fall in
/// `[t_min, t_max)`.
///
/// Fails if the date has no active service, if `t_max <= t_min`, or if the
/// intersection is empty (`spec.md` §4.1).
pub fn prepare<'a>(
    store: &'a TimetableStore,
    date: NaiveDate,
    t_min: Time,
    t_max: Time,
) -> Result<FilteredTimetable<'a>> {
    if t_max <= t_min {
        return Err(Error::invalid("t_max must be strictly greater than t_min"));
    }
    let active = store
        .active_trips_on(date)
        .ok_or_else(|| Error::invalid(format!("no active service on {date}")))?;

    let stop_times: Vec<StopTime> = store
        .stop_times
        .iter()
        .filter(|st| st.departure_time >= t_min && st.departure_time < t_max)
        .filter(|st| active.contains(&store.trips[st.trip_idx as usize].id))
        .copied()
        .collect();

    if stop_times.is_empty() {
        return Err(Error::invalid(format!(
            "no stop_times on {date} intersect the window [{}, {})",
            t_min.to_hms_string(),
            t_max.to_hms_string()
        )));
    }

    Ok(FilteredTimetable { store, stop_times: stop_times.into_boxed_slice(), window: (t_min, t_max) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TimetableStore;

    fn store() -> TimetableStore {
        TimetableStore::builder()
            .stop("s1", "Stop One")
            .stop("s2", "Stop Two")
            .trip("t1")
            .stop_time("t1", "s1", 1, "07:00:00", "07:00:00")
            .stop_time("t1", "s2", 2, "07:10:00", "07:10:00")
            .service_date(NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(), "t1")
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let err = prepare(&store, date, Time::from_seconds(100), Time::from_seconds(100)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_date_without_service() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2018, 10, 2).unwrap();
        let err = prepare(&store, date, Time::MIN, Time::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_empty_intersection() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let err = prepare(&store, date, Time::from_seconds(0), Time::from_seconds(100)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn keeps_rows_in_window_on_active_date() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let filtered = prepare(&store, date, Time::from_seconds(0), Time::from_seconds(100_000)).unwrap();
        assert_eq!(filtered.stop_times.len(), 2);
    }
}
