//! The Name-Based Wrapper (`spec.md` §4.5): resolves an origin stop *name*
//! into every stop_id sharing that name, runs RAPTOR in `shortest` mode,
//! and aggregates the result by destination stop_name (minimum travel_time
//! per name).

use crate::error::{Error, Result};
use crate::filter::FilteredTimetable;
use crate::raptor::{raptor, Keep, RaptorQuery};
use crate::result::shape;
use crate::time::{Duration, Time};

/// One row of a `travel_times` result: a [`crate::result::Row`] with the
/// per-platform `stop_id` replaced by the shared `stop_name` (`spec.md` §6
/// — "add `stop_name`, drop per-platform duplicates").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelTimeRow {
    pub stop_name: std::sync::Arc<str>,
    pub travel_time: Duration,
    pub journey_departure_time: Time,
    pub journey_arrival_time: Time,
    pub min_arrival_time: Time,
    pub transfers: u32,
}

/// The `return_DT` choice from `spec.md` §4.5: a row-oriented ("plain") or
/// column-oriented ("tibble-like") rendering of the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TravelTimesShape {
    Plain(Vec<TravelTimeRow>),
    Frame(TravelTimesFrame),
}

/// Struct-of-vectors rendering of a `travel_times` result, mirroring the
/// tibble/data.frame column-major layout the source `return_DT` flag picks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TravelTimesFrame {
    pub stop_name: Vec<std::sync::Arc<str>>,
    pub travel_time: Vec<Duration>,
    pub journey_departure_time: Vec<Time>,
    pub journey_arrival_time: Vec<Time>,
    pub min_arrival_time: Vec<Time>,
    pub transfers: Vec<u32>,
}

impl FromIterator<TravelTimeRow> for TravelTimesFrame {
    fn from_iter<I: IntoIterator<Item = TravelTimeRow>>(iter: I) -> Self {
        let mut frame = TravelTimesFrame::default();
        for row in iter {
            frame.stop_name.push(row.stop_name);
            frame.travel_time.push(row.travel_time);
            frame.journey_departure_time.push(row.journey_departure_time);
            frame.journey_arrival_time.push(row.journey_arrival_time);
            frame.min_arrival_time.push(row.min_arrival_time);
            frame.transfers.push(row.transfers);
        }
        frame
    }
}

/// `travel_times(filtered, from_stop_name, departure_time_range, max_departure_time, return_DT)`.
///
/// Fails if `from_stop_name` matches no stop. `departure_time_range`
/// defaults to one hour (`spec.md` §4.5); if `max_departure_time` is also
/// given, both are a `NoData`-class warning and `max_departure_time` wins.
/// Aggregates destination rows by `stop_name`, keeping the
/// minimum-`travel_time` row per name; the result has exactly one row per
/// distinct stop_name that was reached.
pub fn travel_times(
    timetable: &FilteredTimetable,
    from_stop_name: &str,
    departure_time_range: Option<Duration>,
    max_departure_time: Option<Time>,
    return_dt: bool,
) -> Result<TravelTimesShape> {
    let store = timetable.store;
    let origin_idxs = store.stop_indices_by_name(from_stop_name);
    if origin_idxs.is_empty() {
        return Err(Error::invalid(format!("no stop named '{from_stop_name}'")));
    }
    let origin_ids: Vec<String> = origin_idxs.iter().map(|&idx| store.stops[idx as usize].id.to_string()).collect();

    let t0 = origin_idxs
        .iter()
        .flat_map(|&idx| timetable.events_at(idx))
        .map(|st| st.departure_time)
        .min();

    if departure_time_range.is_some() && max_departure_time.is_some() {
        tracing::warn!("both departure_time_range and max_departure_time were given; preferring max_departure_time");
    }
    let range = match max_departure_time {
        Some(until) => resolve_until(t0, until)?,
        None => departure_time_range.unwrap_or(Duration::from_seconds(3600)),
    };

    let query = RaptorQuery::new(origin_ids, range, Keep::Shortest);
    let labels = raptor(timetable, &query)?;
    let result = shape(store, &labels, Keep::Shortest);

    let mut best: std::collections::HashMap<std::sync::Arc<str>, TravelTimeRow> = std::collections::HashMap::new();
    for row in result.rows {
        let Some(stop) = store.stop_by_id(&row.stop_id) else { continue };
        let candidate = TravelTimeRow {
            stop_name: stop.name.clone(),
            travel_time: row.travel_time,
            journey_departure_time: row.journey_departure_time,
            journey_arrival_time: row.journey_arrival_time,
            min_arrival_time: row.min_arrival_time,
            transfers: row.transfers,
        };
        best.entry(stop.name.clone())
            .and_modify(|existing| {
                if candidate.travel_time < existing.travel_time {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }
    let mut rows: Vec<TravelTimeRow> = best.into_values().collect();
    rows.sort_by(|a, b| a.stop_name.cmp(&b.stop_name));

    Ok(if return_dt { TravelTimesShape::Frame(rows.into_iter().collect()) } else { TravelTimesShape::Plain(rows) })
}

fn resolve_until(t0: Option<Time>, until: Time) -> Result<Duration> {
    let t0 = t0.ok_or_else(|| Error::invalid("max_departure_time given but origin has no departures to anchor t0"))?;
    if until <= t0 {
        return Err(Error::invalid("max_departure_time must be after the origin's first departure"));
    }
    Ok(until - t0)
}
