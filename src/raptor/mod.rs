//! The RAPTOR Core: the round-based dynamic-programming search over
//! (stop, round) labels.
//!
//! A flat, reusable label array plus a marked-stop bitset drives each
//! round, covering all reachable stops from a multi-origin,
//! multi-departure seed rather than a single origin/destination pair.
//! `rayon` parallelizes route-pattern scanning and footpath relaxation
//! *within* a round, collecting updates into a buffer and applying them
//! sequentially afterwards so the round boundary stays a strict barrier.

mod pattern;

use std::collections::HashMap;

use bitvec::prelude::*;
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::filter::FilteredTimetable;
use crate::time::{Duration, Time};

use pattern::Pattern;

/// A fixed round bound sufficient for realistic transit networks,
/// overridable via [`RaptorQuery::max_transfers`].
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// The three result projections a RAPTOR search can be shaped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keep {
    Earliest,
    Shortest,
    All,
}

/// A RAPTOR search request.
#[derive(Debug, Clone)]
pub struct RaptorQuery {
    pub from_stop_ids: Vec<String>,
    pub departure_time_range: Duration,
    pub max_transfers: u32,
    pub keep: Keep,
}

impl RaptorQuery {
    pub fn new<I, S>(from_stop_ids: I, departure_time_range: Duration, keep: Keep) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from_stop_ids: from_stop_ids.into_iter().map(Into::into).collect(),
            departure_time_range,
            max_transfers: DEFAULT_MAX_ROUNDS,
            keep,
        }
    }

    pub fn max_transfers(mut self, max_transfers: u32) -> Self {
        self.max_transfers = max_transfers;
        self
    }
}

/// The full per-stop, per-round label matrix a RAPTOR call produces.
///
/// `snapshots[k]` is the best known arrival at every stop using at most `k`
/// boardings (round 0 is seeding + its footpath relaxation). `final_round`
/// records the round at which each stop's ultimate best arrival was set,
/// which is all the transfer-count bookkeeping needs: because footpath
/// relaxation within round `k` only ever fans out from stops the *same*
/// round's route scan just improved, every stop whose label changes during
/// round `k` was reached with exactly `k` boardings — so
/// `transfers(k, s) = 0` if `k == 0`, else `k - 1` (see `DESIGN.md` for
/// the derivation).
pub struct Labels {
    pub t0: Time,
    pub origin_stop_idxs: Box<[u32]>,
    pub(crate) final_arrival: Box<[Option<Time>]>,
    pub(crate) final_round: Box<[Option<u32>]>,
    pub(crate) snapshots: Vec<Box<[Option<Time>]>>,
}

impl Labels {
    fn empty(stop_count: usize) -> Self {
        Self {
            t0: Time::MIN,
            origin_stop_idxs: Box::new([]),
            final_arrival: vec![None; stop_count].into_boxed_slice(),
            final_round: vec![None; stop_count].into_boxed_slice(),
            snapshots: Vec::new(),
        }
    }
}

/// Runs the RAPTOR search against `timetable`.
///
/// Unknown origin ids and origins with no presence in the filtered window
/// are treated as data-absence rather than caller error: a `tracing::warn!`
/// is emitted and an empty, schema-correct [`Labels`] is returned instead of
/// an `Err`.
pub fn raptor(timetable: &FilteredTimetable, query: &RaptorQuery) -> Result<Labels> {
    if !query.departure_time_range.is_positive() {
        return Err(Error::invalid("departure_time_range must be a positive number of seconds"));
    }

    let store = timetable.store;
    let stop_count = store.stop_count();

    let mut origin_idxs: Vec<u32> = Vec::new();
    for id in &query.from_stop_ids {
        match store.stop_index(id) {
            Some(idx) => origin_idxs.push(idx),
            None => warn!(stop_id = %id, "unknown origin stop id; ignoring"),
        }
    }
    if origin_idxs.is_empty() {
        warn!("no valid origin stop ids; returning empty result");
        return Ok(Labels::empty(stop_count));
    }

    // t0: earliest departure among origin departures in the window. Falls
    // back to the earliest origin *arrival* anywhere in the full timetable
    // (not just the filtered window) when no origin has a departure event in
    // the window — this is what lets a call from a terminal (arrival-only)
    // stop, or one whose departure event fell outside the window while its
    // arrival didn't, still produce its trivial origin row instead of being
    // indistinguishable from a stop with no presence in the network at all
    // (see DESIGN.md).
    let departures: Vec<Time> = origin_idxs
        .iter()
        .flat_map(|&idx| timetable.events_at(idx))
        .map(|st| st.departure_time)
        .collect();
    let t0 = if let Some(&t0) = departures.iter().min() {
        t0
    } else if let Some(t0) = origin_idxs
        .iter()
        .flat_map(|&idx| store.stop_times.iter().filter(move |st| st.stop_idx == idx))
        .map(|st| st.arrival_time)
        .min()
    {
        t0
    } else {
        warn!("no origin stop has any stop_time event; returning empty result");
        return Ok(Labels::empty(stop_count));
    };
    let window_end = t0 + query.departure_time_range;

    let (patterns, stop_to_patterns) = pattern::build(timetable);

    let mut best_arrival: Vec<Option<Time>> = vec![None; stop_count];
    let mut best_round: Vec<Option<u32>> = vec![None; stop_count];
    let mut round_labels: Vec<Option<Time>> = vec![None; stop_count];
    let mut marked: BitVec<usize, Lsb0> = bitvec![usize, Lsb0; 0; stop_count];

    for &origin in &origin_idxs {
        for st in timetable.events_at(origin) {
            if st.departure_time >= t0 && st.departure_time < window_end {
                improve(&mut best_arrival, &mut best_round, &mut round_labels, &mut marked, origin, st.departure_time, 0);
            }
        }
    }
    // A terminal origin contributes no departure event of its own; it is
    // still reachable from itself at travel_time zero.
    for &origin in &origin_idxs {
        if best_arrival[origin as usize].is_none() {
            improve(&mut best_arrival, &mut best_round, &mut round_labels, &mut marked, origin, t0, 0);
        }
    }
    relax_transfers(store, &mut best_arrival, &mut best_round, &mut round_labels, &mut marked, 0);

    let mut snapshots = vec![best_arrival.clone().into_boxed_slice()];

    let mut round = 1u32;
    while round <= query.max_transfers && marked.any() {
        let ready_times = best_arrival.clone();
        round_labels.iter_mut().for_each(|v| *v = None);

        let mut active: HashMap<u32, u32> = HashMap::new();
        for stop_idx in marked.iter_ones() {
            for &(p_idx, pos) in &stop_to_patterns[stop_idx] {
                active
                    .entry(p_idx)
                    .and_modify(|best| {
                        if pos < *best {
                            *best = pos;
                        }
                    })
                    .or_insert(pos);
            }
        }
        marked.fill(false);

        let route_updates: Vec<(u32, Time)> = active
            .par_iter()
            .flat_map_iter(|(&p_idx, &start_pos)| scan_pattern(&patterns[p_idx as usize], start_pos as usize, &ready_times))
            .collect();
        for (stop_idx, arrival) in route_updates {
            improve(&mut best_arrival, &mut best_round, &mut round_labels, &mut marked, stop_idx, arrival, round);
        }

        relax_transfers(store, &mut best_arrival, &mut best_round, &mut round_labels, &mut marked, round);

        snapshots.push(best_arrival.clone().into_boxed_slice());
        trace!(round, marked = marked.count_ones(), "round complete");
        round += 1;
    }
    if round > query.max_transfers && marked.any() {
        warn!(max_transfers = query.max_transfers, "round limit reached with stops still improving");
    }

    Ok(Labels {
        t0,
        origin_stop_idxs: origin_idxs.into_boxed_slice(),
        final_arrival: best_arrival.into_boxed_slice(),
        final_round: best_round.into_boxed_slice(),
        snapshots,
    })
}

/// Traverses one route-pattern from `start_pos` forward, boarding the
/// earliest catchable trip and re-boarding an earlier one whenever a
/// marked stop's ready time allows it (`spec.md` §4.2 step 2).
fn scan_pattern(pattern: &Pattern, start_pos: usize, ready_times: &[Option<Time>]) -> Vec<(u32, Time)> {
    let mut updates = Vec::new();
    let mut boarded: Option<usize> = None;
    for pos in start_pos..pattern.len() {
        let stop_idx = pattern.stop_ids[pos];
        if let Some(trip_row) = boarded {
            let arrival = pattern.stop_time(trip_row, pos).arrival_time;
            updates.push((stop_idx, arrival));
        }
        if let Some(ready) = ready_times[stop_idx as usize]
            && let Some(candidate) = pattern.earliest_boardable(pos, ready)
            && boarded.is_none_or(|current| candidate < current)
        {
            boarded = Some(candidate);
        }
    }
    updates
}

/// Footpath relaxation (`spec.md` §4.2 step 3): one hop from every stop
/// whose label changed this round, applied after — never before — the
/// round's route scan so an exact tie always prefers the route-scan
/// witness (`spec.md` §9's tie-break resolution), since `improve` only
/// overwrites on a strict improvement.
fn relax_transfers(
    store: &crate::timetable::TimetableStore,
    best_arrival: &mut [Option<Time>],
    best_round: &mut [Option<u32>],
    round_labels: &mut [Option<Time>],
    marked: &mut BitVec<usize, Lsb0>,
    round: u32,
) {
    let sources: Vec<(u32, Time)> = round_labels
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|t| (i as u32, t)))
        .collect();

    let updates: Vec<(u32, Time)> = sources
        .par_iter()
        .flat_map_iter(|&(from_idx, departure)| {
            store
                .transfers_by_stop_idx(from_idx)
                .map(move |t| (t.to_stop_idx, departure + t.min_transfer_time))
        })
        .collect();

    for (stop_idx, arrival) in updates {
        improve(best_arrival, best_round, round_labels, marked, stop_idx, arrival, round);
    }
}

fn improve(
    best_arrival: &mut [Option<Time>],
    best_round: &mut [Option<u32>],
    round_labels: &mut [Option<Time>],
    marked: &mut BitVec<usize, Lsb0>,
    stop_idx: u32,
    arrival: Time,
    round: u32,
) -> bool {
    let i = stop_idx as usize;
    let improves = match best_arrival[i] {
        None => true,
        Some(current) => arrival < current,
    };
    if improves {
        best_arrival[i] = Some(arrival);
        best_round[i] = Some(round);
        round_labels[i] = Some(arrival);
        marked.set(i, true);
    }
    improves
}

/// Transfer count for a label last improved at `round`, per the closed
/// form derived in [`Labels`]'s docs.
pub(crate) fn transfers_for_round(round: u32) -> u32 {
    round.saturating_sub(1)
}
