//! A Round-Based Public Transit Routing (RAPTOR) engine over GTFS-like
//! `stop_times`, `transfers` and `stops` tables.
//!
//! The crate consumes already-materialized timetable tables (via
//! [`timetable::TimetableStore`], built incrementally or loaded from a
//! directory of GTFS text files), restricts them to one service date and
//! time window with [`filter::prepare`], and runs the round-based search in
//! [`raptor::raptor`]. [`result::shape`] projects the resulting label
//! matrix into the `earliest`/`shortest`/`all` tables, and
//! [`travel_times::travel_times`] is a thin name-based convenience on top.
//!
//! GTFS archive parsing, calendar/exception expansion, shape geometry,
//! headway statistics and mapping are out of scope: callers hand the
//! engine an already-resolved [`timetable::TimetableStore`].

pub mod error;
pub mod filter;
pub mod raptor;
pub mod result;
pub mod time;
pub mod timetable;
pub mod travel_times;

pub use error::{Error, Result};
