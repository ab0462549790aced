//! End-to-end scenarios driving the public API (`filter::prepare` ->
//! `raptor::raptor` -> `result::shape` / `travel_times::travel_times`)
//! against a small hand-built network, plus the directory CSV loader.

use std::io::Write;

use chrono::NaiveDate;
use raptor_transit::filter::prepare;
use raptor_transit::raptor::{raptor, Keep, RaptorQuery};
use raptor_transit::result::shape;
use raptor_transit::time::{Duration, Time};
use raptor_transit::timetable::csv_loader::{self, Config};
use raptor_transit::timetable::TimetableStore;
use raptor_transit::travel_times::{travel_times, TravelTimesShape};
use raptor_transit::Error;

const DATE: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();

/// Two competing trips between a shared origin and destination, plus a
/// branch reachable only after one transfer.
fn network() -> TimetableStore {
    TimetableStore::builder()
        .stop("a", "A")
        .stop("b", "B")
        .stop("c", "C")
        .stop("d", "D")
        .trip("fast")
        .trip("slow")
        .trip("branch")
        .stop_time("fast", "a", 1, "08:00:00", "08:00:00")
        .stop_time("fast", "b", 2, "08:15:00", "08:15:00")
        .stop_time("slow", "a", 1, "08:05:00", "08:05:00")
        .stop_time("slow", "b", 2, "08:40:00", "08:40:00")
        .stop_time("branch", "c", 1, "08:25:00", "08:25:00")
        .stop_time("branch", "d", 2, "08:35:00", "08:35:00")
        .transfer("b", "c", 120)
        .service_date(DATE(), "slow")
        .service_date(DATE(), "fast")
        .service_date(DATE(), "branch")
        .build()
        .unwrap()
}

#[test]
fn earliest_arrival_prefers_the_faster_trip_and_reaches_the_branch() {
    let store = network();
    let filtered = prepare(&store, DATE(), Time::MIN, Time::from_seconds(100_000)).unwrap();
    let query = RaptorQuery::new(["a"], Duration::from_seconds(3600), Keep::Earliest);
    let labels = raptor(&filtered, &query).unwrap();
    let result = shape(&store, &labels, Keep::Earliest);

    let b = result.rows.iter().find(|r| &*r.stop_id == "b").unwrap();
    assert_eq!(b.travel_time.as_seconds(), 15 * 60);
    assert_eq!(b.transfers, 0);

    let d = result.rows.iter().find(|r| &*r.stop_id == "d").unwrap();
    assert_eq!(d.transfers, 1);
    // a -> fast -> b (08:15) -> transfer 120s -> c (08:17) -> branch -> d (08:35)
    assert_eq!(d.journey_arrival_time.as_seconds(), 8 * 3600 + 35 * 60);
}

#[test]
fn round_cap_stops_the_search_before_the_branch_is_reached() {
    let store = network();
    let filtered = prepare(&store, DATE(), Time::MIN, Time::from_seconds(100_000)).unwrap();
    // One round is enough to board "fast" and relax the footpath onto "c",
    // but not enough to board "branch" onto "d" — that needs a second round.
    let query = RaptorQuery::new(["a"], Duration::from_seconds(3600), Keep::Earliest).max_transfers(1);
    let labels = raptor(&filtered, &query).unwrap();
    let result = shape(&store, &labels, Keep::Earliest);

    assert!(result.rows.iter().any(|r| &*r.stop_id == "b"));
    assert!(result.rows.iter().any(|r| &*r.stop_id == "c"));
    assert!(!result.rows.iter().any(|r| &*r.stop_id == "d"));
}

#[test]
fn travel_times_aggregates_by_name_and_returns_a_frame_on_request() {
    let store = network();
    let filtered = prepare(&store, DATE(), Time::MIN, Time::from_seconds(100_000)).unwrap();
    let plain = travel_times(&filtered, "A", None, None, false).unwrap();
    let TravelTimesShape::Plain(rows) = plain else { panic!("expected plain rows") };
    assert!(rows.iter().any(|r| &*r.stop_name == "B"));

    let framed = travel_times(&filtered, "A", None, None, true).unwrap();
    let TravelTimesShape::Frame(frame) = framed else { panic!("expected a frame") };
    assert_eq!(frame.stop_name.len(), rows.len());
}

#[test]
fn travel_times_rejects_an_unknown_origin_name() {
    let store = network();
    let filtered = prepare(&store, DATE(), Time::MIN, Time::from_seconds(100_000)).unwrap();
    let err = travel_times(&filtered, "Nowhere", None, None, false).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn filter_rejects_a_date_outside_the_loaded_calendar() {
    let store = network();
    let err = prepare(&store, NaiveDate::from_ymd_opt(2018, 10, 2).unwrap(), Time::MIN, Time::MAX).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn loads_a_gtfs_style_directory_and_runs_a_search() {
    let dir = tempdir();

    write_file(
        &dir,
        "stops.txt",
        "stop_id,stop_name\n\
         a,A\n\
         b,B\n",
    );
    write_file(
        &dir,
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         t1,08:00:00,08:00:00,a,1\n\
         t1,08:10:00,08:10:00,b,2\n",
    );
    write_file(&dir, "transfers.txt", "from_stop_id,to_stop_id,transfer_type,min_transfer_time\n");
    write_file(
        &dir,
        "calendar_dates.txt",
        "service_id,date,exception_type\n\
         t1,20181001,1\n",
    );

    let store = csv_loader::load_dir(dir.path(), &Config::default()).unwrap();
    let filtered = prepare(&store, DATE(), Time::MIN, Time::from_seconds(100_000)).unwrap();
    let query = RaptorQuery::new(["a"], Duration::from_seconds(3600), Keep::Earliest);
    let labels = raptor(&filtered, &query).unwrap();
    let result = shape(&store, &labels, Keep::Earliest);

    let b = result.rows.iter().find(|r| &*r.stop_id == "b").unwrap();
    assert_eq!(b.travel_time.as_seconds(), 600);
}

struct TempDir(std::path::PathBuf);

impl TempDir {
    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn tempdir() -> TempDir {
    let mut dir = std::env::temp_dir();
    dir.push(format!("raptor-transit-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    TempDir(dir)
}

fn write_file(dir: &TempDir, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}
