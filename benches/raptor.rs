use std::hint::black_box;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};

use raptor_transit::filter::prepare;
use raptor_transit::raptor::{raptor, Keep, RaptorQuery};
use raptor_transit::time::{Duration, Time};
use raptor_transit::timetable::TimetableStore;

/// A grid of `stops` x `trips_per_stop` round-trip patterns, wide enough to
/// exercise several rounds of boarding and footpath relaxation without
/// depending on an external GTFS feed.
fn grid_network(stops: u32, trips_per_pattern: u32) -> TimetableStore {
    let mut builder = TimetableStore::builder();
    for s in 0..stops {
        builder = builder.stop(format!("s{s}"), format!("Stop {s}"));
    }
    for t in 0..trips_per_pattern {
        let trip_id = format!("t{t}");
        builder = builder.trip(trip_id.clone());
        for s in 0..stops {
            let base = 6 * 3600 + t * 300 + s * 120;
            let time = format!("{:02}:{:02}:{:02}", base / 3600, (base % 3600) / 60, base % 60);
            builder = builder.stop_time(trip_id.clone(), format!("s{s}"), s + 1, &time, &time);
        }
        builder = builder.service_date(NaiveDate::from_ymd_opt(2018, 10, 1).unwrap(), trip_id);
    }
    for s in 1..stops {
        builder = builder.transfer(format!("s{s}"), format!("s{}", s - 1), 60);
    }
    builder.build().expect("benchmark fixture must build")
}

fn search_grid(c: &mut Criterion) {
    let store = grid_network(200, 20);
    let date = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
    let filtered = prepare(&store, date, Time::MIN, Time::from_seconds(24 * 3600)).unwrap();

    let mut group = c.benchmark_group("raptor");
    group.warm_up_time(StdDuration::from_secs(3));
    group.measurement_time(StdDuration::from_secs(10));

    group.bench_function("earliest arrival, single origin", |b| {
        b.iter(|| {
            let query = RaptorQuery::new(["s0"], Duration::from_seconds(3600), Keep::Earliest);
            black_box(raptor(&filtered, &query).unwrap())
        })
    });

    group.bench_function("all Pareto rows, single origin", |b| {
        b.iter(|| {
            let query = RaptorQuery::new(["s0"], Duration::from_seconds(3600), Keep::All);
            black_box(raptor(&filtered, &query).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, search_grid);
criterion_main!(benches);
