use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use weather_table::analyzers::RangeQueryEngine;
use weather_table::models::{row_key, Column};
use weather_table::processors::{Ingestor, StationSource};
use weather_table::readers::{RecordParser, SourceLocator};
use weather_table::store::MemoryStore;

// Hourly readings for one station over `days` days, with every tenth hour
// repeated the way late observations show up in real files
fn create_station_file(dir: &TempDir, days: usize) -> PathBuf {
    let mut text = String::from("Hourly readings\n#,Date,Time,Temp,Dewpt,Hum,Wspd,Gust,Pres\n");
    let mut ordinal = 1;
    for day in 0..days {
        let date = chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
            .map(|d| d + chrono::Duration::days(day as i64))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        for hour in 0..24 {
            let copies = if hour % 10 == 0 { 2 } else { 1 };
            for _ in 0..copies {
                text.push_str(&format!(
                    "{},{},{:02}:53,{},{},80,{},0,30.01\n",
                    ordinal,
                    date,
                    hour,
                    40 + (day + hour) % 30,
                    35 + hour % 10,
                    hour % 15
                ));
                ordinal += 1;
            }
        }
    }

    let path = dir.path().join("station.csv");
    fs::write(&path, text).unwrap();
    path
}

fn benchmark_row_key(c: &mut Criterion) {
    c.bench_function("row_key_encode", |b| {
        b.iter(|| row_key::encode(black_box("SEA"), black_box("2022-10-02"), black_box(7)))
    });

    c.bench_function("row_key_decode", |b| {
        b.iter(|| row_key::decode(black_box("SEA#2022-10-02#07")))
    });
}

fn benchmark_parse_line(c: &mut Criterion) {
    let parser = RecordParser::new("SEA");
    c.bench_function("parse_line", |b| {
        b.iter(|| parser.parse_line(black_box("17,2022-10-02,07:53,48,44,86,5,0,30.02")))
    });
}

fn benchmark_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_station");

    for days in [30, 365].iter() {
        let dir = TempDir::new().unwrap();
        create_station_file(&dir, *days);
        let locator = SourceLocator::new(vec![dir.path().to_path_buf()]);
        let source = StationSource::new("SEA", "station.csv");

        group.bench_with_input(BenchmarkId::new("days", days), days, |b, _| {
            b.iter(|| {
                let store = MemoryStore::new("weather", &["sensor"]);
                Ingestor::new(&store, locator.clone())
                    .ingest_station(black_box(&source), None)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    create_station_file(&dir, 365);
    let store = MemoryStore::new("weather", &["sensor"]);
    Ingestor::new(&store, SourceLocator::new(vec![dir.path().to_path_buf()]))
        .ingest_station(&StationSource::new("SEA", "station.csv"), None)
        .unwrap();
    let engine = RangeQueryEngine::new(&store);

    c.bench_function("point_lookup", |b| {
        b.iter(|| engine.point_lookup("SEA", black_box("2022-06-15"), 12, Column::Temperature))
    });

    c.bench_function("max_over_month", |b| {
        b.iter(|| engine.max_between_dates("SEA", "2022-09-01", "2022-09-30", Column::Windspeed, 0))
    });

    let day = row_key::day_range("SEA", "2022-10-02").unwrap();
    c.bench_function("projection_scan_day", |b| {
        b.iter(|| engine.projection_scan(black_box(&day)))
    });
}

criterion_group!(
    benches,
    benchmark_row_key,
    benchmark_parse_line,
    benchmark_ingest,
    benchmark_queries
);
criterion_main!(benches);
