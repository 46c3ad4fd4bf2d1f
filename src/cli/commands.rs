use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzers::{PresetOutcome, ProjectionRow, QueryPreset, RangeQueryEngine};
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::models::row_key;
use crate::models::Column;
use crate::processors::{IngestSummary, Ingestor, LoadReport};
use crate::settings::Settings;
use crate::store::MemoryStore;
use crate::utils::progress::ProgressReporter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    let store = open_store(&settings)?;

    match cli.command {
        Commands::Load {
            reset,
            parallel,
            workers,
            batch_size,
        } => {
            if reset {
                store.clear()?;
            }

            let start = Instant::now();
            let ingestor = ingestor(&store, &settings, batch_size);
            let report = if parallel {
                let progress = ProgressReporter::new(
                    settings.stations.len() as u64,
                    "Loading stations...",
                    cli.quiet,
                );
                progress.println(&format!(
                    "Loading {} stations with {} workers",
                    settings.stations.len(),
                    workers
                ));
                let report =
                    ingestor.load_all_parallel(&settings.stations, workers, Some(&progress))?;
                progress.finish_with_message(&format!("Loaded {} rows", report.total_rows()));
                report
            } else {
                let progress = ProgressReporter::new_spinner("Loading stations...", cli.quiet);
                let report = ingestor.load_all(&settings.stations, Some(&progress));
                progress.finish_with_message(&format!("Loaded {} rows", report.total_rows()));
                report
            };

            store.save(&settings.store_path)?;
            print_load_report(&report);
            info!("Load finished in {:.2?}", start.elapsed());
        }

        Commands::Ingest {
            station,
            file,
            batch_size,
        } => {
            let path = settings.locator().locate(&file)?;
            let progress = ProgressReporter::new_spinner(
                &format!("Loading data for {}", station),
                cli.quiet,
            );
            let summary = ingestor(&store, &settings, batch_size).ingest_file(
                &station,
                &path,
                Some(&progress),
            )?;
            progress.finish_with_message(&format!("Loaded {} rows", summary.rows_written));

            store.save(&settings.store_path)?;
            print_summary(&summary);
        }

        Commands::Point {
            station,
            date,
            hour,
            column,
        } => {
            let column: Column = column.parse()?;
            let value = engine(&store, &settings).point_lookup(&station, &date, hour, column);
            println!("{}: {}", capitalize(column.as_str()), value);
        }

        Commands::Max {
            station,
            from,
            to,
            column,
            baseline,
        } => {
            let column: Column = column.parse()?;
            let value =
                engine(&store, &settings).max_between_dates(&station, &from, &to, column, baseline);
            println!("{}: {}", capitalize(column.as_str()), value);
        }

        Commands::MaxMonths {
            stations,
            months,
            column,
            baseline,
        } => {
            let column: Column = column.parse()?;
            let value = engine(&store, &settings).max_across_partitions(
                stations.as_slice(),
                months.as_slice(),
                column,
                baseline,
            );
            println!("{}: {}", capitalize(column.as_str()), value);
        }

        Commands::Scan {
            station,
            from,
            to,
            output,
        } => {
            let range = row_key::range_across_dates(&station, &from, &to)?;
            let rows = engine(&store, &settings).projection_scan(&range);
            match output {
                Some(path) => {
                    write_rows_csv(&path, &rows)?;
                    println!("Wrote {} rows to {}", rows.len(), path.display());
                }
                None => {
                    for row in &rows {
                        println!("{}", format_row(row));
                    }
                }
            }
        }

        Commands::Report => {
            if store.is_empty() {
                warn!(
                    "Table {} is empty; run `weather-table load` first",
                    store.table_id()
                );
            }
            let engine = engine(&store, &settings);
            for preset in QueryPreset::ALL {
                println!("Executing query #{}.", preset.number());
                match preset.run(&engine) {
                    PresetOutcome::Value(value) => println!("{}: {}", preset.label(), value),
                    rows => print!("{}:\n{}", preset.label(), rows),
                }
            }
        }
    }

    Ok(())
}

/// Log to stderr, or to `log_file` when given. `RUST_LOG` overrides the
/// level chosen by `--verbose`/`--quiet`.
pub fn init_logging(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_table={}", log_level)));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_level(true)
                        .with_timer(fmt::time::uptime())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn open_store(settings: &Settings) -> Result<MemoryStore> {
    MemoryStore::open_or_create(
        &settings.store_path,
        &settings.table_id,
        &[settings.column_family.as_str()],
    )
}

fn ingestor<'a>(
    store: &'a MemoryStore,
    settings: &Settings,
    batch_size: Option<usize>,
) -> Ingestor<'a> {
    Ingestor::new(store, settings.locator())
        .with_column_family(settings.column_family.as_str())
        .with_batch_size(batch_size.unwrap_or(settings.batch_size))
}

fn engine<'a>(store: &'a MemoryStore, settings: &Settings) -> RangeQueryEngine<'a> {
    RangeQueryEngine::new(store)
        .with_column_family(settings.column_family.as_str())
        .with_missing_value(settings.missing_value.as_str())
}

fn print_summary(summary: &IngestSummary) {
    println!("{}", summary.summary());
}

fn print_load_report(report: &LoadReport) {
    println!("\n=== Load Summary ===");
    for summary in &report.summaries {
        print_summary(summary);
    }
    for failure in &report.failures {
        println!("{}: FAILED ({})", failure.station, failure.message);
    }
    println!(
        "Total: {} rows from {} of {} stations",
        report.total_rows(),
        report.summaries.len(),
        report.summaries.len() + report.failures.len()
    );
}

fn format_row(row: &ProjectionRow) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        row.date, row.hour, row.temperature, row.dewpoint, row.humidity, row.windspeed, row.pressure
    )
}

fn write_rows_csv(path: &Path, rows: &[ProjectionRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
