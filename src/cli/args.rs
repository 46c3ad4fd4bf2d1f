use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-table")]
#[command(about = "Load hourly station weather readings into a sorted table and query them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Settings file (toml, json or yaml)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load every configured station into the table
    Load {
        #[arg(long, help = "Clear the table before loading")]
        reset: bool,

        #[arg(long, help = "Load stations concurrently")]
        parallel: bool,

        #[arg(long, default_value_t = num_cpus::get())]
        workers: usize,

        #[arg(long, help = "Rows per write batch [default: from settings]")]
        batch_size: Option<usize>,
    },

    /// Load a single station file
    Ingest {
        #[arg(short, long)]
        station: String,

        #[arg(short, long, help = "Station CSV file")]
        file: PathBuf,

        #[arg(long, help = "Rows per write batch [default: from settings]")]
        batch_size: Option<usize>,
    },

    /// Read one value for a station-hour
    Point {
        #[arg(short, long)]
        station: String,

        #[arg(short, long, help = "Date as YYYY-MM-DD")]
        date: String,

        #[arg(long)]
        hour: u32,

        #[arg(long, default_value = "temperature")]
        column: String,
    },

    /// Maximum of a column for one station over a date window
    Max {
        #[arg(short, long)]
        station: String,

        #[arg(long, help = "First date, YYYY-MM-DD")]
        from: String,

        #[arg(long, help = "Last date, YYYY-MM-DD (inclusive)")]
        to: String,

        #[arg(long, default_value = "windspeed")]
        column: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        baseline: i64,
    },

    /// Maximum of a column across several stations and months
    MaxMonths {
        #[arg(long, value_delimiter = ',', required = true)]
        stations: Vec<String>,

        #[arg(long, value_delimiter = ',', required = true, help = "Months as YYYY-MM")]
        months: Vec<String>,

        #[arg(long, default_value = "temperature")]
        column: String,

        #[arg(long, default_value_t = -100, allow_negative_numbers = true)]
        baseline: i64,
    },

    /// Print date, hour and readings for every row in a date window
    Scan {
        #[arg(short, long)]
        station: String,

        #[arg(long, help = "First date, YYYY-MM-DD")]
        from: String,

        #[arg(long, help = "Last date, YYYY-MM-DD (inclusive)")]
        to: String,

        #[arg(short, long, help = "Write the rows as CSV instead of printing them")]
        output: Option<PathBuf>,
    },

    /// Run the canonical report queries
    Report,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_max_months() {
        let cli = Cli::parse_from([
            "weather-table",
            "max-months",
            "--stations",
            "PDX,SEA,YVR",
            "--months",
            "2022-07,2022-08",
        ]);
        match cli.command {
            Commands::MaxMonths {
                stations,
                months,
                column,
                baseline,
            } => {
                assert_eq!(stations, vec!["PDX", "SEA", "YVR"]);
                assert_eq!(months, vec!["2022-07", "2022-08"]);
                assert_eq!(column, "temperature");
                assert_eq!(baseline, -100);
            }
            _ => panic!("expected max-months"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["weather-table", "report", "-v", "--config", "w.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("w.toml")));
        assert!(matches!(cli.command, Commands::Report));
    }
}
