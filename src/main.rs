use clap::Parser;
use weather_table::cli::{run, Cli};
use weather_table::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
