//! Layered settings: built-in defaults, an optional settings file, then
//! `WEATHER_TABLE_*` environment variables.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::processors::StationSource;
use crate::readers::SourceLocator;
use crate::utils::constants::{
    COLUMN_FAMILY, DEFAULT_BATCH_SIZE, DEFAULT_DATA_DIRS, DEFAULT_STORE_PATH, DEFAULT_TABLE_ID,
    ENV_PREFIX, MISSING_VALUE, SETTINGS_FILE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(length(min = 1))]
    pub table_id: String,

    #[validate(length(min = 1))]
    pub column_family: String,

    #[validate(range(min = 1))]
    pub batch_size: usize,

    pub data_dirs: Vec<PathBuf>,

    pub store_path: PathBuf,

    #[validate(length(min = 1))]
    pub missing_value: String,

    pub stations: Vec<StationSource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_id: DEFAULT_TABLE_ID.to_string(),
            column_family: COLUMN_FAMILY.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            data_dirs: DEFAULT_DATA_DIRS.iter().map(PathBuf::from).collect(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            missing_value: MISSING_VALUE.to_string(),
            stations: vec![
                StationSource::new("SEA", "seatac.csv"),
                StationSource::new("YVR", "vancouver.csv"),
                StationSource::new("PDX", "portland.csv"),
            ],
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise
    /// `weather-table.{toml,json,yaml}` in the working directory is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(SETTINGS_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("data_dirs")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate_all()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;
        for source in &self.stations {
            source.validate()?;
        }
        Ok(())
    }

    pub fn locator(&self) -> SourceLocator {
        SourceLocator::new(self.data_dirs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn toml_file() -> NamedTempFile {
        Builder::new().suffix(".toml").tempfile().unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate_all().is_ok());
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.column_family, "sensor");
        assert_eq!(settings.stations.len(), 3);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() -> Result<()> {
        let mut file = toml_file();
        writeln!(file, "batch_size = 250")?;
        writeln!(file, "data_dirs = [\"fixtures\"]")?;
        writeln!(file, "[[stations]]")?;
        writeln!(file, "station = \"SEA\"")?;
        writeln!(file, "file = \"sea.csv\"")?;

        let settings = Settings::load(Some(file.path()))?;
        assert_eq!(settings.batch_size, 250);
        assert_eq!(settings.data_dirs, vec![PathBuf::from("fixtures")]);
        assert_eq!(settings.stations, vec![StationSource::new("SEA", "sea.csv")]);
        assert_eq!(settings.table_id, "weather");
        Ok(())
    }

    #[test]
    fn test_zero_batch_size_is_rejected() -> Result<()> {
        let mut file = toml_file();
        writeln!(file, "batch_size = 0")?;
        assert!(Settings::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/no/such/settings.toml"))).is_err());
    }
}
