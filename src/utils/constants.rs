/// Row key layout
pub const KEY_SEPARATOR: char = '#';
pub const HOUR_SENTINEL: &str = "99";
pub const DAY_SENTINEL: &str = "31";
pub const MAX_HOUR: u32 = 23;

/// Column family and column qualifiers
pub const COLUMN_FAMILY: &str = "sensor";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_DEWPOINT: &str = "dewpoint";
pub const COL_HUMIDITY: &str = "humidity";
pub const COL_WINDSPEED: &str = "windspeed";
pub const COL_GUST: &str = "gust";
pub const COL_PRESSURE: &str = "pressure";
pub const COL_DATE: &str = "date";
pub const COL_HOUR: &str = "hour";

/// CSV input layout
pub const HEADER_LINES: usize = 2;
pub const MIN_FIELDS: usize = 9;
pub const MISSING_VALUE: &str = "M";

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_TABLE_ID: &str = "weather";
pub const DEFAULT_STORE_PATH: &str = "weather-table.json";
pub const DEFAULT_DATA_DIRS: [&str; 3] = ["data", "./data", "../data"];
pub const SETTINGS_FILE: &str = "weather-table";
pub const ENV_PREFIX: &str = "WEATHER_TABLE";

/// Query baselines
pub const DEFAULT_MAX_BASELINE: i64 = 0;
pub const CROSS_PARTITION_BASELINE: i64 = -100;
