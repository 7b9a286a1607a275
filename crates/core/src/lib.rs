pub mod config;
pub mod worklog;

pub use config::{
    AppConfig, ConfigError, ConfigOverrides, DiscordConfig, HttpConfig, LoadOptions, LogFormat,
    LoggingConfig, SheetsConfig,
};
pub use worklog::{WorkAction, WorkEntry, WorkLogError, WorkLogRow, WorkLogSink};
