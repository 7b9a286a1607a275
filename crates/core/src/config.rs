use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub discord: DiscordConfig,
    pub sheets: SheetsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    /// Hex-encoded Ed25519 public key from the application's developer page.
    pub public_key: String,
    pub bot_token: SecretString,
    pub application_id: String,
    /// Guild to scope command registration to; global registration when unset.
    pub guild_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    /// Spreadsheet display name, resolved to an id at startup.
    pub spreadsheet_name: String,
    /// Raw service-account key JSON.
    pub credentials_json: SecretString,
    pub timezone: Tz,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub http_port: Option<u16>,
    pub discord_public_key: Option<String>,
    pub discord_bot_token: Option<String>,
    pub discord_application_id: Option<String>,
    pub discord_guild_id: Option<String>,
    pub spreadsheet_name: Option<String>,
    pub credentials_json: Option<String>,
    pub timezone: Option<Tz>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig { bind_address: "0.0.0.0".to_string(), port: 5000 },
            discord: DiscordConfig {
                public_key: String::new(),
                bot_token: String::new().into(),
                application_id: String::new(),
                guild_id: None,
            },
            sheets: SheetsConfig {
                spreadsheet_name: "Daily Logs".to_string(),
                credentials_json: String::new().into(),
                timezone: chrono_tz::Asia::Kolkata,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tally.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(http) = patch.http {
            if let Some(bind_address) = http.bind_address {
                self.http.bind_address = bind_address;
            }
            if let Some(port) = http.port {
                self.http.port = port;
            }
        }

        if let Some(discord) = patch.discord {
            if let Some(public_key) = discord.public_key {
                self.discord.public_key = public_key;
            }
            if let Some(bot_token_value) = discord.bot_token {
                self.discord.bot_token = secret_value(bot_token_value);
            }
            if let Some(application_id) = discord.application_id {
                self.discord.application_id = application_id;
            }
            if let Some(guild_id) = discord.guild_id {
                self.discord.guild_id = Some(guild_id);
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(spreadsheet_name) = sheets.spreadsheet_name {
                self.sheets.spreadsheet_name = spreadsheet_name;
            }
            if let Some(credentials_value) = sheets.credentials_json {
                self.sheets.credentials_json = secret_value(credentials_value);
            }
            if let Some(timezone) = sheets.timezone {
                self.sheets.timezone = timezone;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TALLY_HTTP_BIND_ADDRESS") {
            self.http.bind_address = value;
        }
        if let Some(value) = read_env("TALLY_HTTP_PORT") {
            self.http.port = parse_u16("TALLY_HTTP_PORT", &value)?;
        }

        if let Some(value) = read_env("TALLY_DISCORD_PUBLIC_KEY") {
            self.discord.public_key = value;
        }
        if let Some(value) = read_env("TALLY_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("TALLY_DISCORD_APPLICATION_ID") {
            self.discord.application_id = value;
        }
        if let Some(value) = read_env("TALLY_DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(value);
        }

        let sheet_name =
            read_env("TALLY_SHEETS_SPREADSHEET_NAME").or_else(|| read_env("TALLY_SHEET_NAME"));
        if let Some(value) = sheet_name {
            self.sheets.spreadsheet_name = value;
        }
        let credentials = read_env("TALLY_SHEETS_CREDENTIALS_JSON")
            .or_else(|| read_env("TALLY_GOOGLE_CREDENTIALS_JSON"));
        if let Some(value) = credentials {
            self.sheets.credentials_json = secret_value(value);
        }
        let timezone = read_env("TALLY_SHEETS_TIMEZONE")
            .map(|value| ("TALLY_SHEETS_TIMEZONE", value))
            .or_else(|| read_env("TALLY_TIMEZONE").map(|value| ("TALLY_TIMEZONE", value)));
        if let Some((key, value)) = timezone {
            self.sheets.timezone = parse_timezone(key, &value)?;
        }

        let log_level = read_env("TALLY_LOGGING_LEVEL").or_else(|| read_env("TALLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("TALLY_LOGGING_FORMAT").or_else(|| read_env("TALLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(http_port) = overrides.http_port {
            self.http.port = http_port;
        }
        if let Some(public_key) = overrides.discord_public_key {
            self.discord.public_key = public_key;
        }
        if let Some(bot_token) = overrides.discord_bot_token {
            self.discord.bot_token = secret_value(bot_token);
        }
        if let Some(application_id) = overrides.discord_application_id {
            self.discord.application_id = application_id;
        }
        if let Some(guild_id) = overrides.discord_guild_id {
            self.discord.guild_id = Some(guild_id);
        }
        if let Some(spreadsheet_name) = overrides.spreadsheet_name {
            self.sheets.spreadsheet_name = spreadsheet_name;
        }
        if let Some(credentials_json) = overrides.credentials_json {
            self.sheets.credentials_json = secret_value(credentials_json);
        }
        if let Some(timezone) = overrides.timezone {
            self.sheets.timezone = timezone;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http(&self.http)?;
        validate_discord(&self.discord)?;
        validate_sheets(&self.sheets)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    if let Some(value) = read_env("TALLY_CONFIG") {
        let path = PathBuf::from(value);
        return path.exists().then_some(path);
    }

    [PathBuf::from("tally.toml"), PathBuf::from("config/tally.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.port == 0 {
        return Err(ConfigError::Validation(
            "http.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    let public_key = discord.public_key.trim();
    if public_key.is_empty() {
        return Err(ConfigError::Validation(
            "discord.public_key is required. Copy it from the developer portal > Your App > General Information > Public Key".to_string()
        ));
    }
    if public_key.len() != 64 || !public_key.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ConfigError::Validation(format!(
            "discord.public_key must be 64 hex characters (got {} characters)",
            public_key.len()
        )));
    }

    if discord.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "discord.bot_token is required. Get it from the developer portal > Your App > Bot > Token".to_string()
        ));
    }

    let application_id = discord.application_id.trim();
    if application_id.is_empty() {
        return Err(ConfigError::Validation(
            "discord.application_id is required. Copy the Application ID from the developer portal".to_string()
        ));
    }
    if !application_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::Validation(format!(
            "discord.application_id must be a numeric snowflake, got `{application_id}`"
        )));
    }

    if let Some(guild_id) = &discord.guild_id {
        let guild_id = guild_id.trim();
        if guild_id.is_empty() || !guild_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "discord.guild_id must be a numeric snowflake when set, got `{guild_id}`"
            )));
        }
    }

    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if sheets.spreadsheet_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.spreadsheet_name must not be empty".to_string(),
        ));
    }

    let credentials = sheets.credentials_json.expose_secret().trim();
    if credentials.is_empty() {
        return Err(ConfigError::Validation(
            "sheets.credentials_json is required. Paste the service-account key JSON (or point TALLY_GOOGLE_CREDENTIALS_JSON at it)".to_string()
        ));
    }
    if !credentials.starts_with('{') {
        return Err(ConfigError::Validation(
            "sheets.credentials_json must be the raw service-account JSON object, not a file path".to_string()
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_timezone(key: &str, value: &str) -> Result<Tz, ConfigError> {
    value.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    http: Option<HttpPatch>,
    discord: Option<DiscordPatch>,
    sheets: Option<SheetsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    public_key: Option<String>,
    bot_token: Option<String>,
    application_id: Option<String>,
    guild_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    spreadsheet_name: Option<String>,
    credentials_json: Option<String>,
    timezone: Option<Tz>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
