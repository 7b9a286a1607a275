use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use tally_core::config::SheetsConfig;
use tally_core::worklog::{WorkEntry, WorkLogError, WorkLogRow, WorkLogSink};

use crate::auth::{ServiceAccountKey, TokenProvider};
use crate::errors::SheetsError;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Process-scoped spreadsheet session. The spreadsheet is addressed by
/// display name in configuration; the id and the first worksheet are
/// resolved once at startup and appends reuse them for the process lifetime.
pub struct SheetsClient {
    client: reqwest::Client,
    tokens: TokenProvider,
    timezone: Tz,
    spreadsheet_id: String,
    worksheet_title: String,
}

impl SheetsClient {
    pub async fn connect(
        client: reqwest::Client,
        config: &SheetsConfig,
    ) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_json(config.credentials_json.expose_secret())?;
        let tokens = TokenProvider::new(client.clone(), key);

        let spreadsheet_id =
            resolve_spreadsheet_id(&client, &tokens, &config.spreadsheet_name).await?;
        let worksheet_title =
            first_worksheet_title(&client, &tokens, &spreadsheet_id, &config.spreadsheet_name)
                .await?;

        info!(
            event_name = "sheets.connected",
            spreadsheet = %config.spreadsheet_name,
            worksheet = %worksheet_title,
            "spreadsheet session established"
        );

        Ok(Self {
            client,
            tokens,
            timezone: config.timezone,
            spreadsheet_id,
            worksheet_title,
        })
    }

    pub fn worksheet_title(&self) -> &str {
        &self.worksheet_title
    }

    /// Appends one row after the worksheet's current data. Raw value input,
    /// no retry, no batching; a failed call surfaces to the caller as is.
    pub async fn append_row(&self, row: WorkLogRow) -> Result<(), SheetsError> {
        let token = self.tokens.bearer_token().await?;
        let range = quote_sheet_title(&self.worksheet_title);
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{}:append",
            self.spreadsheet_id,
            encode_path_segment(&range)
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": [row.into_cells()] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api { status: status.as_u16(), body });
        }

        Ok(())
    }
}

#[async_trait]
impl WorkLogSink for SheetsClient {
    async fn append(&self, entry: &WorkEntry) -> Result<(), WorkLogError> {
        let stamped_at = Utc::now().with_timezone(&self.timezone);
        let row = WorkLogRow::compose(entry, stamped_at);

        self.append_row(row).await.map_err(|source| {
            error!(
                event_name = "sheets.append.failed",
                action = entry.action.as_str(),
                error = %source,
                "work log append failed"
            );
            WorkLogError::Append(source.to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

async fn resolve_spreadsheet_id(
    client: &reqwest::Client,
    tokens: &TokenProvider,
    name: &str,
) -> Result<String, SheetsError> {
    let token = tokens.bearer_token().await?;
    let query = format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        escape_drive_query(name)
    );

    let response = client
        .get(DRIVE_FILES_URL)
        .bearer_auth(&token)
        .query(&[("q", query.as_str()), ("fields", "files(id)"), ("pageSize", "1")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Api { status: status.as_u16(), body });
    }

    let listing: DriveFileList = response.json().await?;
    listing
        .files
        .into_iter()
        .next()
        .map(|file| file.id)
        .ok_or_else(|| SheetsError::SpreadsheetNotFound(name.to_owned()))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

async fn first_worksheet_title(
    client: &reqwest::Client,
    tokens: &TokenProvider,
    spreadsheet_id: &str,
    name: &str,
) -> Result<String, SheetsError> {
    let token = tokens.bearer_token().await?;
    let response = client
        .get(format!("{SHEETS_API_BASE}/{spreadsheet_id}"))
        .bearer_auth(&token)
        .query(&[("fields", "sheets.properties.title")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SheetsError::Api { status: status.as_u16(), body });
    }

    let metadata: SpreadsheetMetadata = response.json().await?;
    metadata
        .sheets
        .into_iter()
        .next()
        .map(|sheet| sheet.properties.title)
        .ok_or_else(|| SheetsError::NoWorksheets(name.to_owned()))
}

/// Single quotes in drive query literals are backslash-escaped.
fn escape_drive_query(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

/// A1 sheet references quote the title; embedded quotes are doubled.
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push('%');
                encoded.push(char::from_digit(u32::from(other >> 4), 16).unwrap_or('0'));
                encoded.push(char::from_digit(u32::from(other & 0x0f), 16).unwrap_or('0'));
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::{encode_path_segment, escape_drive_query, quote_sheet_title};

    #[test]
    fn drive_queries_escape_quotes_and_backslashes() {
        assert_eq!(escape_drive_query("Daily Logs"), "Daily Logs");
        assert_eq!(escape_drive_query("Bob's Logs"), "Bob\\'s Logs");
        assert_eq!(escape_drive_query(r"a\b"), r"a\\b");
    }

    #[test]
    fn sheet_titles_are_quoted_for_a1_ranges() {
        assert_eq!(quote_sheet_title("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet_title("Daily Logs"), "'Daily Logs'");
        assert_eq!(quote_sheet_title("Bob's"), "'Bob''s'");
    }

    #[test]
    fn path_segments_percent_encode_reserved_bytes() {
        assert_eq!(encode_path_segment("Sheet1"), "Sheet1");
        assert_eq!(encode_path_segment("'Daily Logs'"), "%27Daily%20Logs%27");
        assert_eq!(encode_path_segment("a/b"), "a%2fb");
    }
}
