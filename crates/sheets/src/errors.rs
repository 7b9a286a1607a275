use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("service-account credentials are not valid JSON: {0}")]
    Credentials(#[from] serde_json::Error),
    #[error("could not build the service-account assertion: {0}")]
    Assertion(#[from] jsonwebtoken::errors::Error),
    #[error("spreadsheet request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token exchange rejected with status {status}: {body}")]
    TokenExchange { status: u16, body: String },
    #[error("no spreadsheet named `{0}` is visible to the service account")]
    SpreadsheetNotFound(String),
    #[error("spreadsheet `{0}` has no worksheets")]
    NoWorksheets(String),
    #[error("sheets api call rejected with status {status}: {body}")]
    Api { status: u16, body: String },
}
