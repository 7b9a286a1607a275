//! Google Sheets work log backend.
//!
//! Authenticates with a service account, resolves the configured
//! spreadsheet by display name through the Drive API, and appends work
//! log rows to the first worksheet. [`client::SheetsClient`] implements
//! [`tally_core::worklog::WorkLogSink`], which is the only surface the
//! rest of the system sees.

pub mod auth;
pub mod client;
pub mod errors;

pub use client::SheetsClient;
pub use errors::SheetsError;
