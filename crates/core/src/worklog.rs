use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

/// What a single interaction reports about the user's work day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkAction {
    Start,
    End,
    Task,
}

impl WorkAction {
    /// Vocabulary written to the action column of the sheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkAction::Start => "Start",
            WorkAction::End => "End",
            WorkAction::Task => "Task",
        }
    }
}

/// One work event as extracted from an interaction, before time stamping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkEntry {
    pub display_name: String,
    pub action: WorkAction,
    pub task_title: String,
    pub description: String,
}

impl WorkEntry {
    pub fn start(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            action: WorkAction::Start,
            task_title: String::new(),
            description: String::new(),
        }
    }

    pub fn end(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            action: WorkAction::End,
            task_title: String::new(),
            description: String::new(),
        }
    }

    pub fn task(
        display_name: impl Into<String>,
        task_title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            action: WorkAction::Task,
            task_title: task_title.into(),
            description: description.into(),
        }
    }
}

/// A fully stamped row, one per interaction, appended and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkLogRow {
    pub date: String,
    pub display_name: String,
    pub action: String,
    pub time: String,
    pub task_title: String,
    pub description: String,
}

impl WorkLogRow {
    /// Stamps an entry with the local wall-clock time of the configured zone.
    pub fn compose(entry: &WorkEntry, stamped_at: DateTime<Tz>) -> Self {
        Self {
            date: stamped_at.format("%Y-%m-%d").to_string(),
            display_name: entry.display_name.clone(),
            action: entry.action.as_str().to_string(),
            time: stamped_at.format("%H:%M:%S").to_string(),
            task_title: entry.task_title.clone(),
            description: entry.description.clone(),
        }
    }

    /// Column order expected by the sheet: date, name, action, time, title, description.
    pub fn into_cells(self) -> [String; 6] {
        [self.date, self.display_name, self.action, self.time, self.task_title, self.description]
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkLogError {
    #[error("work log append failed: {0}")]
    Append(String),
}

/// Destination for stamped rows. The spreadsheet client implements this; the
/// command router only ever writes through it.
#[async_trait]
pub trait WorkLogSink: Send + Sync {
    async fn append(&self, entry: &WorkEntry) -> Result<(), WorkLogError>;
}
