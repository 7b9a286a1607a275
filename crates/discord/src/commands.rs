use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use tally_core::worklog::{WorkEntry, WorkLogError, WorkLogSink};

use crate::interaction::CommandData;

/// Option type tag for plain string arguments in the registration schema.
pub const OPTION_TYPE_STRING: u8 = 3;

/// One slash command as sent to the registration endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDefinition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandOptionDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub required: bool,
}

/// The full command set. Registration sends this as a bulk overwrite, so the
/// list is the single source of truth for what the service supports.
pub fn command_catalog() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "start".to_owned(),
            description: "Log start of work".to_owned(),
            options: Vec::new(),
        },
        CommandDefinition {
            name: "end".to_owned(),
            description: "Log end of work".to_owned(),
            options: Vec::new(),
        },
        CommandDefinition {
            name: "work_done".to_owned(),
            description: "Log a completed task".to_owned(),
            options: vec![
                CommandOptionDefinition {
                    name: "task_title".to_owned(),
                    description: "Title of the task".to_owned(),
                    kind: OPTION_TYPE_STRING,
                    required: true,
                },
                CommandOptionDefinition {
                    name: "desc".to_owned(),
                    description: "Description (optional)".to_owned(),
                    kind: OPTION_TYPE_STRING,
                    required: false,
                },
            ],
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkCommand {
    Start,
    End,
    WorkDone { task_title: String, description: String },
    Unknown { name: String },
}

/// Maps a decoded command payload onto the supported command set. Missing
/// option values degrade to empty strings, matching the registered defaults.
pub fn classify_command(data: &CommandData) -> WorkCommand {
    match data.name.as_str() {
        "start" => WorkCommand::Start,
        "end" => WorkCommand::End,
        "work_done" => WorkCommand::WorkDone {
            task_title: data.string_option("task_title").unwrap_or_default().to_owned(),
            description: data.string_option("desc").unwrap_or_default().to_owned(),
        },
        other => WorkCommand::Unknown { name: other.to_owned() },
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error(transparent)]
    Sink(#[from] WorkLogError),
}

/// Routes classified commands to the work-log sink and renders the
/// confirmation content. Unknown commands are answered without a write.
pub struct CommandRouter {
    sink: Arc<dyn WorkLogSink>,
}

impl CommandRouter {
    pub fn new(sink: Arc<dyn WorkLogSink>) -> Self {
        Self { sink }
    }

    pub async fn route(
        &self,
        command: WorkCommand,
        display_name: &str,
    ) -> Result<String, CommandRouteError> {
        match command {
            WorkCommand::Start => {
                self.sink.append(&WorkEntry::start(display_name)).await?;
                Ok(format!("🟢 Start logged for **{display_name}**"))
            }
            WorkCommand::End => {
                self.sink.append(&WorkEntry::end(display_name)).await?;
                Ok(format!("🔴 End logged for **{display_name}**"))
            }
            WorkCommand::WorkDone { task_title, description } => {
                let content = format!("✅ Task logged: **{task_title}** - {description}");
                self.sink.append(&WorkEntry::task(display_name, task_title, description)).await?;
                Ok(content)
            }
            WorkCommand::Unknown { name } => {
                warn!(
                    event_name = "discord.commands.unknown",
                    command = %name,
                    "received a command that is not in the catalog"
                );
                Ok("⚠ Unknown command".to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use tally_core::worklog::{WorkAction, WorkEntry, WorkLogError, WorkLogSink};

    use super::{classify_command, command_catalog, CommandRouteError, CommandRouter, WorkCommand};
    use crate::interaction::CommandData;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<WorkEntry>>,
    }

    #[async_trait]
    impl WorkLogSink for RecordingSink {
        async fn append(&self, entry: &WorkEntry) -> Result<(), WorkLogError> {
            self.entries.lock().expect("lock").push(entry.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl WorkLogSink for FailingSink {
        async fn append(&self, _entry: &WorkEntry) -> Result<(), WorkLogError> {
            Err(WorkLogError::Append("sheet unreachable".to_owned()))
        }
    }

    fn command_data(value: serde_json::Value) -> CommandData {
        serde_json::from_value(value).expect("command data should decode")
    }

    #[test]
    fn catalog_matches_the_registration_schema() {
        let encoded = serde_json::to_value(command_catalog()).expect("catalog should encode");
        assert_eq!(
            encoded,
            json!([
                {"name": "start", "description": "Log start of work"},
                {"name": "end", "description": "Log end of work"},
                {
                    "name": "work_done",
                    "description": "Log a completed task",
                    "options": [
                        {
                            "name": "task_title",
                            "description": "Title of the task",
                            "type": 3,
                            "required": true
                        },
                        {
                            "name": "desc",
                            "description": "Description (optional)",
                            "type": 3,
                            "required": false
                        }
                    ]
                }
            ])
        );
    }

    #[test]
    fn classifies_the_supported_commands() {
        assert_eq!(classify_command(&command_data(json!({"name": "start"}))), WorkCommand::Start);
        assert_eq!(classify_command(&command_data(json!({"name": "end"}))), WorkCommand::End);
        assert_eq!(
            classify_command(&command_data(json!({
                "name": "work_done",
                "options": [
                    {"name": "task_title", "value": "Fix bug"},
                    {"name": "desc", "value": "parser edge case"}
                ]
            }))),
            WorkCommand::WorkDone {
                task_title: "Fix bug".to_owned(),
                description: "parser edge case".to_owned(),
            }
        );
        assert_eq!(
            classify_command(&command_data(json!({"name": "ship_it"}))),
            WorkCommand::Unknown { name: "ship_it".to_owned() }
        );
    }

    #[test]
    fn missing_options_default_to_empty_strings() {
        assert_eq!(
            classify_command(&command_data(json!({"name": "work_done"}))),
            WorkCommand::WorkDone { task_title: String::new(), description: String::new() }
        );
    }

    #[tokio::test]
    async fn start_and_end_append_exactly_one_bare_entry() {
        let sink = Arc::new(RecordingSink::default());
        let router = CommandRouter::new(sink.clone());

        let content = router.route(WorkCommand::Start, "Bob").await.expect("start routes");
        assert!(content.contains("Bob"));

        router.route(WorkCommand::End, "Bob").await.expect("end routes");

        let entries = sink.entries.lock().expect("lock");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, WorkAction::Start);
        assert!(entries[0].task_title.is_empty());
        assert!(entries[0].description.is_empty());
        assert_eq!(entries[1].action, WorkAction::End);
    }

    #[tokio::test]
    async fn work_done_appends_title_and_echoes_it() {
        let sink = Arc::new(RecordingSink::default());
        let router = CommandRouter::new(sink.clone());

        let content = router
            .route(
                WorkCommand::WorkDone {
                    task_title: "Fix bug".to_owned(),
                    description: String::new(),
                },
                "Bob",
            )
            .await
            .expect("work_done routes");

        assert!(content.contains("Fix bug"));
        let entries = sink.entries.lock().expect("lock");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, WorkAction::Task);
        assert_eq!(entries[0].task_title, "Fix bug");
        assert!(entries[0].description.is_empty());
    }

    #[tokio::test]
    async fn unknown_commands_never_touch_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let router = CommandRouter::new(sink.clone());

        let content = router
            .route(WorkCommand::Unknown { name: "ship_it".to_owned() }, "Bob")
            .await
            .expect("unknown routes");

        assert_eq!(content, "⚠ Unknown command");
        assert!(sink.entries.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn sink_failures_surface_as_route_errors() {
        let router = CommandRouter::new(Arc::new(FailingSink));

        let error = router
            .route(WorkCommand::Start, "Bob")
            .await
            .expect_err("sink failure must propagate");

        assert_eq!(
            error,
            CommandRouteError::Sink(WorkLogError::Append("sheet unreachable".to_owned()))
        );
    }
}
