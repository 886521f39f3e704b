//! `gfm tasks` command implementation.

use std::fmt::Write as _;

use clap::Args;
use gfm_config::Config;
use gfm_core::{Document, extension::tasklist};
use serde::Serialize;

use super::InputArgs;
use crate::error::CliError;
use crate::output::write_stdout;

/// Arguments for the tasks command.
#[derive(Args)]
pub(crate) struct TasksArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print tasks as a JSON array.
    #[arg(long)]
    json: bool,
}

/// A task list item as reported by `gfm tasks`.
#[derive(Debug, PartialEq, Serialize)]
struct TaskRecord<'a> {
    id: &'a str,
    checked: bool,
    text: String,
}

impl TasksArgs {
    /// Execute the tasks command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or parsing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let mut config = self.input.load_config(None)?;
        require_tasklist(&mut config);
        let doc = self.input.parse(&config)?;
        let records = task_records(&doc);
        tracing::debug!(tasks = records.len(), "Collected tasks");

        let output = if self.json {
            let mut json = serde_json::to_string_pretty(&records)?;
            json.push('\n');
            json
        } else {
            format_records(&records)
        };
        write_stdout(&output)?;
        Ok(())
    }
}

/// Task items are only recognized with the tasklist extension attached.
pub(crate) fn require_tasklist(config: &mut Config) {
    if !config.parser.extensions.iter().any(|name| name == tasklist::NAME) {
        config.parser.extensions.push(tasklist::NAME.to_owned());
    }
}

fn task_records(doc: &Document) -> Vec<TaskRecord<'_>> {
    doc.tasks()
        .into_iter()
        .map(|task| TaskRecord {
            id: task.identifier(),
            checked: task.checked(),
            text: task.node().text_content(),
        })
        .collect()
}

fn format_records(records: &[TaskRecord<'_>]) -> String {
    let mut out = String::new();
    for record in records {
        let mark = if record.checked { 'x' } else { ' ' };
        let _ = writeln!(out, "[{mark}] {}\t{}", record.id, record.text);
    }
    out
}
