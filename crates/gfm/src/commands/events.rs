//! `gfm events` command implementation.
//!
//! Prints the ENTER/EXIT event stream of a parsed document, one event per
//! line, indented by depth.

use std::fmt::Write as _;

use clap::Args;
use gfm_core::{Document, EventType, NodeRef};

use super::InputArgs;
use crate::error::CliError;
use crate::output::write_stdout;

/// Arguments for the events command.
#[derive(Args)]
pub(crate) struct EventsArgs {
    #[command(flatten)]
    input: InputArgs,
}

impl EventsArgs {
    /// Execute the events command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or parsing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.input.load_config(None)?;
        let doc = self.input.parse(&config)?;
        write_stdout(&format_events(&doc))?;
        Ok(())
    }
}

fn format_events(doc: &Document) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for (event, node) in doc.walk() {
        if event == EventType::Exit {
            depth = depth.saturating_sub(1);
        }
        let label = if event == EventType::Enter { "enter" } else { "exit" };
        let _ = write!(out, "{:indent$}{label} {}", "", node.type_string(), indent = depth * 2);
        write_details(&mut out, node, event);
        out.push('\n');
        if event == EventType::Enter {
            depth += 1;
        }
    }
    out
}

fn write_details(out: &mut String, node: NodeRef<'_>, event: EventType) {
    if event != EventType::Enter {
        return;
    }
    if let Some(literal) = node.literal() {
        let _ = write!(out, " {literal:?}");
    }
    let span = node.span();
    if !span.is_empty() {
        let _ = write!(out, " @{span}");
    }
}
