//! `gfm toggle` command implementation.

use clap::Args;
use gfm_core::{Options, Toggle, parse_gfm};

use super::InputArgs;
use crate::error::CliError;
use crate::output::{Output, write_stdout};

/// Arguments for the toggle command.
#[derive(Args)]
pub(crate) struct ToggleArgs {
    /// Task identifier as printed by `gfm tasks` (e.g. `3:1-3:16`).
    id: String,

    #[command(flatten)]
    input: InputArgs,

    /// Mark the task as done instead of flipping it.
    #[arg(long)]
    check: bool,

    /// Mark the task as open instead of flipping it.
    #[arg(long, conflicts_with = "check")]
    uncheck: bool,

    /// Rewrite FILE instead of printing the result.
    #[arg(short, long, requires = "file")]
    in_place: bool,
}

impl ToggleArgs {
    /// Execute the toggle command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading, parsing or writing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.input.load_config(None)?;
        let options = config.options()?;
        let text = self.input.read_text()?;

        let Some(result) = toggle_text(&text, &self.id, self.toggle(), options)? else {
            output.warning(&format!("No task with id '{}'", self.id));
            if !self.in_place {
                write_stdout(&text)?;
            }
            return Ok(());
        };

        match self.input.file() {
            Some(path) if self.in_place => {
                std::fs::write(path, result)?;
                output.success(&format!("Updated {}", path.display()));
            }
            _ => write_stdout(&result)?,
        }
        Ok(())
    }

    /// Resolve the requested state from --check/--uncheck.
    fn toggle(&self) -> Toggle {
        match (self.check, self.uncheck) {
            (true, _) => Toggle::Set(true),
            (_, true) => Toggle::Set(false),
            _ => Toggle::Flip,
        }
    }
}

/// Parse `text` once, toggle the task `id` and render the result; `None`
/// when the document has no such task.
fn toggle_text(text: &str, id: &str, toggle: Toggle, options: Options) -> Result<Option<String>, CliError> {
    let mut doc = parse_gfm(text, options)?;
    Ok(doc.toggle_task(id, toggle)?.map(|_| doc.to_commonmark(0)))
}
