//! `gfm commonmark` command implementation.

use clap::Args;

use super::InputArgs;
use crate::error::CliError;
use crate::output::write_stdout;

/// Arguments for the commonmark command.
#[derive(Args)]
pub(crate) struct CommonMarkArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Wrap column, 0 to disable wrapping (overrides config).
    #[arg(short, long)]
    width: Option<usize>,
}

impl CommonMarkArgs {
    /// Execute the commonmark command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or parsing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.input.load_config(self.width)?;
        let doc = self.input.parse(&config)?;
        write_stdout(&doc.to_commonmark(config.render.width))?;
        Ok(())
    }
}
