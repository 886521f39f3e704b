//! `gfm html` command implementation.

use clap::Args;

use super::InputArgs;
use crate::error::CliError;
use crate::output::write_stdout;

/// Arguments for the html command.
#[derive(Args)]
pub(crate) struct HtmlArgs {
    #[command(flatten)]
    input: InputArgs,
}

impl HtmlArgs {
    /// Execute the html command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or parsing fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.input.load_config(None)?;
        let doc = self.input.parse(&config)?;
        write_stdout(&doc.to_html())?;
        Ok(())
    }
}
