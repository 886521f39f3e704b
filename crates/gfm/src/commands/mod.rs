//! CLI command implementations.

pub(crate) mod commonmark;
pub(crate) mod events;
pub(crate) mod html;
pub(crate) mod tasks;
pub(crate) mod toggle;

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::PathBuf;

use clap::Args;
use gfm_config::{CliSettings, Config};
use gfm_core::{Document, Parser};

use crate::error::CliError;

pub(crate) use commonmark::CommonMarkArgs;
pub(crate) use events::EventsArgs;
pub(crate) use html::HtmlArgs;
pub(crate) use tasks::TasksArgs;
pub(crate) use toggle::ToggleArgs;

/// Bytes read from the input per `Parser::feed` call.
const CHUNK_SIZE: usize = 8 * 1024;

/// Input and parser arguments shared by every command.
#[derive(Args)]
pub(crate) struct InputArgs {
    /// Markdown file to read (default: stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover gfm.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Option flag to enable, e.g. `sourcepos` or `unsafe` (repeatable).
    #[arg(short, long = "option", value_name = "NAME")]
    options: Vec<String>,

    /// Syntax extension to attach, e.g. `table` (repeatable).
    #[arg(short, long = "extension", value_name = "NAME")]
    extensions: Vec<String>,

    /// Attach every GitHub Flavored Markdown extension.
    #[arg(long)]
    gfm: bool,
}

impl InputArgs {
    /// Load configuration with these arguments applied on top.
    pub(crate) fn load_config(&self, width: Option<usize>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            options: self.options.clone(),
            extensions: self.extensions.clone(),
            gfm: self.gfm,
            width,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        Ok(config)
    }

    /// Stream the input into a parser built from `config`.
    pub(crate) fn parse(&self, config: &Config) -> Result<Document, CliError> {
        let mut parser = config.new_parser()?;
        match &self.file {
            Some(path) => feed_reader(&mut parser, File::open(path)?)?,
            None => feed_reader(&mut parser, io::stdin().lock())?,
        }
        Ok(parser.finish()?)
    }

    /// Read the whole input as text.
    pub(crate) fn read_text(&self) -> Result<String, CliError> {
        let mut bytes = Vec::new();
        match &self.file {
            Some(path) => File::open(path)?.read_to_end(&mut bytes)?,
            None => io::stdin().lock().read_to_end(&mut bytes)?,
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub(crate) fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }
}

/// Feed `reader` into `parser` in fixed-size chunks.
fn feed_reader(parser: &mut Parser, mut reader: impl Read) -> Result<(), CliError> {
    let mut buf = vec![0; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        parser.feed(&buf[..n])?;
    }
}
