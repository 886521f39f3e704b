//! Configuration management for `gfm`.
//!
//! Parses `gfm.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [parser]
//! options = ["sourcepos", "smart"]
//! extensions = ["table", "tasklist"]
//!
//! [render]
//! width = 80
//! ```

use std::path::{Path, PathBuf};

use gfm_core::{ExtensionRegistry, GFM_EXTENSIONS, Options, Parser};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Options and extensions are added to the configured ones; `width`
/// replaces the configured width.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Extra option names (e.g. "unsafe").
    pub options: Vec<String>,
    /// Extra extension names.
    pub extensions: Vec<String>,
    /// Enable every GFM extension.
    pub gfm: bool,
    /// Override CommonMark wrap width.
    pub width: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gfm.toml";

/// Widest wrap column accepted in `render.width`.
const MAX_WIDTH: usize = 1000;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Renderer configuration.
    pub render: RenderConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Parser configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Option flag names.
    pub options: Vec<String>,
    /// Extension names, attached in this order.
    pub extensions: Vec<String>,
}

/// Renderer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// CommonMark wrap column; 0 disables wrapping.
    pub width: usize,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `gfm.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, and the merged result is
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a name or value is invalid.
    pub fn load(config_path: Option<&Path>, cli_settings: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        push_unique(&mut self.parser.options, settings.options.iter().map(String::as_str));
        if settings.gfm {
            push_unique(&mut self.parser.extensions, GFM_EXTENSIONS.iter().copied());
        }
        push_unique(&mut self.parser.extensions, settings.extensions.iter().map(String::as_str));
        if let Some(width) = settings.width {
            self.render.width = width;
        }
    }

    /// Search for a config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an unknown option or extension
    /// name, or a width above the maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options()?;
        let registry = ExtensionRegistry::global();
        for name in &self.parser.extensions {
            if registry.find(name).is_none() {
                let known: Vec<_> = registry.names().collect();
                return Err(ConfigError::Validation(format!(
                    "parser.extensions: unknown extension '{name}' (expected one of: {})",
                    known.join(", ")
                )));
            }
        }
        if self.render.width > MAX_WIDTH {
            return Err(ConfigError::Validation(format!(
                "render.width cannot exceed {MAX_WIDTH}"
            )));
        }
        Ok(())
    }

    /// Combined option flags named in `parser.options`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an unknown name.
    pub fn options(&self) -> Result<Options, ConfigError> {
        self.parser.options.iter().try_fold(Options::DEFAULT, |acc, name| {
            Options::from_name(name).map(|flag| acc | flag).ok_or_else(|| {
                ConfigError::Validation(format!("parser.options: unknown option '{name}'"))
            })
        })
    }

    /// A parser with the configured options and extensions attached.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an unknown option or extension.
    pub fn new_parser(&self) -> Result<Parser, ConfigError> {
        let mut parser = Parser::new(self.options()?);
        let registry = ExtensionRegistry::global();
        for name in &self.parser.extensions {
            parser
                .attach_extension_by_name(registry, name)
                .map_err(|e| ConfigError::Validation(format!("parser.extensions: {e}")))?;
        }
        Ok(parser)
    }
}

fn push_unique<'a>(target: &mut Vec<String>, names: impl Iterator<Item = &'a str>) {
    for name in names {
        if !target.iter().any(|existing| existing == name) {
            target.push(name.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.parser.options.is_empty());
        assert!(config.parser.extensions.is_empty());
        assert_eq!(config.render.width, 0);
        assert_eq!(config.options().unwrap(), Options::DEFAULT);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.parser.extensions.is_empty());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[parser]
options = ["sourcepos", "smart"]
extensions = ["table", "tasklist"]

[render]
width = 80
"#;
        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.options().unwrap(), Options::SOURCEPOS | Options::SMART);
        assert_eq!(config.parser.extensions, vec!["table", "tasklist"]);
        assert_eq!(config.render.width, 80);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let toml = r#"
[parser]
options = ["sourcepos", "bogus"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let toml = r#"
[parser]
extensions = ["table", "emoji"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("emoji"));
        assert!(err.to_string().contains("tasklist"));
    }

    #[test]
    fn test_width_limit() {
        let toml = r"
[render]
width = 1001
";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("1000"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.parser.extensions.push("table".to_owned());
        let overrides = CliSettings {
            options: vec!["unsafe".to_owned()],
            extensions: vec!["table".to_owned()],
            gfm: true,
            width: Some(72),
        };
        config.apply_cli_settings(&overrides);
        assert_eq!(config.parser.options, vec!["unsafe"]);
        assert_eq!(
            config.parser.extensions,
            vec!["table", "autolink", "strikethrough", "tagfilter", "tasklist"]
        );
        assert_eq!(config.render.width, 72);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.render.width = 40;
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.render.width, 40);
        assert!(config.parser.extensions.is_empty());
    }

    #[test]
    fn test_discover_in_parent() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            Config::discover_config(&nested),
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "[parser]\nextensions = [\"strikethrough\"]\n").unwrap();
        let settings = CliSettings {
            width: Some(20),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.parser.extensions, vec!["strikethrough"]);
        assert_eq!(config.render.width, 20);
    }

    #[test]
    fn test_load_missing_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[parser\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_cli_settings_are_validated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            extensions: vec!["nope".to_owned()],
            ..Default::default()
        };
        assert!(matches!(
            Config::load(Some(&path), Some(&settings)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_new_parser() {
        let toml = r#"
[parser]
extensions = ["strikethrough"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let mut parser = config.new_parser().unwrap();
        assert_eq!(parser.extensions().len(), 1);
        parser.feed(b"~~x~~").unwrap();
        assert_eq!(parser.finish().unwrap().to_html(), "<p><del>x</del></p>\n");
    }
}
