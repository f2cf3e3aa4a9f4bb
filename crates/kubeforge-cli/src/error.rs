//! CLI error type and its mapping to exit codes.
//!
//! Core failures keep their [`ForgeError`] so that the report can name the
//! plugin chain and the root cause.

use std::error::Error;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use kubeforge_core::error::{ErrorCategory as CoreCategory, ForgeError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input the core never sees (missing defaults, bad paths).
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// The `--dir` root does not exist.
    #[error("Project directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// A configuration file or template override could not be loaded.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    #[error("Scaffolding failed: {0}")]
    Core(#[from] ForgeError),

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

impl CliError {
    /// Hints printed under the error message.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { .. } => vec!["Run the command with --help to see its flags".into()],

            Self::DirectoryNotFound { path } => vec![
                format!("'{}' does not exist", path.display()),
                "Run `kubeforge init` first or pass the project root with --dir".into(),
            ],

            Self::ConfigError { .. } => vec![
                format!(
                    "The default config file lives at {}",
                    crate::config::AppConfig::config_path().display()
                ),
                "KUBEFORGE_* environment variables override the file".into(),
            ],

            Self::Core(core_err) => core_err.suggestions(),

            Self::IoError { .. } => vec!["Check that the project directory is writable".into()],
        }
    }

    /// Bucket used for the exit code and the log level.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::UserError,
            Self::DirectoryNotFound { .. } => ErrorCategory::NotFound,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation | CoreCategory::Compatibility => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::IoError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::Internal => 1,
        }
    }

    /// Plugin keys a core error passed through, outermost first.
    fn plugin_chain(&self) -> Vec<String> {
        match self {
            Self::Core(core) => {
                let mut chain: Vec<String> = Vec::new();
                for key in core.plugin_chain() {
                    let key = key.to_string();
                    if chain.last() != Some(&key) {
                        chain.push(key);
                    }
                }
                chain
            }
            _ => Vec::new(),
        }
    }

    /// Render the error report printed on stderr.
    ///
    /// With `verbose` the report also lists the plugin chain and every
    /// underlying cause. `color` switches ANSI styling on.
    pub fn report(&self, verbose: bool, color: bool) -> String {
        let paint = |text: &str, style: fn(&str) -> String| {
            if color { style(text) } else { text.to_owned() }
        };

        let mut lines = vec![String::new()];
        lines.push(format!(
            "{} {self}",
            paint("Error:", |t| t.red().bold().to_string())
        ));

        if verbose {
            let chain = self.plugin_chain();
            if !chain.is_empty() {
                lines.push(paint(
                    &format!("  Plugins: {}", chain.join(" -> ")),
                    |t| t.dimmed().to_string(),
                ));
            }
            let mut cause = self.source();
            while let Some(err) = cause {
                lines.push(paint(&format!("  Caused by: {err}"), |t| {
                    t.dimmed().to_string()
                }));
                cause = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            lines.push(String::new());
            lines.push(paint("Suggestions:", |t| t.yellow().bold().to_string()));
            lines.extend(suggestions.iter().map(|s| format!("  {s}")));
        }

        if !verbose {
            lines.push(String::new());
            lines.push(paint("Use -v / --verbose for more details.", |t| {
                t.dimmed().to_string()
            }));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn log(&self) {
        let category = self.category();
        match category {
            ErrorCategory::UserError | ErrorCategory::NotFound => {
                tracing::warn!(?category, "{self}")
            }
            ErrorCategory::Configuration | ErrorCategory::Internal => {
                tracing::error!(?category, "{self}")
            }
        }

        if let Self::Core(core) = self {
            tracing::debug!(kind = ?core.kind(), "root cause: {}", core.root_cause());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad flags, invalid names, unmet preconditions.
    UserError,
    /// A directory, plugin, marker or text that does not exist.
    NotFound,
    /// Config file, template overrides, project version mismatch.
    Configuration,
    Internal,
}

/// Attaches a context message to I/O failures.
pub trait IntoCli<T> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}
