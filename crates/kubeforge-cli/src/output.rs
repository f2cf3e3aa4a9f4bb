//! Everything the commands print to stdout goes through [`OutputManager`].

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

pub struct OutputManager {
    format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let format = match args.output_format {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            explicit => explicit,
        };
        Self {
            format,
            quiet: args.quiet,
            no_color: args.no_color || config.output.no_color || format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    pub fn print(&self, msg: &str) -> io::Result<()> {
        self.emit(None, msg, Style::new())
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.emit(Some('\u{2713}'), msg, Style::new().green())
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.emit(Some('\u{26a0}'), msg, Style::new().yellow())
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.emit(Some('\u{2139}'), msg, Style::new().blue())
    }

    pub fn header(&self, text: &str) -> io::Result<()> {
        self.emit(None, text, Style::new().cyan().bold())
    }

    /// Indented secondary line such as a bundle member or a changed path.
    pub fn detail(&self, text: &str) -> io::Result<()> {
        self.emit(None, &format!("  {text}"), Style::new().dimmed())
    }

    /// Pretty-printed JSON document. Written even with `--quiet`.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    // Text lines would corrupt the JSON document on stdout.
    fn suppressed(&self) -> bool {
        self.quiet || self.is_json()
    }

    fn emit(&self, symbol: Option<char>, msg: &str, style: Style) -> io::Result<()> {
        if self.suppressed() {
            return Ok(());
        }
        let line = match (symbol, self.no_color) {
            (Some(symbol), true) => format!("{symbol} {msg}"),
            (Some(symbol), false) => {
                format!("{} {}", symbol.style(style.bold()), msg.style(style))
            }
            (None, true) => msg.to_owned(),
            (None, false) => msg.style(style).to_string(),
        };
        self.term.write_line(&line)
    }
}
