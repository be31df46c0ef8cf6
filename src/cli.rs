use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::io::DEFAULT_TIMEOUT;
use crate::pacing::DEFAULT_REQUEST_INTERVAL;
use crate::zip::Archive;

#[derive(Parser, Debug)]
#[command(name = "pdfgrab")]
#[command(version)]
#[command(about = "Pick PDFs linked from a web page and bundle them into a ZIP", long_about = None)]
#[command(after_help = "Examples:\n  \
  pdfgrab https://example.com/news/            choose PDFs interactively\n  \
  pdfgrab -l https://example.com/news/         only list the PDFs found\n  \
  pdfgrab --select 1-3,7 -o reports.zip URL    fetch items 1, 2, 3 and 7")]
pub struct Cli {
    /// Page to scan for PDF links (asked for when omitted)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Write the archive to FILE
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = Archive::FILE_NAME)]
    pub output: PathBuf,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// List the PDFs found and exit
    #[arg(short = 'l')]
    pub list: bool,

    /// Show dates and URLs in the list; more log output
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Select items without prompting (e.g. 1,3,5-7)
    #[arg(long, value_name = "SPEC", conflicts_with = "all")]
    pub select: Option<String>,

    /// Select every item without prompting
    #[arg(long)]
    pub all: bool,

    /// Minimum pause between downloads, in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", default_value_t = DEFAULT_REQUEST_INTERVAL.as_millis() as u64)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            return "off";
        }
        if self.is_quiet() {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["pdfgrab", "https://example.com/"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://example.com/"));
        assert_eq!(cli.output, PathBuf::from("pdf_files.zip"));
        assert_eq!(cli.delay(), Duration::from_secs(1));
        assert_eq!(cli.timeout(), Duration::from_secs(30));
        assert!(!cli.all);
        assert!(cli.select.is_none());
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn url_is_optional() {
        let cli = Cli::try_parse_from(["pdfgrab"]).unwrap();
        assert!(cli.url.is_none());
    }

    #[test]
    fn select_and_all_conflict() {
        assert!(Cli::try_parse_from(["pdfgrab", "--all", "--select", "1", "u"]).is_err());
    }

    #[test]
    fn verbosity_and_quiet() {
        let cli = Cli::try_parse_from(["pdfgrab", "-vv", "u"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::try_parse_from(["pdfgrab", "-q", "-v", "u"]).unwrap();
        assert_eq!(cli.log_level(), "error");
        let cli = Cli::try_parse_from(["pdfgrab", "-qq", "u"]).unwrap();
        assert_eq!(cli.log_level(), "off");
    }

    #[test]
    fn delay_is_configurable() {
        let cli = Cli::try_parse_from(["pdfgrab", "--delay-ms", "0", "--all", "u"]).unwrap();
        assert_eq!(cli.delay(), Duration::ZERO);
        assert!(cli.all);
    }
}
