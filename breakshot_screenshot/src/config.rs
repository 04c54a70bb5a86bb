use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Parser)]
#[command(name = "breakshot")]
#[command(about = "Capture responsive screenshots of a site's pages with headless Chromium")]
#[command(version, disable_help_flag = true, args_override_self = true)]
pub struct Cli {
    /// Base URL every path is appended to
    #[arg(short = 'h', value_name = "URL")]
    pub base_url: Option<String>,

    /// One or more paths to capture, in output order
    #[arg(short = 'p', value_name = "PATH", num_args = 1..)]
    pub paths: Vec<String>,

    /// Pause in milliseconds after each scroll step and before capture
    #[arg(short = 't', value_name = "MS", allow_negative_numbers = true)]
    pub timeout: Option<String>,

    /// Output directory (default: current directory)
    #[arg(short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Fixed capture height applied to every viewport
    #[arg(short = 'H', value_name = "PX", allow_negative_numbers = true)]
    pub height_limit: Option<String>,

    /// Custom resolution WxH, repeatable
    #[arg(short = 'c', long = "custom", value_name = "WxH", action = ArgAction::Append)]
    pub custom: Vec<String>,

    /// Viewport keys to capture: s, m, l, xl, custom
    #[arg(short = 'v', value_name = "KEY", num_args = 1..)]
    pub viewports: Vec<String>,

    /// Stop auto-scrolling after this many rounds (default: until the page stops growing)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_scroll_rounds: Option<u32>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Base URL (-h) and paths (-p) are required.")]
    MissingRequired,
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base URL '{0}' has no host name")]
    MissingHost(String),
    #[error(transparent)]
    Args(#[from] clap::Error),
}

/// Resolved run configuration. Built once from the process arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub host: String,
    pub paths: Vec<String>,
    pub timeout: Duration,
    pub output: PathBuf,
    pub height_limit: Option<u32>,
    pub custom_resolutions: Vec<String>,
    pub viewports: Vec<String>,
    pub max_scroll_rounds: Option<u32>,
    pub json: bool,
}

impl Config {
    /// Parse a full argument list, program name first.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Self::from_cli(cli)
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let base_url = match cli.base_url {
            Some(url) if !url.is_empty() && !cli.paths.is_empty() => url,
            _ => return Err(ConfigError::MissingRequired),
        };
        let parsed = Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ConfigError::MissingHost(base_url.clone()))?
            .to_owned();

        Ok(Self {
            base_url,
            host,
            paths: cli.paths,
            timeout: Duration::from_millis(resolve_timeout(cli.timeout.as_deref())),
            output: cli.output.unwrap_or_else(|| PathBuf::from(".")),
            height_limit: cli.height_limit.as_deref().and_then(resolve_height_limit),
            custom_resolutions: cli.custom,
            viewports: cli.viewports.iter().map(|key| key.to_lowercase()).collect(),
            max_scroll_rounds: cli.max_scroll_rounds,
            json: cli.json,
        })
    }

    /// Base URL without one trailing slash, followed by `path` verbatim.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.strip_suffix('/').unwrap_or(&self.base_url);
        format!("{}{}", base, path)
    }
}

/// Leading-integer read: optional whitespace and sign, then as many ASCII digits as
/// follow. `"50ms"` is 50, `"ms50"` is nothing.
pub fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn resolve_timeout(value: Option<&str>) -> u64 {
    match value.and_then(leading_int) {
        None | Some(0) => DEFAULT_TIMEOUT_MS,
        Some(ms) => ms.max(0) as u64,
    }
}

fn resolve_height_limit(value: &str) -> Option<u32> {
    leading_int(value)
        .filter(|px| *px > 0)
        .and_then(|px| u32::try_from(px).ok())
}
