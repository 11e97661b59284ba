//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.devtalk.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `DEVTALK_*`, plus `GITHUB_TOKEN` as a last
//!    resort for the token
//! 4. **Command-line arguments** – `--repos-file`, `--data-types`, ...
//!
//! # Configuration File
//!
//! ```toml
//! repos_file = "repos.txt"
//! data_types = "issues,pull_requests"
//! output_dir = "data"
//! token_file = "~/.config/devtalk/token"
//! page_size = 50
//! workers = 4
//! ```

use std::env;
use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawl::budget::{BudgetSettings, DEFAULT_SAFETY_MARGIN};
use crate::crawl::retry::{
    DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_BACKOFF_MS, RetryConfig,
};
use crate::crawl::walker::{DEFAULT_COMMENT_PAGE_SIZE, DEFAULT_PAGE_SIZE, WalkSettings};
use crate::error::DevtalkError;
use crate::github::locator::{PersonalAccessToken, TargetList};
use crate::github::models::EntityKind;

/// Default GitHub REST/GraphQL API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data";
/// GitHub's largest page size for connections.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Command selected by the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Crawl the configured repositories into CSV tables.
    Download,
    /// Remove tables for the selected data types.
    Delete,
    /// Show the token's current GraphQL rate limit.
    RateLimit,
    /// Summarise tables already on disk.
    Info,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// Every field maps to `DEVTALK_<FIELD>`, for example `DEVTALK_REPOS_FILE` or
/// `DEVTALK_TOKEN`. Boolean command selectors are CLI or file only.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "DEVTALK",
    discovery(
        dotfile_name = ".devtalk.toml",
        config_file_name = "devtalk.toml",
        app_name = "devtalk"
    )
)]
pub struct DevtalkConfig {
    /// File listing one repository per line (`owner/name` or a GitHub URL).
    #[ortho_config(cli_short = 'f')]
    pub repos_file: Option<String>,

    /// Repositories given inline, separated by commas or whitespace.
    #[ortho_config(cli_short = 'r')]
    pub repos: Option<String>,

    /// Data types to crawl: `issues`, `pull_requests`, `commits`, or `all`,
    /// comma separated.
    #[ortho_config(cli_short = 'd')]
    pub data_types: String,

    /// Directory receiving the CSV tables.
    #[ortho_config(cli_short = 'o')]
    pub output_dir: String,

    /// Personal access token for GitHub API authentication.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// File whose first line holds the personal access token.
    #[ortho_config()]
    pub token_file: Option<String>,

    /// API root; GraphQL requests go to `<api_base>/graphql`.
    #[ortho_config()]
    pub api_base: String,

    /// Entities per page (1-100).
    #[ortho_config()]
    pub page_size: u32,

    /// Comments per page (1-100).
    #[ortho_config()]
    pub comment_page_size: u32,

    /// Retries after the first attempt for transient failures.
    #[ortho_config()]
    pub max_retries: usize,

    /// Initial backoff delay in milliseconds.
    #[ortho_config()]
    pub min_backoff_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[ortho_config()]
    pub max_backoff_ms: u64,

    /// Rate limit points held back before pausing for the reset.
    #[ortho_config()]
    pub safety_margin: u32,

    /// Cap on top-level pages per pair.
    #[ortho_config()]
    pub max_pages: Option<usize>,

    /// Cap on follow-up comment pages per entity.
    #[ortho_config()]
    pub max_comment_pages: Option<usize>,

    /// Pairs crawled concurrently; all workers share one rate budget.
    #[ortho_config(cli_short = 'w')]
    pub workers: usize,

    /// Writes crawl telemetry events to stderr as JSON lines.
    #[ortho_config()]
    pub telemetry: bool,

    /// Deletes the tables of the selected data types and exits.
    #[ortho_config()]
    pub delete: bool,

    /// Prints the token's current rate limit and exits.
    #[ortho_config()]
    pub rate_limit: bool,

    /// Prints table statistics for the selected data types and exits.
    #[ortho_config()]
    pub info: bool,
}

impl Default for DevtalkConfig {
    fn default() -> Self {
        Self {
            repos_file: None,
            repos: None,
            data_types: "all".to_owned(),
            output_dir: DEFAULT_OUTPUT_DIR.to_owned(),
            token: None,
            token_file: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            comment_page_size: DEFAULT_COMMENT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            min_backoff_ms: DEFAULT_MIN_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            max_pages: None,
            max_comment_pages: None,
            workers: 1,
            telemetry: false,
            delete: false,
            rate_limit: false,
            info: false,
        }
    }
}

impl DevtalkConfig {
    /// Determines the command from the selector flags; downloading is the
    /// default.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.delete {
            OperationMode::Delete
        } else if self.rate_limit {
            OperationMode::RateLimit
        } else if self.info {
            OperationMode::Info
        } else {
            OperationMode::Download
        }
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DevtalkError::Configuration`] when more than one command is
    /// selected, a page size is outside 1-100, the backoff bounds are
    /// inverted, or no workers are requested.
    pub fn validate(&self) -> Result<(), DevtalkError> {
        let selected = [self.delete, self.rate_limit, self.info]
            .iter()
            .filter(|flag| **flag)
            .count();
        if selected > 1 {
            return Err(configuration(
                "choose at most one of --delete, --rate-limit, --info",
            ));
        }
        for (name, size) in [
            ("page_size", self.page_size),
            ("comment_page_size", self.comment_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(configuration(&format!(
                    "{name} must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }
        if self.min_backoff_ms > self.max_backoff_ms {
            return Err(configuration(
                "min_backoff_ms must not exceed max_backoff_ms",
            ));
        }
        if self.workers == 0 {
            return Err(configuration("workers must be at least 1"));
        }
        Ok(())
    }

    /// Resolves the token from `token`, then `token_file`, then the
    /// `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`DevtalkError::TokenFile`] when the token file cannot be read
    /// or its first line is blank, and [`DevtalkError::MissingToken`] when no
    /// source provides a value.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, DevtalkError> {
        if let Some(token) = self.token.as_deref().and_then(PersonalAccessToken::new) {
            return Ok(token);
        }
        if let Some(path) = &self.token_file {
            return read_token_file(Utf8Path::new(path));
        }
        env::var("GITHUB_TOKEN")
            .ok()
            .and_then(PersonalAccessToken::new)
            .ok_or(DevtalkError::MissingToken)
    }

    /// Parses the selected data types.
    ///
    /// # Errors
    ///
    /// Returns [`DevtalkError::Configuration`] for an unknown data type.
    pub fn entity_kinds(&self) -> Result<Vec<EntityKind>, DevtalkError> {
        EntityKind::parse_selection(&self.data_types)
            .map_err(|error| configuration(&error.to_string()))
    }

    /// Reads the repository list from `repos_file` and `repos`.
    ///
    /// Malformed entries are kept in [`TargetList::invalid`] rather than
    /// failing the whole list.
    ///
    /// # Errors
    ///
    /// Returns [`DevtalkError::Configuration`] when neither source is set and
    /// [`DevtalkError::Io`] when the file cannot be read.
    pub fn load_targets(&self) -> Result<TargetList, DevtalkError> {
        if self.repos_file.is_none() && self.repos.is_none() {
            return Err(configuration(
                "no repositories given (use --repos-file or --repos)",
            ));
        }

        let mut lines = String::new();
        if let Some(path) = &self.repos_file {
            lines = read_text_file(Utf8Path::new(path)).map_err(|error| DevtalkError::Io {
                message: format!("failed to read repository list '{path}': {error}"),
            })?;
        }
        if let Some(inline) = &self.repos {
            for entry in inline.split([',', ' ', '\t', '\n']).filter(|e| !e.is_empty()) {
                lines.push('\n');
                lines.push_str(entry);
            }
        }

        Ok(TargetList::parse_lines(&lines))
    }

    /// Output directory as a UTF-8 path.
    #[must_use]
    pub fn output_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.output_dir)
    }

    /// Parses the API root.
    ///
    /// # Errors
    ///
    /// Returns [`DevtalkError::Configuration`] when `api_base` is not a URL.
    pub fn api_base_url(&self) -> Result<Url, DevtalkError> {
        Url::parse(&self.api_base).map_err(|error| {
            configuration(&format!("api_base '{}' is invalid: {error}", self.api_base))
        })
    }

    /// Walker settings derived from the page, cap, and backoff options.
    #[must_use]
    pub const fn walk_settings(&self) -> WalkSettings {
        WalkSettings {
            page_size: self.page_size,
            comment_page_size: self.comment_page_size,
            max_pages: self.max_pages,
            max_comment_pages: self.max_comment_pages,
            retry: RetryConfig::new(
                Duration::from_millis(self.min_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
                self.max_retries,
            ),
        }
    }

    /// Rate budget settings with the configured safety margin.
    #[must_use]
    pub fn budget_settings(&self) -> BudgetSettings {
        BudgetSettings {
            safety_margin: self.safety_margin,
            ..BudgetSettings::default()
        }
    }
}

fn configuration(message: &str) -> DevtalkError {
    DevtalkError::Configuration {
        message: message.to_owned(),
    }
}

fn read_token_file(path: &Utf8Path) -> Result<PersonalAccessToken, DevtalkError> {
    let token_file_error = |message: String| DevtalkError::TokenFile {
        path: path.to_string(),
        message,
    };
    let contents = read_text_file(path).map_err(|error| token_file_error(error.to_string()))?;
    contents
        .lines()
        .next()
        .and_then(PersonalAccessToken::new)
        .ok_or_else(|| token_file_error("first line is empty".to_owned()))
}

/// Reads a whole UTF-8 file through a capability handle on its parent.
fn read_text_file(path: &Utf8Path) -> io::Result<String> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("'{path}' has no file name"))
    })?;
    Dir::open_ambient_dir(parent, ambient_authority())?.read_to_string(file_name)
}

#[cfg(test)]
mod tests;
