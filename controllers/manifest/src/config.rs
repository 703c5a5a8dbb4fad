//! Controller configuration
//!
//! Read once from environment variables at start-up. Invalid values are
//! rejected rather than replaced with defaults.

use crate::error::ControllerError;
use crate::poller::RetryConfig;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default overall deadline for a run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// What to do with each manifest document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestAction {
    /// Create if absent, update otherwise
    #[default]
    Apply,
    /// Create, failing if the resource already exists
    Create,
    /// Replace an existing resource
    Update,
    /// Delete and wait until the resource is gone
    Delete,
    /// Print current state and verdict without mutating
    Read,
    /// Print every resource of the document's kind, in its namespace if set
    List,
}

impl FromStr for ManifestAction {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apply" => Ok(Self::Apply),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "read" => Ok(Self::Read),
            "list" => Ok(Self::List),
            other => Err(ControllerError::InvalidConfig(format!(
                "MANIFEST_ACTION must be one of apply, create, update, delete, read, list (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for ManifestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apply => "apply",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Read => "read",
            Self::List => "list",
        })
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Multi-document YAML file to act on (`MANIFEST_PATH`)
    pub manifest_path: PathBuf,
    pub action: ManifestAction,
    /// Send mutations as server-side dry runs and skip waiting
    pub dry_run: bool,
    /// Convergence polling budget
    pub retry: RetryConfig,
    /// Deadline for the whole run; waits still pending when it passes are
    /// aborted
    pub timeout: Duration,
    /// Field manager recorded on writes (`FIELD_MANAGER`), if overridden
    pub field_manager: Option<String>,
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let manifest_path = lookup("MANIFEST_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                ControllerError::InvalidConfig(
                    "MANIFEST_PATH environment variable is required".to_string(),
                )
            })?;

        let action = lookup("MANIFEST_ACTION")
            .map(|action| action.parse::<ManifestAction>())
            .transpose()?
            .unwrap_or_default();

        let dry_run = parse_var(&lookup, "DRY_RUN")?.unwrap_or(false);

        let defaults = RetryConfig::default();
        let max_retries = parse_var(&lookup, "WAIT_MAX_RETRIES")?.unwrap_or(defaults.max_retries);
        let initial_delay = parse_var(&lookup, "WAIT_INITIAL_DELAY_MS")?
            .map_or(defaults.initial_delay, Duration::from_millis);
        let backoff_factor: f64 =
            parse_var(&lookup, "WAIT_BACKOFF_FACTOR")?.unwrap_or(defaults.backoff_factor);
        let initial_get_delay = parse_var(&lookup, "WAIT_INITIAL_GET_DELAY_MS")?
            .map_or(defaults.initial_get_delay, Duration::from_millis);
        let timeout = parse_var(&lookup, "WAIT_TIMEOUT_SECS")?
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        let field_manager = lookup("FIELD_MANAGER").filter(|name| !name.is_empty());

        if !backoff_factor.is_finite() || backoff_factor <= 0.0 {
            return Err(ControllerError::InvalidConfig(format!(
                "WAIT_BACKOFF_FACTOR must be a positive number (got {backoff_factor})"
            )));
        }

        Ok(Self {
            manifest_path,
            action,
            dry_run,
            retry: RetryConfig {
                max_retries,
                initial_delay,
                backoff_factor,
                initial_get_delay,
            },
            timeout,
            field_manager,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ControllerError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                ControllerError::InvalidConfig(format!("{key}={raw:?} is invalid: {e}"))
            })
        })
        .transpose()
}
