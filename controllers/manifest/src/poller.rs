//! Convergence poller
//!
//! After a mutation lands, repeatedly reads the resource and classifies it
//! until the classifier reports a terminal verdict or the retry budget runs
//! out:
//!
//! ```text
//! Waiting --(initial get delay)--> Polling --+--> Succeeded
//!                                            +--> Failed (verdict Failed, or budget exhausted)
//!                                            +--> Aborted (cancellation)
//! ```
//!
//! Fetch errors, classification errors, not-found (outside deletion) and
//! not-yet-ready verdicts are all transient. The last error is kept so it
//! can be reported when the budget runs out.

use crate::backoff::ExponentialBackoff;
use crate::error::ControllerError;
use kstatus::{Classifier, Reason};
use manifest_client::{ManifestClientTrait, ResourceIdentity};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default number of fetch attempts
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default delay after the first attempt
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Default backoff multiplier
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
/// Default settle delay before the first fetch
pub const DEFAULT_INITIAL_GET_DELAY: Duration = Duration::from_millis(500);

/// Retry parameters for one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts
    pub max_retries: u32,
    /// Delay after attempt 0; later delays grow by `backoff_factor`
    pub initial_delay: Duration,
    /// Multiplier between consecutive delays
    pub backoff_factor: f64,
    /// Settle delay before the first fetch, so the read does not race the
    /// write that preceded it
    pub initial_get_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            initial_get_delay: DEFAULT_INITIAL_GET_DELAY,
        }
    }
}

impl RetryConfig {
    /// Set the number of fetch attempts
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay after the first attempt
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set the multiplier between delays. A negative or NaN factor disables
    /// the sleeps between attempts.
    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Set the settle delay before the first fetch
    #[must_use]
    pub fn with_initial_get_delay(mut self, initial_get_delay: Duration) -> Self {
        self.initial_get_delay = initial_get_delay;
        self
    }

    /// Longest a poll can sleep in total: the settle delay plus one backoff
    /// per attempt
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        (0..self.max_retries).fold(self.initial_get_delay, |total, attempt| {
            total.saturating_add(ExponentialBackoff::calculate_for_attempt(
                attempt,
                self.initial_delay,
                self.backoff_factor,
            ))
        })
    }
}

/// Why a poll ended in failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollFailure {
    /// The resource's controller reported a terminal failure
    #[error("{identity} failed: {message}")]
    Terminal {
        identity: ResourceIdentity,
        /// Message of the failed verdict
        message: String,
    },

    /// Every attempt ran without a terminal verdict
    #[error(
        "{identity} did not become ready after {attempts} attempts: {}",
        .last_error.as_deref().unwrap_or("still in progress")
    )]
    Exhausted {
        identity: ResourceIdentity,
        /// Fetches made before giving up
        attempts: u32,
        /// Most recent fetch or classification error, if any
        last_error: Option<String>,
    },
}

/// How a poll ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ready, or gone for a deletion
    Succeeded,
    /// Terminal failure or exhausted budget
    Failed(PollFailure),
    /// Cancelled before a terminal verdict; not a failure of the resource
    Aborted,
}

/// Final snapshot (if any was read) and outcome of a poll
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    /// Last object read; `None` after a completed deletion or if no read
    /// succeeded
    pub snapshot: Option<Value>,
    pub outcome: Outcome,
}

impl PollResult {
    fn new(snapshot: Option<Value>, outcome: Outcome) -> Self {
        Self { snapshot, outcome }
    }

    /// Whether the resource converged (or is gone, for a deletion)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }

    /// The final snapshot on success, otherwise the matching error
    pub fn into_result(self, identity: &ResourceIdentity) -> Result<Option<Value>, ControllerError> {
        match self.outcome {
            Outcome::Succeeded => Ok(self.snapshot),
            Outcome::Failed(failure) => Err(ControllerError::ConvergenceFailed(failure)),
            Outcome::Aborted => Err(ControllerError::Aborted(identity.to_string())),
        }
    }
}

/// Waits for resources to converge.
///
/// Holds no per-poll state; one poller can serve concurrent polls.
pub struct ConvergencePoller {
    client: Arc<dyn ManifestClientTrait>,
    classifier: Classifier,
    config: RetryConfig,
}

impl ConvergencePoller {
    /// Poller using the built-in classification rules
    pub fn new(client: Arc<dyn ManifestClientTrait>, config: RetryConfig) -> Self {
        Self {
            client,
            classifier: Classifier::default(),
            config,
        }
    }

    /// Replace the classifier (custom registry)
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Poll with the default retry parameters
    pub async fn poll_until_converged(
        &self,
        identity: &ResourceIdentity,
        is_deletion: bool,
        cancel: &CancellationToken,
    ) -> PollResult {
        self.poll_with_config(identity, is_deletion, &self.config, cancel)
            .await
    }

    /// Poll with retry parameters for this call only.
    ///
    /// With `is_deletion`, a not-found read is success; otherwise it is
    /// retried, since a fresh object may not be visible yet.
    pub async fn poll_with_config(
        &self,
        identity: &ResourceIdentity,
        is_deletion: bool,
        config: &RetryConfig,
        cancel: &CancellationToken,
    ) -> PollResult {
        let mut snapshot = None;
        let mut last_error: Option<String> = None;
        let mut backoff = ExponentialBackoff::new(config.initial_delay, config.backoff_factor);

        if !sleep_unless_cancelled(config.initial_get_delay, cancel).await {
            return PollResult::new(snapshot, Outcome::Aborted);
        }

        for attempt in 0..config.max_retries {
            let fetched = tokio::select! {
                () = cancel.cancelled() => return PollResult::new(snapshot, Outcome::Aborted),
                fetched = self.client.get(identity) => fetched,
            };

            match fetched {
                Err(e) if is_deletion && e.is_not_found() => {
                    info!("{} is deleted", identity);
                    return PollResult::new(None, Outcome::Succeeded);
                }
                Err(e) => {
                    debug!("Failed to fetch {}: {}", identity, e);
                    last_error = Some(e.to_string());
                }
                Ok(object) => {
                    let verdict = self.classifier.classify(&object);
                    snapshot = Some(object);
                    match verdict {
                        Err(e) => {
                            warn!("Failed to classify {}: {}", identity, e);
                            last_error = Some(e.to_string());
                        }
                        Ok(verdict) if verdict.reason() == Reason::Failed => {
                            warn!("{} failed: {}", identity, verdict.message());
                            let failure = PollFailure::Terminal {
                                identity: identity.clone(),
                                message: verdict.message().to_string(),
                            };
                            return PollResult::new(snapshot, Outcome::Failed(failure));
                        }
                        Ok(verdict)
                            if verdict.reason() == Reason::NoStatusInfo
                                && attempt < config.max_retries.saturating_sub(2) =>
                        {
                            // Status may not have been published yet
                            debug!("No status info for {} yet", identity);
                        }
                        Ok(verdict) if verdict.is_true() => {
                            info!("{} is ready: {}", identity, verdict);
                            return PollResult::new(snapshot, Outcome::Succeeded);
                        }
                        Ok(verdict) => {
                            debug!("{} not ready: {}", identity, verdict);
                        }
                    }
                }
            }

            let delay = backoff.next_backoff();
            info!(
                "Waiting for {}: retrying in {:?} (attempt {}/{})",
                identity,
                delay,
                attempt + 1,
                config.max_retries
            );
            if !sleep_unless_cancelled(delay, cancel).await {
                return PollResult::new(snapshot, Outcome::Aborted);
            }
        }

        let failure = PollFailure::Exhausted {
            identity: identity.clone(),
            attempts: config.max_retries,
            last_error,
        };
        warn!("{}", failure);
        PollResult::new(snapshot, Outcome::Failed(failure))
    }
}

/// Sleep for `duration`; false if cancelled first
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
