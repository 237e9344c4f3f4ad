//! Runtime configuration for stepwise-bdd.
//!
//! [`Configuration`] bundles the collaborators injected into feature runners.
//! [`Configuration::from_env`], which also backs `Default`, reports progress
//! through the `log` facade when `STEPWISE_BDD_PROGRESS_LOG` is truthy or
//! [`set_progress_logging`] forces it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::execution::{StatusMapper, default_status_mapper};
use crate::metadata::{DefaultMetadataProvider, MetadataProvider};
use crate::notify::{LoggingProgressNotifier, NoProgressNotifier, ProgressNotifier};

/// Environment variable enabling progress logging.
pub const PROGRESS_LOG_ENV: &str = "STEPWISE_BDD_PROGRESS_LOG";

/// In-process choice taking precedence over [`PROGRESS_LOG_ENV`].
static FORCED_PROGRESS_LOGGING: RwLock<Option<bool>> = RwLock::new(None);

const TRUTHY: &[&str] = &["1", "true", "yes", "on"];
const FALSY: &[&str] = &["0", "false", "no", "off"];

fn flag_value(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    let matches = |words: &[&str]| words.iter().any(|word| raw.eq_ignore_ascii_case(word));
    if matches(TRUTHY) {
        Some(true)
    } else if matches(FALSY) {
        Some(false)
    } else {
        None
    }
}

/// Force progress logging on or off for this process.
///
/// `None` hands the decision back to [`PROGRESS_LOG_ENV`].
pub fn set_progress_logging(enabled: Option<bool>) {
    *FORCED_PROGRESS_LOGGING
        .write()
        .unwrap_or_else(PoisonError::into_inner) = enabled;
}

/// Whether [`Configuration::from_env`] installs the logging notifier.
///
/// Unset or unparsable environment values count as off.
#[must_use]
pub fn progress_logging() -> bool {
    let forced = *FORCED_PROGRESS_LOGGING
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    forced
        .or_else(|| {
            std::env::var(PROGRESS_LOG_ENV)
                .ok()
                .and_then(|raw| flag_value(&raw))
        })
        .unwrap_or(false)
}

/// Collaborators used by feature runners and the executors they drive.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stepwise_bdd::{Configuration, ExecutionStatus, NoProgressNotifier, StepError};
///
/// let config = Configuration::default()
///     .with_notifier(Arc::new(NoProgressNotifier))
///     .with_status_mapper(Arc::new(|_: &StepError| ExecutionStatus::Failed));
/// let _ = config.metadata();
/// ```
#[derive(Clone)]
pub struct Configuration {
    notifier: Arc<dyn ProgressNotifier>,
    metadata: Arc<dyn MetadataProvider>,
    status_mapper: StatusMapper,
}

impl Configuration {
    /// Default collaborators, logging progress when [`progress_logging`] is
    /// on and staying silent otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        let notifier: Arc<dyn ProgressNotifier> = if progress_logging() {
            Arc::new(LoggingProgressNotifier)
        } else {
            Arc::new(NoProgressNotifier)
        };
        Self {
            notifier,
            metadata: Arc::new(DefaultMetadataProvider::new()),
            status_mapper: default_status_mapper(),
        }
    }

    /// Replace the progress notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ProgressNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the metadata provider.
    #[must_use]
    pub fn with_metadata_provider(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the status mapper.
    #[must_use]
    pub fn with_status_mapper(mut self, status_mapper: StatusMapper) -> Self {
        self.status_mapper = status_mapper;
        self
    }

    /// The progress notifier.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn ProgressNotifier> {
        &self.notifier
    }

    /// The metadata provider.
    #[must_use]
    pub fn metadata(&self) -> &Arc<dyn MetadataProvider> {
        &self.metadata
    }

    /// The status mapper.
    #[must_use]
    pub fn status_mapper(&self) -> &StatusMapper {
        &self.status_mapper
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;

    #[test]
    #[serial]
    fn unset_environment_means_silent() {
        set_progress_logging(None);
        if std::env::var_os(PROGRESS_LOG_ENV).is_none() {
            assert!(!progress_logging());
        }
    }

    #[test]
    #[serial]
    fn forced_choice_wins_until_cleared() {
        set_progress_logging(Some(true));
        assert!(progress_logging());
        let _logging = Configuration::from_env();
        set_progress_logging(Some(false));
        assert!(!progress_logging());
        set_progress_logging(None);
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case(" ON ", Some(true))]
    #[case("Yes", Some(true))]
    #[case("TRUE", Some(true))]
    #[case("0", Some(false))]
    #[case("False", Some(false))]
    #[case("off", Some(false))]
    #[case("NO", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn flag_values(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(flag_value(raw), expected);
    }
}
