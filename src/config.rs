use std::{path::PathBuf, time::Duration};

const ANALYZING_DELAY_VAR: &str = "FUNNEL_ANALYZING_DELAY_MS";
const CONTENT_PATH_VAR: &str = "FUNNEL_CONTENT_PATH";
const DEFAULT_ANALYZING_DELAY_MS: u64 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDelay { var: &'static str, value: String },
}

/// Runtime settings. The bot token itself is read by `Bot::from_env`
/// (`TELOXIDE_TOKEN`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Length of the "analyzing" pause before the result is shown.
    pub analyzing_delay: Duration,
    /// JSON deck replacing the built-in questions and diagnoses.
    pub content_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let analyzing_delay = match lookup(ANALYZING_DELAY_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDelay {
                    var: ANALYZING_DELAY_VAR,
                    value,
                })?,
            None => Duration::from_millis(DEFAULT_ANALYZING_DELAY_MS),
        };

        let content_path = lookup(CONTENT_PATH_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            analyzing_delay,
            content_path,
        })
    }
}
