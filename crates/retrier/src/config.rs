//! Configuration for building a [`Retrier`].
//!
//! [`RetryConfig`] is plain data: deserialize it from whatever format the
//! surrounding application uses, or load it from environment variables with
//! the `env` feature.

use crate::error::ConfigError;
use crate::retry::{BackoffPolicy, DEFAULT_MAX_ATTEMPTS, Retrier};
use serde::{Deserialize, Serialize};

/// Declarative description of a [`Retrier`].
///
/// The retry predicate is behaviour, not data, so a retrier built from a
/// config retries every error. Attach a predicate with
/// [`RetrierBuilder::retry_if`](crate::retry::RetrierBuilder::retry_if) when one is needed.
///
/// # Examples
///
/// ```rust
/// use retrier::config::RetryConfig;
///
/// let config: RetryConfig = serde_json::from_str(r#"{
///     "max_attempts": 5,
///     "backoff": { "kind": "exponential", "base_ms": 100, "factor": 2.0, "max_ms": 30000 }
/// }"#).unwrap();
///
/// let retrier = config.into_retrier().unwrap();
/// assert_eq!(retrier.max_attempts(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of attempts; zero means unbounded
    pub max_attempts: u32,

    /// Delay strategy between attempts
    pub backoff: BackoffPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryConfig {
    /// Check that every numeric setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a NaN jitter or a
    /// non-finite exponential factor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jitter = self.backoff.jitter();
        if jitter.is_nan() {
            return Err(ConfigError::invalid(
                "backoff.jitter",
                jitter,
                "jitter must be a number",
            ));
        }
        if let BackoffPolicy::Exponential(exp) = &self.backoff
            && !exp.factor().is_finite()
        {
            return Err(ConfigError::invalid(
                "backoff.factor",
                exp.factor(),
                "factor must be finite",
            ));
        }
        Ok(())
    }

    /// Validate the configuration and build a [`Retrier`] from it.
    ///
    /// # Errors
    ///
    /// See [`RetryConfig::validate`].
    pub fn into_retrier(self) -> Result<Retrier, ConfigError> {
        self.validate()?;
        Ok(Retrier::builder()
            .max_attempts(self.max_attempts)
            .backoff(self.backoff)
            .build())
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `RETRY_MAX_ATTEMPTS` for the attempt limit
    /// - `RETRY_BACKOFF` for the strategy: `fixed`, `linear` or `exponential`
    /// - `RETRY_INTERVAL_MS` for the fixed interval
    /// - `RETRY_BASE_MS`, `RETRY_STEP_MS`, `RETRY_MAX_MS` for linear/exponential
    /// - `RETRY_FACTOR` for the exponential multiplier
    /// - `RETRY_JITTER` for the jitter fraction
    ///
    /// Unset variables keep their defaults. Variables that do not apply to the
    /// selected strategy are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBackoff`] for an unrecognised `RETRY_BACKOFF`
    /// and [`ConfigError::InvalidValue`] for a variable that fails to parse.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        use crate::retry::{ExponentialBackoff, FixedBackoff, LinearBackoff};
        use std::time::Duration;

        let mut config = Self::default();

        if let Some(max_attempts) = env_parse::<u32>("RETRY_MAX_ATTEMPTS")? {
            config.max_attempts = max_attempts;
        }

        let millis = |key: &str| env_parse::<u64>(key).map(|v| v.map(Duration::from_millis));
        let jitter = env_parse::<f64>("RETRY_JITTER")?;

        let kind = std::env::var("RETRY_BACKOFF")
            .ok()
            .map(|kind| kind.trim().to_ascii_lowercase());

        config.backoff = match kind.as_deref() {
            Some("fixed") => {
                let mut backoff = FixedBackoff::default();
                if let Some(interval) = millis("RETRY_INTERVAL_MS")? {
                    backoff = FixedBackoff::new(interval);
                }
                if let Some(jitter) = jitter {
                    backoff = backoff.with_jitter(jitter);
                }
                backoff.into()
            }
            None | Some("linear") => {
                let mut builder = LinearBackoff::builder();
                if let Some(base) = millis("RETRY_BASE_MS")? {
                    builder = builder.base(base);
                }
                if let Some(step) = millis("RETRY_STEP_MS")? {
                    builder = builder.step(step);
                }
                if let Some(max) = millis("RETRY_MAX_MS")? {
                    builder = builder.max(max);
                }
                if let Some(jitter) = jitter {
                    builder = builder.jitter(jitter);
                }
                builder.build().into()
            }
            Some("exponential") => {
                let mut builder = ExponentialBackoff::builder();
                if let Some(base) = millis("RETRY_BASE_MS")? {
                    builder = builder.base(base);
                }
                if let Some(factor) = env_parse::<f64>("RETRY_FACTOR")? {
                    builder = builder.factor(factor);
                }
                if let Some(max) = millis("RETRY_MAX_MS")? {
                    builder = builder.max(max);
                }
                if let Some(jitter) = jitter {
                    builder = builder.jitter(jitter);
                }
                builder.build().into()
            }
            Some(other) => return Err(ConfigError::UnknownBackoff(other.to_string())),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "env")]
fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, &raw, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Serde adapter storing a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
