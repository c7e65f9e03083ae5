use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{
    error::ConfigError,
    follower::{DEFAULT_WAIT, FollowerOptions},
    metrics::FollowerMetrics,
};

/// Follower settings as read from a configuration file.
///
/// ```json
/// { "start_after": 0, "caught_up": false, "doc_type": "article", "wait_ms": 10000, "label": "indexer" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FollowerConfig {
    pub start_after: i64,
    pub caught_up: bool,
    pub doc_type: Option<String>,
    pub wait_ms: i64,
    pub label: Option<String>,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            start_after: 0,
            caught_up: false,
            doc_type: None,
            wait_ms: i64::try_from(DEFAULT_WAIT.as_millis()).unwrap_or(i64::MAX),
            label: None,
        }
    }
}

impl FollowerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validates the config and builds options reporting to `metrics`.
    pub fn into_options(
        self,
        metrics: Arc<dyn FollowerMetrics>,
    ) -> Result<FollowerOptions, ConfigError> {
        let options = FollowerOptions::try_from(self)?;
        Ok(options.with_shared_metrics(metrics))
    }
}

impl TryFrom<FollowerConfig> for FollowerOptions {
    type Error = ConfigError;

    fn try_from(config: FollowerConfig) -> Result<Self, Self::Error> {
        if config.wait_ms < 0 {
            return Err(ConfigError::NegativeWait {
                wait_ms: config.wait_ms,
            });
        }
        if config.start_after < 0 {
            return Err(ConfigError::InvalidStartPosition {
                start_after: config.start_after,
            });
        }

        let wait = Duration::from_millis(config.wait_ms.unsigned_abs());
        let mut options = FollowerOptions::default()
            .with_start_after(config.start_after)
            .with_caught_up(config.caught_up)
            .with_wait(wait);
        if let Some(doc_type) = config.doc_type {
            options = options.with_doc_type(doc_type);
        }
        if let Some(label) = config.label {
            options = options.with_label(label);
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;

    #[test]
    fn parses_full_config() {
        let config = FollowerConfig::from_json_str(
            r#"{"start_after": 120, "caught_up": true, "doc_type": "article", "wait_ms": 2500, "label": "indexer"}"#,
        )
        .unwrap();

        let options = config.into_options(Arc::new(NoopMetrics)).unwrap();
        assert_eq!(options.start_after, 120);
        assert!(options.caught_up);
        assert_eq!(options.doc_type.as_deref(), Some("article"));
        assert_eq!(options.wait, Duration::from_millis(2500));
        assert_eq!(options.label.as_deref(), Some("indexer"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = FollowerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FollowerConfig::default());

        let options = FollowerOptions::try_from(config).unwrap();
        assert_eq!(options.wait, DEFAULT_WAIT);
        assert_eq!(options.label, None);
        assert_eq!(options.doc_type, None);
    }

    #[test]
    fn empty_doc_type_means_no_filter() {
        let config = FollowerConfig::from_json_str(r#"{"doc_type": ""}"#).unwrap();
        let options = FollowerOptions::try_from(config).unwrap();
        assert_eq!(options.doc_type, None);
    }

    #[test]
    fn rejects_negative_wait() {
        let config = FollowerConfig::from_json_str(r#"{"wait_ms": -5}"#).unwrap();
        let err = FollowerOptions::try_from(config).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeWait { wait_ms: -5 }));
    }

    #[test]
    fn rejects_negative_start() {
        let config = FollowerConfig::from_json_str(r#"{"start_after": -1}"#).unwrap();
        let err = FollowerOptions::try_from(config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidStartPosition { start_after: -1 }
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = FollowerConfig::from_json_str(r#"{"wait": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
