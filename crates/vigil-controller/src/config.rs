//! Configuration for the transition observer

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_observability::{MetricsRegistry, TracingConfig};

use crate::error::ObserverResult;

/// Observer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Delay before a resource is observed again, in seconds
    #[serde(default = "default_requeue_interval")]
    pub requeue_interval_secs: u64,

    /// Maximum concurrent reconciles in [`reconcile_many`](crate::TransitionObserver::reconcile_many)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_reconciles: usize,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            requeue_interval_secs: default_requeue_interval(),
            max_concurrent_reconciles: default_max_concurrent(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prefix of every metric name
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Mirror every write into the shared families labelled by group and kind
    #[serde(default)]
    pub legacy_metrics: bool,

    /// Resource label keys copied onto per-kind metrics
    #[serde(default)]
    pub label_projection: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            legacy_metrics: false,
            label_projection: Vec::new(),
        }
    }
}

impl MetricsConfig {
    /// A fresh registry whose metric names are prefixed with the configured
    /// namespace.
    pub fn registry(&self) -> ObserverResult<MetricsRegistry> {
        Ok(MetricsRegistry::with_namespace(&self.namespace)?)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Subscriber settings for a service using this configuration
    pub fn tracing_config(&self, service_name: impl Into<String>) -> TracingConfig {
        let config = TracingConfig::new(service_name).with_log_level(self.level.clone());
        if self.json {
            config.with_json_format()
        } else {
            config
        }
    }
}

// Default value helpers
fn default_requeue_interval() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    10
}

fn default_namespace() -> String {
    vigil_observability::metrics::DEFAULT_NAMESPACE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ObserverConfig {
    /// Load configuration from defaults, an optional file and `VIGIL_`
    /// environment variables, in that order of precedence. Nested keys use
    /// a double underscore: `VIGIL_METRICS__LEGACY_METRICS=true`.
    pub fn load(path: Option<&str>) -> ObserverResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&ObserverConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("VIGIL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("metrics.label_projection")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn with_requeue_interval(mut self, interval: Duration) -> Self {
        self.requeue_interval_secs = interval.as_secs();
        self
    }

    pub fn with_max_concurrent_reconciles(mut self, limit: usize) -> Self {
        self.max_concurrent_reconciles = limit;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metrics.namespace = namespace.into();
        self
    }

    pub fn with_legacy_metrics(mut self, enabled: bool) -> Self {
        self.metrics.legacy_metrics = enabled;
        self
    }

    pub fn with_label_projection<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics.label_projection = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }
}
