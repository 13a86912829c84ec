use std::fmt;
use std::str::FromStr;

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt as tracing_fmt};

/// Console log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::InvalidFormat(other.to_string())),
        }
    }
}

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log format name is not recognised.
    #[error("unknown log format '{0}', expected 'text' or 'json'")]
    InvalidFormat(String),

    /// The filter directive could not be parsed.
    #[error("invalid filter directive: {0}")]
    InvalidDirective(#[from] tracing_subscriber::filter::ParseError),

    /// The OTLP exporter could not be built.
    #[error("failed to install OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialised: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Settings for [`init_telemetry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Reported as the OpenTelemetry `service.name` resource.
    pub service_name: String,
    /// Console output format.
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `yoda_rag=debug`.
    pub default_directive: String,
    /// OTLP gRPC endpoint such as `http://localhost:4317`; `None` disables export.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "yoda".to_string(),
            format: LogFormat::Text,
            default_directive: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl TelemetryConfig {
    /// Create a config for the named service with default settings.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into(), ..Self::default() }
    }

    /// Set the console output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the filter used when `RUST_LOG` is unset.
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Export spans to an OTLP collector.
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }
}

/// Build the event filter: `RUST_LOG` if set, otherwise `default_directive`.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_directive)?),
    }
}

fn otlp_tracer(
    service_name: &str,
    endpoint: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, TelemetryError> {
    let resource = Resource::new(vec![KeyValue::new("service.name", service_name.to_string())]);
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(resource))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;
    Ok(tracer)
}

/// Install the global tracing subscriber.
///
/// OTLP export uses a batch processor on the Tokio runtime, so call this from
/// inside a runtime when `otlp_endpoint` is set. Call [`shutdown_telemetry`]
/// before exit to flush pending spans.
///
/// # Errors
///
/// Fails if the filter directive is invalid, the exporter cannot be built, or
/// a global subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(&config.default_directive)?;

    let console: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Text => tracing_fmt::layer().with_target(true).boxed(),
        LogFormat::Json => tracing_fmt::layer().json().with_current_span(true).boxed(),
    };

    let otel = match &config.otlp_endpoint {
        Some(endpoint) => {
            let tracer = otlp_tracer(&config.service_name, endpoint)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry().with(console).with(otel).with(filter).try_init()?;

    tracing::debug!(
        service = %config.service_name,
        format = %config.format,
        otlp = config.otlp_endpoint.is_some(),
        "telemetry initialised"
    );
    Ok(())
}

/// Flush and shut down the global OTLP tracer provider. A no-op without export.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
