//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use yoda_rag::openai::OPENAI_API_BASE;
use yoda_rag::{
    ChunkingConfig, DEFAULT_COLLECTION, DEFAULT_DIMENSIONS, PipelineConfig, RetrieverConfig,
};
use yoda_telemetry::{LogFormat, TelemetryConfig};

/// Which confidence scorer the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfidenceMode {
    /// Constant 0.5 for every answer.
    Fixed,
    /// Keyword and shape heuristics.
    Heuristic,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

/// Yoda question-answering server.
///
/// Every flag can also be set through the environment variable shown in
/// `--help`; a `.env` file in the working directory is loaded first.
#[derive(Debug, Clone, Parser)]
#[command(name = "yoda-server", version, about)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "YODA_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, short, env = "YODA_PORT", default_value_t = 3000)]
    pub port: u16,

    /// OpenAI API key used for embeddings and chat completions.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "OPENAI_API_BASE", default_value = OPENAI_API_BASE)]
    pub openai_api_base: String,

    /// Embedding model name.
    #[arg(long, env = "YODA_EMBEDDING_MODEL", default_value = "text-embedding-3-large")]
    pub embedding_model: String,

    /// Embedding dimensionality; must match the collection.
    #[arg(long, env = "YODA_EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_DIMENSIONS)]
    pub embedding_dimensions: usize,

    /// Chat model used to generate answers.
    #[arg(long, env = "YODA_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,

    /// Qdrant gRPC URL. Without it documents are kept in memory.
    #[arg(long, env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Qdrant API key.
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    /// Vector collection name.
    #[arg(long, env = "YODA_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Confidence scoring strategy.
    #[arg(long, env = "YODA_CONFIDENCE", value_enum, default_value_t = ConfidenceMode::Fixed)]
    pub confidence: ConfidenceMode,

    /// Deadline for retrieval, in seconds.
    #[arg(long, env = "YODA_RETRIEVAL_TIMEOUT_SECS")]
    pub retrieval_timeout_secs: Option<u64>,

    /// Deadline for answer generation, in seconds.
    #[arg(long, env = "YODA_GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,

    /// Reload the lexical cache after every document upload.
    #[arg(long, env = "YODA_REFRESH_ON_INGEST")]
    pub refresh_on_ingest: bool,

    /// Console log format: `text` or `json`.
    #[arg(long, env = "YODA_LOG_FORMAT", default_value = "text", value_parser = parse_log_format)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint for span export.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        let config = TelemetryConfig::new("yoda-server").with_format(self.log_format);
        match &self.otlp_endpoint {
            Some(endpoint) => config.with_otlp_endpoint(endpoint.clone()),
            None => config,
        }
    }

    pub fn retriever_config(&self) -> yoda_rag::Result<RetrieverConfig> {
        RetrieverConfig::builder()
            .collection(self.collection.clone())
            .dimensions(self.embedding_dimensions)
            .build()
    }

    pub fn pipeline_config(&self) -> yoda_rag::Result<PipelineConfig> {
        let mut builder = PipelineConfig::builder();
        if let Some(secs) = self.retrieval_timeout_secs {
            builder = builder.retrieval_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.generation_timeout_secs {
            builder = builder.generation_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn chunking_config(&self) -> ChunkingConfig {
        ChunkingConfig::default()
    }
}
