//! Tracing setup for the Yoda retrieval service.
//!
//! This crate provides:
//! - One-call subscriber initialisation with an env-filter and text or JSON output
//! - Optional OTLP span export over gRPC
//! - An in-memory span capture layer for asserting on instrumentation in tests

mod capture;
mod init;

pub use capture::{CapturedSpan, SpanCapture};
pub use init::{
    LogFormat, TelemetryConfig, TelemetryError, env_filter, init_telemetry, shutdown_telemetry,
};
