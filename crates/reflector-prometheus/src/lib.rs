//! Prometheus metrics backend for the metadata reflector.
//!
//! This crate provides a [`PrometheusMetrics`] implementation of [`reflector_core::metrics::MetricsBackend`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use reflector_prometheus::PrometheusMetrics;
//! use reflector_core::ReflectContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = ReflectContext::default().with_metrics(Arc::new(metrics.clone()));
//!
//! // Expose `metrics.render()?` from your application's HTTP server.
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `metadata_reflector_parents_matching_selector{selector}` - Gauge
//! - `metadata_reflector_reconciles_total{outcome}` - Counter
//!
//! This crate does NOT provide an HTTP server for the `/metrics` endpoint.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
