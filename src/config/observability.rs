// ABOUTME: Distributed tracing configuration: exporter key, endpoint and sampling rate
// ABOUTME: The exporter key stays a raw string so unknown values degrade at startup instead of failing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use super::{env_parse_or, env_var_opt, env_var_or};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Tracing exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Master switch for span export
    pub enable_tracing: bool,
    /// `service.name` resource attribute
    pub service_name: String,
    /// Exporter key: `none`, `console`, `otlp`, `gcp` or `aws`
    pub exporter_type: String,
    /// Collector endpoint, each remote exporter has its own default
    pub exporter_endpoint: Option<String>,
    /// Required by the `gcp` exporter
    pub gcp_project_id: Option<String>,
    /// Fraction of root traces sampled, `0.0..=1.0`
    pub trace_sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_tracing: false,
            service_name: "tributum".into(),
            exporter_type: "console".into(),
            exporter_endpoint: None,
            gcp_project_id: None,
            trace_sample_rate: 1.0,
        }
    }
}

impl ObservabilityConfig {
    /// Load from `OBSERVABILITY_CONFIG__*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if the switch or the sample rate cannot be parsed
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enable_tracing: env_parse_or(
                "OBSERVABILITY_CONFIG__ENABLE_TRACING",
                defaults.enable_tracing,
            )?,
            service_name: env_var_or("OBSERVABILITY_CONFIG__SERVICE_NAME", &defaults.service_name),
            exporter_type: env_var_or(
                "OBSERVABILITY_CONFIG__EXPORTER_TYPE",
                &defaults.exporter_type,
            )
            .trim()
            .to_lowercase(),
            exporter_endpoint: env_var_opt("OBSERVABILITY_CONFIG__EXPORTER_ENDPOINT"),
            gcp_project_id: env_var_opt("OBSERVABILITY_CONFIG__GCP_PROJECT_ID"),
            trace_sample_rate: env_parse_or(
                "OBSERVABILITY_CONFIG__TRACE_SAMPLE_RATE",
                defaults.trace_sample_rate,
            )?,
        })
    }
}
