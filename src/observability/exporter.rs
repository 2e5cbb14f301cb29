// ABOUTME: Pure selection of the trace exporter from configuration
// ABOUTME: Unmet prerequisites surface as ExporterError values for the caller to degrade on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

use crate::config::ObservabilityConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default OTLP gRPC collector endpoint
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Default Google Cloud Trace OTLP endpoint
pub const DEFAULT_GCP_ENDPOINT: &str = "https://telemetry.googleapis.com";

/// Default AWS Distro for OpenTelemetry collector endpoint
pub const DEFAULT_AWS_ENDPOINT: &str = "http://localhost:4317";

/// Exporter backends selectable by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterType {
    /// No export
    None,
    /// Spans printed to stdout
    Console,
    /// Generic OTLP gRPC collector
    Otlp,
    /// Google Cloud Trace
    Gcp,
    /// AWS X-Ray through an ADOT collector
    Aws,
}

impl ExporterType {
    /// Configuration key for this exporter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Console => "console",
            Self::Otlp => "otlp",
            Self::Gcp => "gcp",
            Self::Aws => "aws",
        }
    }
}

impl fmt::Display for ExporterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterType {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "disabled" => Ok(Self::None),
            "console" | "stdout" => Ok(Self::Console),
            "otlp" => Ok(Self::Otlp),
            "gcp" => Ok(Self::Gcp),
            "aws" => Ok(Self::Aws),
            other => Err(ExporterError::UnknownExporter(other.to_owned())),
        }
    }
}

/// Resolved exporter with every prerequisite satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterPlan {
    /// Tracing off
    Disabled,
    /// Stdout exporter
    Console,
    /// OTLP exporter
    Otlp {
        /// Collector endpoint
        endpoint: String,
    },
    /// Google Cloud Trace over OTLP
    Gcp {
        /// Project the spans are billed to
        project_id: String,
        /// Collector endpoint
        endpoint: String,
    },
    /// AWS X-Ray over OTLP
    Aws {
        /// Collector endpoint
        endpoint: String,
    },
}

impl ExporterPlan {
    /// Backend this plan exports to
    #[must_use]
    pub const fn exporter_type(&self) -> ExporterType {
        match self {
            Self::Disabled => ExporterType::None,
            Self::Console => ExporterType::Console,
            Self::Otlp { .. } => ExporterType::Otlp,
            Self::Gcp { .. } => ExporterType::Gcp,
            Self::Aws { .. } => ExporterType::Aws,
        }
    }

    /// Whether spans leave the process
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Why a configured exporter cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExporterError {
    /// The key matches no known backend
    #[error("unknown exporter type '{0}'")]
    UnknownExporter(String),

    /// `gcp` selected without a project
    #[error("exporter 'gcp' requires OBSERVABILITY_CONFIG__GCP_PROJECT_ID")]
    MissingGcpProjectId,

    /// Binary built without the `telemetry` feature
    #[error("exporter '{0}' is unavailable: built without the telemetry feature")]
    TelemetryUnavailable(ExporterType),

    /// The exporter client could not be constructed
    #[error("failed to build '{exporter}' exporter: {message}")]
    Build {
        /// Backend that failed
        exporter: ExporterType,
        /// Underlying failure
        message: String,
    },
}

/// Choose the exporter for `config`
///
/// Pure: depends only on the configuration and on whether the `telemetry`
/// feature was compiled in.
///
/// # Errors
///
/// Returns an [`ExporterError`] naming the first unmet prerequisite
pub fn select_exporter(config: &ObservabilityConfig) -> Result<ExporterPlan, ExporterError> {
    if !config.enable_tracing {
        return Ok(ExporterPlan::Disabled);
    }

    let exporter_type: ExporterType = config.exporter_type.parse()?;
    let endpoint_or = |default: &str| {
        config
            .exporter_endpoint
            .clone()
            .unwrap_or_else(|| default.to_owned())
    };

    let plan = match exporter_type {
        ExporterType::None => return Ok(ExporterPlan::Disabled),
        ExporterType::Console => ExporterPlan::Console,
        ExporterType::Otlp => ExporterPlan::Otlp {
            endpoint: endpoint_or(DEFAULT_OTLP_ENDPOINT),
        },
        ExporterType::Gcp => ExporterPlan::Gcp {
            project_id: config
                .gcp_project_id
                .clone()
                .ok_or(ExporterError::MissingGcpProjectId)?,
            endpoint: endpoint_or(DEFAULT_GCP_ENDPOINT),
        },
        ExporterType::Aws => ExporterPlan::Aws {
            endpoint: endpoint_or(DEFAULT_AWS_ENDPOINT),
        },
    };

    if cfg!(feature = "telemetry") {
        Ok(plan)
    } else {
        Err(ExporterError::TelemetryUnavailable(exporter_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(exporter_type: &str) -> ObservabilityConfig {
        ObservabilityConfig {
            enable_tracing: true,
            exporter_type: exporter_type.to_owned(),
            ..ObservabilityConfig::default()
        }
    }

    #[test]
    fn test_disabled_ignores_exporter_key() {
        let config = ObservabilityConfig {
            enable_tracing: false,
            exporter_type: "no-such-backend".into(),
            ..ObservabilityConfig::default()
        };
        assert_eq!(select_exporter(&config), Ok(ExporterPlan::Disabled));
        assert_eq!(select_exporter(&enabled("none")), Ok(ExporterPlan::Disabled));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        assert_eq!(
            select_exporter(&enabled("zipkin")),
            Err(ExporterError::UnknownExporter("zipkin".into()))
        );
    }

    #[test]
    fn test_gcp_requires_project() {
        assert_eq!(
            select_exporter(&enabled("gcp")),
            Err(ExporterError::MissingGcpProjectId)
        );
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn test_endpoints_default_per_backend() {
        assert_eq!(
            select_exporter(&enabled("otlp")),
            Ok(ExporterPlan::Otlp {
                endpoint: DEFAULT_OTLP_ENDPOINT.into()
            })
        );

        let gcp = ObservabilityConfig {
            gcp_project_id: Some("tributum-prod".into()),
            ..enabled("GCP")
        };
        assert_eq!(
            select_exporter(&gcp),
            Ok(ExporterPlan::Gcp {
                project_id: "tributum-prod".into(),
                endpoint: DEFAULT_GCP_ENDPOINT.into()
            })
        );

        let aws = ObservabilityConfig {
            exporter_endpoint: Some("http://adot:4317".into()),
            ..enabled("aws")
        };
        assert_eq!(
            select_exporter(&aws),
            Ok(ExporterPlan::Aws {
                endpoint: "http://adot:4317".into()
            })
        );
    }

    #[cfg(not(feature = "telemetry"))]
    #[test]
    fn test_without_telemetry_feature_everything_degrades() {
        assert_eq!(
            select_exporter(&enabled("console")),
            Err(ExporterError::TelemetryUnavailable(ExporterType::Console))
        );
    }
}
