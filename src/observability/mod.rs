// ABOUTME: OpenTelemetry tracing setup with fail-soft exporter selection
// ABOUTME: Any unmet prerequisite logs a warning and leaves the server running without span export
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! # Distributed Tracing
//!
//! [`setup_tracing`] turns an [`ObservabilityConfig`] into a [`Telemetry`] handle.
//! It never fails: an unknown exporter key, a missing GCP project, a binary built
//! without the `telemetry` feature or an exporter that cannot be constructed all
//! produce a `WARN` event and a disabled handle.
//!
//! The handle contributes a `tracing-opentelemetry` layer to the subscriber built
//! in [`crate::logging::init`] and flushes pending spans on [`Telemetry::shutdown`].

/// Exporter selection
pub mod exporter;
/// W3C trace context extraction
pub mod propagation;
/// Span constructors and recorders
pub mod spans;

pub use exporter::{select_exporter, ExporterError, ExporterPlan, ExporterType};
pub use propagation::link_remote_parent;
pub use spans::{
    add_correlation_id_to_span, create_database_span, create_request_span, record_error_in_span,
};

use crate::config::ObservabilityConfig;
use tracing::{info, warn};
use tracing_subscriber::{Layer, Registry};

/// Subscriber layer exported by an enabled [`Telemetry`]
pub type TelemetryLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Handle to the active tracer provider, if any
pub struct Telemetry {
    plan: ExporterPlan,
    service_name: String,
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("plan", &self.plan)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

impl Telemetry {
    /// Handle with span export turned off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            plan: ExporterPlan::Disabled,
            service_name: String::new(),
            #[cfg(feature = "telemetry")]
            provider: None,
        }
    }

    /// Whether spans are exported
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.plan.is_enabled()
    }

    /// Exporter in use
    #[must_use]
    pub const fn exporter(&self) -> &ExporterPlan {
        &self.plan
    }

    /// Tracer for the configured service, `None` when disabled
    #[cfg(feature = "telemetry")]
    #[must_use]
    pub fn tracer(&self) -> Option<opentelemetry_sdk::trace::Tracer> {
        use opentelemetry::trace::TracerProvider as _;

        self.provider
            .as_ref()
            .map(|provider| provider.tracer(self.service_name.clone()))
    }

    /// Subscriber layer that forwards spans to the exporter
    #[must_use]
    pub fn layer(&self) -> Option<TelemetryLayer> {
        #[cfg(feature = "telemetry")]
        {
            self.tracer()
                .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer).boxed())
        }
        #[cfg(not(feature = "telemetry"))]
        {
            None
        }
    }

    /// Flush pending spans and stop the exporter
    pub fn shutdown(self) {
        #[cfg(feature = "telemetry")]
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "Failed to flush trace exporter on shutdown");
            }
        }
    }
}

/// Configure span export for `config`
///
/// Never fails. Unmet prerequisites are reported with a `WARN` event and yield a
/// disabled handle.
#[must_use]
pub fn setup_tracing(config: &ObservabilityConfig) -> Telemetry {
    let plan = match select_exporter(config) {
        Ok(ExporterPlan::Disabled) => {
            info!("Distributed tracing disabled");
            return Telemetry::disabled();
        }
        Ok(plan) => plan,
        Err(e) => {
            warn!(
                exporter_type = %config.exporter_type,
                reason = %e,
                "Tracing exporter unavailable, continuing with tracing disabled"
            );
            return Telemetry::disabled();
        }
    };

    #[cfg(feature = "telemetry")]
    {
        match provider::build(&plan, config) {
            Ok(tracer_provider) => {
                provider::install_globals(&tracer_provider);
                info!(
                    exporter = %plan.exporter_type(),
                    service_name = %config.service_name,
                    sample_rate = config.trace_sample_rate,
                    "Distributed tracing enabled"
                );
                Telemetry {
                    plan,
                    service_name: config.service_name.clone(),
                    provider: Some(tracer_provider),
                }
            }
            Err(e) => {
                warn!(
                    exporter_type = %config.exporter_type,
                    reason = %e,
                    "Tracing exporter unavailable, continuing with tracing disabled"
                );
                Telemetry::disabled()
            }
        }
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = plan;
        Telemetry::disabled()
    }
}

#[cfg(feature = "telemetry")]
mod provider {
    use super::{ExporterError, ExporterPlan};
    use crate::config::ObservabilityConfig;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::trace::{Sampler, TracerProvider};
    use opentelemetry_sdk::{runtime, Resource};

    pub(super) fn build(
        plan: &ExporterPlan,
        config: &ObservabilityConfig,
    ) -> Result<TracerProvider, ExporterError> {
        let mut attributes = vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ];

        let builder = TracerProvider::builder().with_sampler(sampler(config.trace_sample_rate));

        let builder = match plan {
            ExporterPlan::Disabled => builder,
            ExporterPlan::Console => {
                builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            }
            ExporterPlan::Otlp { endpoint } | ExporterPlan::Aws { endpoint } => {
                builder.with_batch_exporter(otlp_exporter(plan, endpoint)?, runtime::Tokio)
            }
            ExporterPlan::Gcp {
                project_id,
                endpoint,
            } => {
                attributes.push(KeyValue::new("gcp.project_id", project_id.clone()));
                builder.with_batch_exporter(otlp_exporter(plan, endpoint)?, runtime::Tokio)
            }
        };

        Ok(builder.with_resource(Resource::new(attributes)).build())
    }

    pub(super) fn install_globals(provider: &TracerProvider) {
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
        opentelemetry::global::set_tracer_provider(provider.clone());
    }

    fn otlp_exporter(
        plan: &ExporterPlan,
        endpoint: &str,
    ) -> Result<opentelemetry_otlp::SpanExporter, ExporterError> {
        opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| ExporterError::Build {
                exporter: plan.exporter_type(),
                message: e.to_string(),
            })
    }

    fn sampler(rate: f64) -> Sampler {
        let root = if rate >= 1.0 {
            Sampler::AlwaysOn
        } else if rate <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(rate)
        };
        Sampler::ParentBased(Box::new(root))
    }
}
