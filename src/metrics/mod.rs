//! Centralized metrics infrastructure for the feature pipeline
//!
//! Each pipeline phase defines its own metrics in a dedicated submodule, ensuring
//! clear ownership and preventing naming conflicts. Without an installed
//! recorder every call is a no-op, so library users and tests pay nothing.

pub mod imputation;
pub mod ingest;
pub mod personnel;
pub mod registry;

pub use imputation::ImputationMetrics;
pub use ingest::IngestMetrics;
pub use personnel::PersonnelMetrics;

use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the in-process Prometheus recorder and register all phase metrics.
///
/// Idempotent. No HTTP listener is started: batch runs render the snapshot
/// through [`render_snapshot`] once they are done.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("METRICS: recorder handle was already stored");
                }
                registry::register_all_metrics();
                info!("Prometheus recorder installed, pipeline metrics registered");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Prometheus text exposition of everything recorded so far, if a recorder is installed.
pub fn render_snapshot() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Trait for phase-specific metrics collections
///
/// Each pipeline phase implements this trait to provide:
/// - Metric registration at startup
/// - Consistent naming conventions
/// - Documentation of what each metric measures
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Get the phase name for prefixing metrics
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Macro to create phase-specific metric names with consistent naming
///
/// All metrics follow the convention:
/// dtf_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("dtf_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("dtf_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("dtf_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

#[cfg(test)]
mod tests {
    #[test]
    fn test_metric_naming_convention() {
        assert_eq!(
            phase_metric!(counter, "imputation", "range_mean"),
            "dtf_imputation_range_mean_total"
        );
        assert_eq!(
            phase_metric!(histogram, "personnel", "technical_ratio"),
            "dtf_personnel_technical_ratio"
        );
        assert_eq!(
            phase_metric!(gauge, "ingest", "companies"),
            "dtf_ingest_companies"
        );
    }
}
