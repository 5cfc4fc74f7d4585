//! Metrics registry for coordinating phase-specific metrics
//!
//! Registers the metrics of every phase, validates naming consistency,
//! and detects conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{info, warn};

/// Register all metrics from all phases
pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::ingest::IngestMetrics>(&mut all_metrics);
    register_phase_metrics::<super::imputation::ImputationMetrics>(&mut all_metrics);
    register_phase_metrics::<super::personnel::PersonnelMetrics>(&mut all_metrics);

    info!("Registered {} total metrics across all phases", all_metrics.len());

    if std::env::var("DTF_METRICS_DEBUG").is_ok() {
        log_metrics_summary(&all_metrics);
    }
}

/// Register metrics for a specific phase and detect conflicts
fn register_phase_metrics<T: PhaseMetrics>(
    all_metrics: &mut HashMap<String, (&'static str, MetricDoc)>,
) {
    T::register_metrics();
    let phase_docs = T::metrics_documentation();
    let phase_name = T::phase_name();

    info!("Registering {} metrics for phase '{}'", phase_docs.len(), phase_name);

    for doc in phase_docs {
        if let Some((existing_phase, _)) = all_metrics.get(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' is defined in both '{}' and '{}'",
                doc.name, existing_phase, phase_name
            );
        } else {
            all_metrics.insert(doc.name.to_string(), (phase_name, doc));
        }
    }
}

fn log_metrics_summary(all_metrics: &HashMap<String, (&'static str, MetricDoc)>) {
    info!("=== Metrics Registry Summary ===");

    let mut by_phase: HashMap<&str, Vec<&MetricDoc>> = HashMap::new();
    for (phase, doc) in all_metrics.values() {
        by_phase.entry(*phase).or_default().push(doc);
    }

    for (phase, metrics) in by_phase {
        info!("Phase '{}': {} metrics", phase, metrics.len());
        for metric in metrics {
            info!("  - {} ({:?}): {}", metric.name, metric.metric_type, metric.help);
        }
    }

    info!("=== End Metrics Summary ===");
}

/// Extract phase name from metric name (e.g., "dtf_ingest_rows_normalized_total" -> "ingest")
pub fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("dtf_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}
