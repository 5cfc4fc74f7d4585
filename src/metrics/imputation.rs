//! Imputation Phase Metrics
//!
//! How employee counts and growth stages were resolved during a transform,
//! one counter per resolution tier.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the imputation phase
pub struct ImputationMetrics;

impl ImputationMetrics {
    /// Record how many employee counts each tier resolved in one transform
    pub fn record_employee_tiers(
        observed: usize,
        range_mean: usize,
        cohort_median: usize,
        global_median: usize,
        unresolved: usize,
    ) {
        ::metrics::counter!(phase_metric!(counter, "imputation", "employees_observed"))
            .increment(observed as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "employees_range_mean"))
            .increment(range_mean as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "employees_cohort_median"))
            .increment(cohort_median as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "employees_global_median"))
            .increment(global_median as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "employees_unresolved"))
            .increment(unresolved as u64);
    }

    /// Record growth stage resolutions for one transform
    pub fn record_stage_resolutions(observed: usize, imputed: usize, unresolved: usize) {
        ::metrics::counter!(phase_metric!(counter, "imputation", "stages_observed"))
            .increment(observed as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "stages_imputed"))
            .increment(imputed as u64);
        ::metrics::counter!(phase_metric!(counter, "imputation", "stages_unresolved"))
            .increment(unresolved as u64);
    }

    /// Record a completed fit pass
    pub fn record_fit(reference_rows: usize, cohorts: usize) {
        ::metrics::counter!(phase_metric!(counter, "imputation", "fits")).increment(1);
        ::metrics::gauge!(phase_metric!(gauge, "imputation", "fit_reference_rows"))
            .set(reference_rows as f64);
        ::metrics::gauge!(phase_metric!(gauge, "imputation", "fit_cohorts")).set(cohorts as f64);
    }
}

impl PhaseMetrics for ImputationMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        // Pre-register so the metrics appear in snapshots before first use
        let _ = counter!(phase_metric!(counter, "imputation", "employees_observed"));
        let _ = counter!(phase_metric!(counter, "imputation", "employees_range_mean"));
        let _ = counter!(phase_metric!(counter, "imputation", "employees_cohort_median"));
        let _ = counter!(phase_metric!(counter, "imputation", "employees_global_median"));
        let _ = counter!(phase_metric!(counter, "imputation", "employees_unresolved"));
        let _ = counter!(phase_metric!(counter, "imputation", "stages_observed"));
        let _ = counter!(phase_metric!(counter, "imputation", "stages_imputed"));
        let _ = counter!(phase_metric!(counter, "imputation", "stages_unresolved"));
        let _ = counter!(phase_metric!(counter, "imputation", "fits"));
        let _ = gauge!(phase_metric!(gauge, "imputation", "fit_reference_rows"));
        let _ = gauge!(phase_metric!(gauge, "imputation", "fit_cohorts"));
    }

    fn phase_name() -> &'static str {
        "imputation"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "imputation", "employees_observed"),
                metric_type: MetricType::Counter,
                help: "Employee counts present in the input or supplied by the correction table",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "employees_range_mean"),
                metric_type: MetricType::Counter,
                help: "Employee counts imputed from the mean of the employee range label",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "employees_cohort_median"),
                metric_type: MetricType::Counter,
                help: "Employee counts imputed from the launch-year cohort median",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "employees_global_median"),
                metric_type: MetricType::Counter,
                help: "Employee counts imputed from the dataset-wide fallback median",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "employees_unresolved"),
                metric_type: MetricType::Counter,
                help: "Employee counts still missing after every tier",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "stages_observed"),
                metric_type: MetricType::Counter,
                help: "Growth stages present in the input",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "stages_imputed"),
                metric_type: MetricType::Counter,
                help: "Growth stages imputed from the launch-year cohort mode",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "stages_unresolved"),
                metric_type: MetricType::Counter,
                help: "Growth stages left missing (no launch year or unknown cohort)",
            },
            MetricDoc {
                name: phase_metric!(counter, "imputation", "fits"),
                metric_type: MetricType::Counter,
                help: "Number of fit passes over a reference dataset",
            },
            MetricDoc {
                name: phase_metric!(gauge, "imputation", "fit_reference_rows"),
                metric_type: MetricType::Gauge,
                help: "Rows in the reference dataset of the latest fit",
            },
            MetricDoc {
                name: phase_metric!(gauge, "imputation", "fit_cohorts"),
                metric_type: MetricType::Gauge,
                help: "Launch-year cohorts with a learned median in the latest fit",
            },
        ]
    }
}
