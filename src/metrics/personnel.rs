//! Personnel Phase Metrics
//!
//! Person classification, profile flattening and company aggregation.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct PersonnelMetrics;

impl PersonnelMetrics {
    pub fn record_persons_classified(total: usize, technical: usize, founders: usize) {
        ::metrics::counter!(phase_metric!(counter, "personnel", "persons_classified"))
            .increment(total as u64);
        ::metrics::counter!(phase_metric!(counter, "personnel", "technical_persons"))
            .increment(technical as u64);
        ::metrics::counter!(phase_metric!(counter, "personnel", "founders"))
            .increment(founders as u64);
    }

    /// Record a flattening pass and the fragment rows it dropped at the slot cap
    pub fn record_profiles_flattened(profiles: usize, dropped_fragments: usize) {
        ::metrics::counter!(phase_metric!(counter, "personnel", "profiles_flattened"))
            .increment(profiles as u64);
        ::metrics::counter!(phase_metric!(counter, "personnel", "fragments_dropped"))
            .increment(dropped_fragments as u64);
    }

    pub fn record_companies_without_personnel(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "personnel", "companies_without_personnel"))
            .increment(count as u64);
    }

    /// Record a company's technical ratio
    pub fn record_technical_ratio(ratio: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "personnel", "technical_ratio"))
            .record(ratio);
    }
}

impl PhaseMetrics for PersonnelMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "personnel", "persons_classified"));
        let _ = counter!(phase_metric!(counter, "personnel", "technical_persons"));
        let _ = counter!(phase_metric!(counter, "personnel", "founders"));
        let _ = counter!(phase_metric!(counter, "personnel", "profiles_flattened"));
        let _ = counter!(phase_metric!(counter, "personnel", "fragments_dropped"));
        let _ = counter!(phase_metric!(counter, "personnel", "companies_without_personnel"));
        let _ = histogram!(phase_metric!(histogram, "personnel", "technical_ratio"));
    }

    fn phase_name() -> &'static str {
        "personnel"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "personnel", "persons_classified"),
                metric_type: MetricType::Counter,
                help: "Personnel rows run through the keyword classifiers",
            },
            MetricDoc {
                name: phase_metric!(counter, "personnel", "technical_persons"),
                metric_type: MetricType::Counter,
                help: "Persons labelled technical",
            },
            MetricDoc {
                name: phase_metric!(counter, "personnel", "founders"),
                metric_type: MetricType::Counter,
                help: "Persons labelled founder or executive",
            },
            MetricDoc {
                name: phase_metric!(counter, "personnel", "profiles_flattened"),
                metric_type: MetricType::Counter,
                help: "Distinct profiles flattened into fixed-width rows",
            },
            MetricDoc {
                name: phase_metric!(counter, "personnel", "fragments_dropped"),
                metric_type: MetricType::Counter,
                help: "Profile fragment rows beyond the per-category slot capacity",
            },
            MetricDoc {
                name: phase_metric!(counter, "personnel", "companies_without_personnel"),
                metric_type: MetricType::Counter,
                help: "Companies with no matched personnel rows",
            },
            MetricDoc {
                name: phase_metric!(histogram, "personnel", "technical_ratio"),
                metric_type: MetricType::Histogram,
                help: "Share of technical persons per company with personnel data",
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personnel_metrics_registration() {
        PersonnelMetrics::register_metrics();
    }

    #[test]
    fn test_metrics_documentation() {
        let docs = PersonnelMetrics::metrics_documentation();
        assert_eq!(docs.len(), 7);
        for doc in docs {
            assert!(doc.name.starts_with("dtf_personnel_"));
        }
    }
}
