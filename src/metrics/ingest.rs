//! Ingest Phase Metrics
//!
//! Row and field-level outcomes of normalizing the raw input tables.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct IngestMetrics;

impl IngestMetrics {
    /// Record the rows normalized from one input table
    pub fn record_rows_normalized(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "rows_normalized"))
            .increment(count as u64);
    }

    /// Record a field that failed to parse and was treated as absent
    pub fn record_malformed_field() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "malformed_fields")).increment(1);
    }

    /// Record a row dropped because it could not be normalized at all
    pub fn record_row_rejected() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "rows_rejected")).increment(1);
    }

    /// Record rows removed through the correction table's exclusion list
    pub fn record_rows_excluded(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingest", "rows_excluded"))
            .increment(count as u64);
    }

    pub fn record_schema_mismatch() {
        ::metrics::counter!(phase_metric!(counter, "ingest", "schema_mismatches")).increment(1);
    }
}

impl PhaseMetrics for IngestMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "ingest", "rows_normalized"));
        let _ = counter!(phase_metric!(counter, "ingest", "malformed_fields"));
        let _ = counter!(phase_metric!(counter, "ingest", "rows_rejected"));
        let _ = counter!(phase_metric!(counter, "ingest", "rows_excluded"));
        let _ = counter!(phase_metric!(counter, "ingest", "schema_mismatches"));
    }

    fn phase_name() -> &'static str {
        "ingest"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ingest", "rows_normalized"),
                metric_type: MetricType::Counter,
                help: "Input rows converted into typed records",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "malformed_fields"),
                metric_type: MetricType::Counter,
                help: "Fields that could not be parsed and were treated as absent",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "rows_rejected"),
                metric_type: MetricType::Counter,
                help: "Rows dropped because an identifying field was unusable",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "rows_excluded"),
                metric_type: MetricType::Counter,
                help: "Rows removed by the correction table exclusion list",
            },
            MetricDoc {
                name: phase_metric!(counter, "ingest", "schema_mismatches"),
                metric_type: MetricType::Counter,
                help: "Input tables rejected for missing required columns",
            },
        ]
    }
}
