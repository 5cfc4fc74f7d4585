// Feature pipeline stages: ingestion (normalisation) and processing

pub mod ingestion;
pub mod processing;
