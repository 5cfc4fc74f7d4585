use crate::error::Result;
use crate::pipeline::ingestion::RawTable;
use crate::pipeline::processing::FeatureTable;

// Ingest-side ports: the loader hands over in-memory tables
pub trait CompanySource: Send + Sync {
    fn load_companies(&self) -> Result<RawTable>;
}

pub trait PersonnelSource: Send + Sync {
    fn load_personnel(&self) -> Result<RawTable>;
}

pub trait ProfileFragmentSource: Send + Sync {
    fn load_fragments(&self) -> Result<RawTable>;
}

// Egress port: the model trainer consumes only the feature table
pub trait FeatureTableSink: Send + Sync {
    fn write_table(&self, table: &FeatureTable) -> Result<()>;
}
