use anyhow::{Context, Result};
use tracing::info;

use crate::app::feature_pipeline::{
    FeaturePipeline, FittedStatistics, PipelineInputs, PipelineOutput,
};
use crate::app::ports::{CompanySource, FeatureTableSink, PersonnelSource, ProfileFragmentSource};

/// Use case wiring the feature pipeline to its collaborators: three table
/// sources on the way in, one feature table sink on the way out.
pub struct FeaturePipelineUseCase {
    pipeline: FeaturePipeline,
    companies: Box<dyn CompanySource>,
    personnel: Box<dyn PersonnelSource>,
    fragments: Box<dyn ProfileFragmentSource>,
    sink: Box<dyn FeatureTableSink>,
}

impl FeaturePipelineUseCase {
    pub fn new(
        pipeline: FeaturePipeline,
        companies: Box<dyn CompanySource>,
        personnel: Box<dyn PersonnelSource>,
        fragments: Box<dyn ProfileFragmentSource>,
        sink: Box<dyn FeatureTableSink>,
    ) -> Self {
        Self {
            pipeline,
            companies,
            personnel,
            fragments,
            sink,
        }
    }

    /// Fit on `reference` (the company source when `None`), transform the
    /// sources and hand the table to the sink.
    pub fn run(
        &self,
        reference: Option<&dyn CompanySource>,
    ) -> Result<(FittedStatistics, PipelineOutput)> {
        let companies = self.companies.load_companies().context("loading company table")?;
        let personnel = self.personnel.load_personnel().context("loading personnel table")?;
        let fragments = self.fragments.load_fragments().context("loading profile fragment table")?;

        let stats = match reference {
            Some(source) => {
                let table = source.load_companies().context("loading reference company table")?;
                self.pipeline.fit(&table).context("fitting on reference table")?
            }
            None => self.pipeline.fit(&companies).context("fitting on company table")?,
        };

        let output = self
            .pipeline
            .transform(
                &stats,
                PipelineInputs {
                    companies: &companies,
                    personnel: &personnel,
                    fragments: &fragments,
                },
            )
            .context("transforming input tables")?;

        self.sink.write_table(&output.table).context("writing feature table")?;
        info!(rows = output.table.len(), run_id = %output.report.run_id, "Feature table delivered");

        Ok((stats, output))
    }
}
