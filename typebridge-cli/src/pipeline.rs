//! Plan pipeline: manifest and configuration in, resolved descriptors out.

use std::path::Path;

use tracing::{info, warn};

use typebridge::{GenerationPlan, ResolutionReport};

use crate::config::Config;
use crate::error::CliResult;
use crate::manifest::{Manifest, ManifestInputs};

/// A built plan together with the resolution of every planned type.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: GenerationPlan,
    pub report: ResolutionReport,
}

impl PlanOutcome {
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

/// Load a manifest and turn it into plan inputs.
pub fn load_inputs(manifest: &Path) -> CliResult<ManifestInputs> {
    let inputs = Manifest::load(manifest)?.into_inputs()?;
    info!(
        manifest = %manifest.display(),
        types = inputs.universe.len(),
        "loaded manifest"
    );
    Ok(inputs)
}

/// Build the plan for a manifest and resolve every type in it.
pub fn run(manifest: &Path, config: &Config) -> CliResult<PlanOutcome> {
    let inputs = load_inputs(manifest)?;
    plan_inputs(&inputs, config)
}

/// Build the plan for already loaded inputs and resolve every type in it.
pub fn plan_inputs(inputs: &ManifestInputs, config: &Config) -> CliResult<PlanOutcome> {
    let plan = GenerationPlan::build(&inputs.universe, &inputs.catalog, &config.plan)?;
    let report = plan.resolve_all();

    if report.is_success() {
        info!(resolved = report.resolved.len(), "resolved every planned type");
    } else {
        warn!(
            resolved = report.resolved.len(),
            failed = report.failed.len(),
            "resolution finished with failures"
        );
    }

    Ok(PlanOutcome { plan, report })
}
