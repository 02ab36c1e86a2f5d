//! CLI command implementations.

pub mod analyze;
pub mod noael;

use std::path::{Path, PathBuf};

use toxsynth::{CohortFilter, StudyInput, StudyReport, SynthesisConfig, Synthesizer};

/// Load the study and run synthesis with the requested cohort and overrides.
pub(crate) fn synthesize(
    file: &Path,
    scheduled_only: bool,
    config: Option<PathBuf>,
) -> Result<(StudyInput, StudyReport), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let mut config = match config {
        Some(path) => SynthesisConfig::from_json_file(&path)?,
        None => SynthesisConfig::default(),
    };
    if scheduled_only {
        config = config.with_cohort(CohortFilter::ScheduledOnly);
    }

    let input = StudyInput::load(file)?;
    let report = Synthesizer::with_config(config)?.run(&input);
    Ok((input, report))
}
