//! Noael command - study NOAEL per sex with provenance.

use std::path::PathBuf;

use colored::Colorize;
use toxsynth::format::{format_loael, format_noael};
use toxsynth::noael::NoaelSource;

pub fn run(
    file: PathBuf,
    scheduled_only: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (input, report) = super::synthesize(&file, scheduled_only, config)?;

    println!(
        "{} {}",
        "NOAEL for".cyan().bold(),
        report.study_id.white().bold()
    );

    if report.study_noael.is_empty() {
        println!("{}", "No endpoints or study-level NOAEL table found.".yellow());
        return Ok(());
    }

    for (sex, study) in &report.study_noael {
        let provenance = match &study.source {
            NoaelSource::Derived { organ, endpoint } => {
                format!("driven by {} in {}", endpoint.label, organ)
            }
            NoaelSource::StudyTable => "from study-level NOAEL table".to_string(),
            NoaelSource::Unavailable => "no usable statistics".to_string(),
        };
        println!(
            "  {}  NOAEL {}  LOAEL {}  ({})",
            sex.to_string().yellow().bold(),
            format_noael(&study.noael, &input.dose_groups).white().bold(),
            format_loael(&study.noael, &input.dose_groups),
            provenance.dimmed()
        );
    }

    Ok(())
}
