//! Analyze command - synthesize a study and summarize organ evidence.

use std::fs;
use std::path::PathBuf;

use colored::{ColoredString, Colorize};
use toxsynth::confidence::ConfidenceLevel;
use toxsynth::format::format_noael;
use toxsynth::{Severity, StudyReport};

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    scheduled_only: bool,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (input, report) = super::synthesize(&file, scheduled_only, config)?;

    if let Some(path) = &output {
        let mut contents = serde_json::to_string_pretty(&report)?;
        contents.push('\n');
        fs::write(path, contents)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} ({} endpoints, {})",
        "Study".cyan().bold(),
        report.study_id.white().bold(),
        report.endpoints.len(),
        cohort_label(&report)
    );

    for (sex, rail) in &report.rail {
        println!();
        println!("{}", format!("Sex: {}", sex).yellow().bold());
        println!(
            "  {} organs, {} endpoints: {} significant, {} treatment-related, {} adverse",
            rail.organ_count,
            rail.endpoint_count,
            rail.significant_count.to_string().white(),
            rail.treatment_related_count.to_string().blue(),
            rail.adverse_count.to_string().red()
        );

        for organ in report.organs_for(*sex) {
            println!(
                "  {:20} score {}  adverse {}  direction {:?}  NOAEL {}",
                organ.organ,
                score_colored(organ.max_signal_score),
                organ.adverse_count,
                organ.dominant_direction,
                format_noael(&organ.noael, &input.dose_groups)
            );
        }

        if let Some(noael) = report.study_noael.get(sex) {
            println!(
                "  {} {}",
                "Study NOAEL:".green().bold(),
                format_noael(&noael.noael, &input.dose_groups)
            );
        }
    }

    if verbose {
        println!();
        println!("{}", "Endpoints:".yellow().bold());
        for endpoint in &report.endpoints {
            println!(
                "  {} {:30} {:18} {}  confidence {}",
                endpoint.verdict.category().icon(),
                endpoint.key.to_string(),
                endpoint.pattern.pattern.label(),
                severity_colored(endpoint.verdict.label(), endpoint.verdict.effective_severity()),
                confidence_colored(endpoint.confidence.integrated)
            );
        }
    }

    if !report.divergences.is_empty() {
        println!();
        println!("{}", "Sex divergence in clinical overrides:".magenta().bold());
        for divergence in &report.divergences {
            let by_sex: Vec<String> = divergence
                .divergence
                .override_by_sex
                .iter()
                .map(|(sex, rule)| format!("{}: {}", sex, rule.as_deref().unwrap_or("none")))
                .collect();
            println!("  {} ({})", divergence.label, by_sex.join(", "));
        }
    }

    if let Some(path) = output {
        println!();
        println!(
            "{} {}",
            "Saved to".green().bold(),
            path.display().to_string().white()
        );
    }

    Ok(())
}

fn cohort_label(report: &StudyReport) -> &'static str {
    match report.cohort {
        toxsynth::CohortFilter::AllSubjects => "all subjects",
        toxsynth::CohortFilter::ScheduledOnly => "scheduled-sacrifice only",
    }
}

fn score_colored(score: f64) -> ColoredString {
    let text = format!("{:.2}", score);
    if score >= 0.7 {
        text.red()
    } else if score >= 0.4 {
        text.yellow()
    } else {
        text.normal()
    }
}

fn severity_colored(text: &str, severity: Option<Severity>) -> ColoredString {
    match severity {
        Some(Severity::Adverse) => text.red(),
        Some(Severity::Warning) => text.yellow(),
        Some(Severity::Normal) => text.green(),
        None => text.dimmed(),
    }
}

fn confidence_colored(level: ConfidenceLevel) -> ColoredString {
    match level {
        ConfidenceLevel::High => level.label().green(),
        ConfidenceLevel::Moderate => level.label().yellow(),
        ConfidenceLevel::Low => level.label().red(),
    }
}
