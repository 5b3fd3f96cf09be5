//! Rendering of plan outcomes.
//!
//! Two renderings are supported: a colored human-readable summary and a
//! JSON document for tooling.

use colored::Colorize;
use serde::Serialize;

use typebridge::{ArtifactDescriptor, DataType};

use crate::config::OutputFormat;
use crate::error::CliResult;
use crate::pipeline::PlanOutcome;

/// Render an outcome in the requested format.
pub fn render(outcome: &PlanOutcome, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Summary => Ok(render_summary(outcome)),
        OutputFormat::Json => render_json(outcome),
    }
}

/// Human-readable summary of every descriptor, failure and the exchangeable set.
pub fn render_summary(outcome: &PlanOutcome) -> String {
    let mut out = String::new();
    let report = &outcome.report;

    out.push_str(&format!(
        "{} {} artifact(s)\n",
        "Planned".cyan().bold(),
        report.resolved.len().to_string().green()
    ));

    for descriptor in &report.resolved {
        let location = &descriptor.location;
        let status = if location.generate {
            "✓".green()
        } else {
            "-".yellow()
        };
        out.push_str(&format!(
            "  {} {} -> {} as {}",
            status,
            location.source,
            descriptor.path().bold(),
            location.type_name
        ));
        if !location.generate {
            out.push_str(&format!(" {}", "(skipped)".dimmed()));
        }
        out.push('\n');

        if let Some(data_type) = &descriptor.data_type {
            out.push_str(&format!("      data type: {}\n", data_type));
        }
        for import in &descriptor.imports {
            out.push_str(&format!(
                "      imports {} from {}/{}\n",
                import.type_name, import.folder, import.file_name
            ));
        }
    }

    if !report.failed.is_empty() {
        out.push_str(&format!(
            "{} {} type(s)\n",
            "Failed".red().bold(),
            report.failed.len()
        ));
        for (source, err) in &report.failed {
            out.push_str(&format!("  {} {}: {}\n", "✗".red(), source, err));
        }
    }

    let exchangeable = outcome.plan.exchangeable();
    if exchangeable.is_empty() {
        out.push_str(&format!("{}\n", "No exchangeable data types".dimmed()));
    } else {
        let names: Vec<String> = exchangeable.iter().map(ToString::to_string).collect();
        out.push_str(&format!(
            "{} {}\n",
            "Exchangeable:".cyan().bold(),
            names.join(", ")
        ));
    }

    out
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    artifacts: Vec<&'a ArtifactDescriptor>,
    exchangeable: Vec<&'a DataType>,
    failures: Vec<JsonFailure>,
}

#[derive(Serialize)]
struct JsonFailure {
    #[serde(rename = "type")]
    source: String,
    error: String,
}

/// Pretty-printed JSON document of the outcome.
pub fn render_json(outcome: &PlanOutcome) -> CliResult<String> {
    let report = &outcome.report;
    let output = JsonOutput {
        artifacts: report.resolved.iter().map(|d| d.as_ref()).collect(),
        exchangeable: outcome.plan.exchangeable().iter().collect(),
        failures: report
            .failed
            .iter()
            .map(|(source, err)| JsonFailure {
                source: source.to_string(),
                error: err.to_string(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
