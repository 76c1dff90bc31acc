//! Report aggregation and emission
//!
//! Wraps the per-analyzer results in one timestamped report, prints a console
//! summary, and writes a timestamped JSON file.

use crate::analyzer::AnalysisResult;
use crate::error::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use console::style;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Aggregated output of one full analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub total_potential_savings: f64,
    pub results: Vec<AnalysisResult>,
}

impl Report {
    pub fn new(results: Vec<AnalysisResult>) -> Self {
        let total_potential_savings = results.iter().map(|r| r.potential_savings).sum();
        Self {
            generated_at: Utc::now(),
            total_potential_savings,
            results,
        }
    }
}

/// Print the human-readable summary to stdout
pub fn print_summary(report: &Report) {
    println!("{}", "=".repeat(80));
    println!("COST OPTIMIZATION REPORT");
    println!("{}", "=".repeat(80));

    let mut table = Table::new();
    table.set_header(vec!["Analyzer", "Provider", "Resource", "Potential Savings"]);
    for result in &report.results {
        let savings_cell = if result.potential_savings > 0.0 {
            Cell::new(format!("${:.2}/month", result.potential_savings))
                .fg(comfy_table::Color::Yellow)
        } else {
            Cell::new("$0.00/month")
        };
        table.add_row(vec![
            Cell::new(result.category.as_str()),
            Cell::new(result.provider.as_str()),
            Cell::new(&result.resource_type),
            savings_cell,
        ]);
    }
    println!("{}", table);

    for result in &report.results {
        if result.recommendations.is_empty() && result.details.is_empty() {
            continue;
        }

        println!(
            "\n{} ({})",
            style(&result.resource_type).bold().cyan(),
            result.category
        );
        for recommendation in &result.recommendations {
            println!("- {}", recommendation);
        }
        for (label, value) in &result.details {
            println!("  {} {}", style(format!("{}:", label)).dim(), value);
        }
    }

    println!("\n{}", "─".repeat(80));
    let total_style = if report.total_potential_savings > 100.0 {
        style(format!("${:.2}", report.total_potential_savings))
            .red()
            .bold()
    } else {
        style(format!("${:.2}", report.total_potential_savings)).yellow()
    };
    println!("  Total potential monthly savings: {}", total_style);
}

/// Write the report as a timestamped JSON file, returning its path
pub fn write_json(report: &Report, output_dir: &Path) -> Result<PathBuf> {
    let filename = format!(
        "costctl_report_{}.json",
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let path = output_dir.join(filename);

    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, content)?;

    info!(path = %path.display(), "report written");
    Ok(path)
}
