//! End-of-run summary output

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;

use crate::pipeline::{Outcome, RunSummary};

/// Longest skip reason shown in the table; the full text is in the log.
const MAX_REASON_LEN: usize = 80;

/// Write the run summary: one table row per resource group, then a total line.
pub fn write_summary(writer: &mut dyn Write, summary: &RunSummary) -> Result<()> {
    if summary.total() == 0 {
        writeln!(writer, "No resource groups found.")?;
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Resource group", "Status", "Details"]);

    for doc in &summary.documented {
        table.add_row(vec![
            doc.resource_group.clone(),
            "documented".to_string(),
            doc.path.display().to_string(),
        ]);
    }
    for skip in &summary.skipped {
        table.add_row(vec![
            skip.resource_group.clone(),
            format!("skipped ({})", skip.stage),
            truncate(first_line(&skip.reason), MAX_REASON_LEN),
        ]);
    }

    writeln!(writer, "{table}")?;

    let totals = format!(
        "{} documented, {} skipped",
        summary.documented.len(),
        summary.skipped.len()
    );
    match summary.outcome() {
        Outcome::Complete => writeln!(writer, "{} {}", "OK".green().bold(), totals)?,
        Outcome::Partial => writeln!(writer, "{} {}", "Partial".yellow().bold(), totals)?,
    }

    Ok(())
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
