use std::collections::HashMap;
use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::license::license_id;
use crate::models::{LicenseResult, LicenseRisk, PolicyVerdict, ReportEntry};

/// Render a colored terminal report.
pub fn render(entries: &[ReportEntry], manifest: &Path, verbose: bool, quiet: bool) {
    let total = entries.len();
    let count = |v: &PolicyVerdict| entries.iter().filter(|e| &e.verdict == v).count();
    let pass_count = count(&PolicyVerdict::Pass);
    let warn_count = count(&PolicyVerdict::Warn);
    let error_count = count(&PolicyVerdict::Error);
    let unresolved: Vec<&ReportEntry> = entries.iter().filter(|e| e.license.is_error()).collect();

    if quiet {
        println!(
            "Total: {}  Pass: {}  Warn: {}  Error: {}  Unresolved: {}",
            total,
            pass_count.to_string().green(),
            warn_count.to_string().yellow(),
            error_count.to_string().red(),
            unresolved.len().to_string().dimmed(),
        );
        return;
    }

    println!(
        "\n {} v{}",
        "license-fetchr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Manifest: {}\n", manifest.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", total));
    for (symbol, label, n, verdict) in [
        ("✓".green(), "Pass", pass_count, PolicyVerdict::Pass),
        ("⚠".yellow(), "Warn", warn_count, PolicyVerdict::Warn),
        ("✗".red(), "Error", error_count, PolicyVerdict::Error),
    ] {
        println!(
            " │  {:<48} │",
            format!(
                "{}  {:<16}: {:>4}  {}",
                symbol,
                label,
                n,
                summarize_licenses(entries, &verdict)
            )
        );
    }
    println!(
        " │  {:<48} │",
        format!("   {:<16}: {:>4}", "Unresolved", unresolved.len())
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if error_count > 0 {
        println!(" {} Dependencies requiring attention:\n", "[ERROR]".red().bold());
        render_table(entries, &PolicyVerdict::Error);
        println!();
    }

    if warn_count > 0 {
        println!(" {} Dependencies with warnings:\n", "[WARN]".yellow().bold());
        render_table(entries, &PolicyVerdict::Warn);
        println!();
    }

    if verbose && pass_count > 0 {
        println!(" {} All passing dependencies:\n", "[PASS]".green().bold());
        render_table(entries, &PolicyVerdict::Pass);
        println!();
    }

    if !unresolved.is_empty() {
        println!(" {} Could not resolve:\n", "[UNRESOLVED]".dimmed().bold());
        for entry in unresolved {
            println!("   {} ({})", entry.name, entry.license.name());
        }
        println!();
    }
}

fn render_table(entries: &[ReportEntry], verdict_filter: &PolicyVerdict) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Risk").add_attribute(Attribute::Bold),
            Cell::new("Verdict").add_attribute(Attribute::Bold),
        ]);

    for entry in entries.iter().filter(|e| &e.verdict == verdict_filter) {
        let (verdict_str, verdict_color) = match entry.verdict {
            PolicyVerdict::Pass => ("✓ pass", Color::Green),
            PolicyVerdict::Warn => ("⚠ warn", Color::Yellow),
            PolicyVerdict::Error => ("✗ error", Color::Red),
        };

        let risk_color = match entry.risk {
            LicenseRisk::Permissive => Color::Green,
            LicenseRisk::WeakCopyleft => Color::Yellow,
            LicenseRisk::StrongCopyleft => Color::Red,
            LicenseRisk::Proprietary => Color::Magenta,
            LicenseRisk::Unknown => Color::DarkGrey,
        };

        let name = match &entry.license {
            LicenseResult::Error(stage) => format!("failed: {}", stage),
            LicenseResult::License(d) => d.name.clone(),
        };

        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(license_id(&entry.license)),
            Cell::new(name),
            Cell::new(entry.risk.to_string()).fg(risk_color),
            Cell::new(verdict_str)
                .fg(verdict_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
}

/// Top three license ids for a verdict, e.g. `[MIT (12), ISC (3)]`.
fn summarize_licenses(entries: &[ReportEntry], verdict: &PolicyVerdict) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries.iter().filter(|e| &e.verdict == verdict) {
        *counts.entry(license_id(&entry.license)).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}
