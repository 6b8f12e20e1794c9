use anyhow::Result;

use crate::models::ReportEntry;

pub fn render(entries: &[ReportEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}
