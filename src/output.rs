//! CLI output formatting and display helpers.

use std::path::Path;

use harvester_core::{AuditReport, AuditStatus, HarvestSummary};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

pub(crate) fn harvest_summary_lines(
    summary: &HarvestSummary,
    output_dir: &Path,
    manifest_path: &Path,
    error_log_path: &Path,
) -> Vec<String> {
    let mut lines = vec![
        format!("Harvested {} items", summary.total()),
        format!("  downloaded:        {}", summary.downloaded),
        format!("  skipped:           {}", summary.skipped),
        format!("  no document:       {}", summary.no_document),
        format!("  resolution failed: {}", summary.resolution_failed),
        format!("  download failed:   {}", summary.fetch_failed),
    ];
    if summary.aborted > 0 {
        lines.push(format!("  aborted:           {}", summary.aborted));
    }
    lines.push(format!("Documents: {}", output_dir.display()));
    lines.push(format!("Manifest:  {}", manifest_path.display()));
    if summary.failed() > 0 {
        lines.push(format!("Errors:    {}", error_log_path.display()));
    }
    lines
}

pub(crate) fn print_harvest_summary(
    summary: &HarvestSummary,
    output_dir: &Path,
    manifest_path: &Path,
    error_log_path: &Path,
) {
    for line in harvest_summary_lines(summary, output_dir, manifest_path, error_log_path) {
        println!("{line}");
    }
}

pub(crate) fn audit_report_lines(report: &AuditReport, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = report
        .failures()
        .map(|entry| {
            let detail = match &entry.status {
                AuditStatus::Mismatch {
                    actual_size,
                    actual_digest,
                } => format!(" (found {actual_size} bytes, sha256 {actual_digest})"),
                AuditStatus::Unreadable(reason) => format!(" ({reason})"),
                _ => String::new(),
            };
            let location = entry
                .path
                .as_deref()
                .map_or_else(|| entry.key.clone(), |path| path.display().to_string());
            truncate_to_width(
                &format!("{:<10} {location}{detail}", entry.status.label()),
                width,
            )
        })
        .collect();

    let failed = report.entries.len() - report.ok_count();
    lines.push(format!(
        "Verified {} of {} downloaded documents ({failed} failed)",
        report.ok_count(),
        report.entries.len()
    ));
    lines
}

pub(crate) fn print_audit_report(report: &AuditReport) {
    for line in audit_report_lines(report, terminal_width()) {
        println!("{line}");
    }
}
