//! Text and JSON rendering for CLI output.

use crate::cases::{folder_status, AggregateReport, CaseDocument, CaseSummary};
use crate::tree::{DirectoryNode, Node, TreeState};
use crate::types::{CaseStatus, StatusMap};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn status_badge(status: &CaseStatus) -> String {
    match status {
        CaseStatus::Urgent => format!("{}", status.red()),
        CaseStatus::Waiting => format!("{}", status.yellow()),
        CaseStatus::Completed => format!("{}", status.green()),
        other => other.to_string(),
    }
}

fn optional(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

/// Render the tree, descending only into expanded directories.
///
/// Entries are sorted for display (directories first, then by name); the
/// snapshot itself keeps scan order.
pub fn format_tree_text<H>(
    root: &DirectoryNode<H>,
    state: &TreeState,
    statuses: &StatusMap,
) -> String {
    let mut out = String::new();
    render_directory(root, state, statuses, 0, &mut out);
    out
}

fn render_directory<H>(
    dir: &DirectoryNode<H>,
    state: &TreeState,
    statuses: &StatusMap,
    depth: usize,
    out: &mut String,
) {
    let expanded = state.is_expanded(&dir.path);
    let marker = if expanded { "▾" } else { "▸" };
    let current = if state.current_dir() == Some(dir.path.as_str()) {
        " *"
    } else {
        ""
    };
    let badge = match folder_status(dir, statuses) {
        Some(status) if !status.is_none() => format!(" [{}]", status_badge(&status)),
        _ => String::new(),
    };
    out.push_str(&format!(
        "{}{} {}/{}{}\n",
        "  ".repeat(depth),
        marker,
        dir.name.bold(),
        badge,
        current
    ));
    if !expanded {
        return;
    }

    let mut children: Vec<&Node<H>> = dir.children.iter().collect();
    children.sort_by(|a, b| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
    });
    for child in children {
        match child {
            Node::Directory(sub) => render_directory(sub, state, statuses, depth + 1, out),
            Node::File(file) => {
                out.push_str(&format!("{}  {}\n", "  ".repeat(depth + 1), file.name));
            }
        }
    }
}

/// Case summaries as a table, followed by the soft-failure count.
pub fn format_case_summaries_text<H>(report: &AggregateReport<H>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Cases")));
    if report.summaries.is_empty() {
        out.push_str("No case files found.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["File", "ID", "Title", "Crime", "Victim", "Date", "Status"]);
        for summary in &report.summaries {
            table.add_row(vec![
                summary.file_name.clone(),
                summary.id.clone(),
                optional(&summary.title),
                optional(&summary.crime),
                optional(&summary.victim),
                optional(&summary.date),
                summary.status.to_string(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    if !report.failures.is_empty() {
        out.push_str(&format!(
            "\n{} case file(s) could not be read:\n",
            report.failure_count()
        ));
        for failure in &report.failures {
            out.push_str(&format!("  {}\n", failure));
        }
    }
    out
}

pub fn format_case_summaries_json<H>(
    report: &AggregateReport<H>,
) -> Result<String, serde_json::Error> {
    let summaries: Vec<&CaseSummary<H>> = report.summaries.iter().collect();
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|f| json!({ "path": f.path(), "error": f.to_string() }))
        .collect();
    serde_json::to_string_pretty(&json!({
        "cases": summaries,
        "failures": failures,
    }))
}

/// Metadata of an opened case file.
pub fn format_case_document_text(file_name: &str, document: &CaseDocument) -> String {
    let case = &document.case;
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(file_name)));
    let rows = [
        ("ID", case.id.clone()),
        ("Title", optional(&case.title)),
        ("Crime", optional(&case.crime)),
        ("Victim", optional(&case.victim)),
        ("Date", optional(&case.date)),
        ("Status", status_badge(&case.status)),
        ("Updated", optional(&document.updated_at)),
        ("Records", document.records.len().to_string()),
    ];
    for (label, value) in rows {
        out.push_str(&format!("  {:<8} {}\n", format!("{}:", label), value));
    }
    if let Some(notes) = case.notes.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("\n{}\n", notes));
    }
    out
}

pub fn format_status_list_text(statuses: &StatusMap) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Case status")));
    if statuses.is_empty() {
        out.push_str("No status tags recorded.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["File", "Status"]);
    for (file, status) in statuses {
        table.add_row(vec![file.clone(), status.to_string()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
