//! CSV and print renditions of a report breakdown.

use std::fmt::Write as _;

use bytes::Bytes;

use super::error::ReportError;
use super::types::ReportPayload;
use super::viewer::{ReportBreakdown, breakdown};

/// Renders a payload as CSV: a summary block, then one block per table,
/// separated by blank lines.
///
/// # Errors
///
/// Returns `ReportError::Export` if the CSV writer fails.
pub fn payload_to_csv(payload: &ReportPayload) -> Result<Bytes, ReportError> {
    breakdown_to_csv(&breakdown(payload))
}

/// Renders a breakdown as CSV.
///
/// # Errors
///
/// Returns `ReportError::Export` if the CSV writer fails.
pub fn breakdown_to_csv(report: &ReportBreakdown) -> Result<Bytes, ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    wtr.write_record([report.title.as_str()])?;
    wtr.write_record(["Period", report.period.as_str()])?;
    wtr.write_record([
        "Generated At",
        &report
            .generated_at
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    ])?;
    wtr.write_record([""])?;

    wtr.write_record(["Metric", "Value"])?;
    for card in &report.cards {
        wtr.write_record([card.label.as_str(), card.value.as_str()])?;
    }

    for section in &report.sections {
        wtr.write_record([""])?;
        wtr.write_record([section.title.as_str()])?;
        wtr.write_record(&section.columns)?;
        for row in &section.rows {
            wtr.write_record(row)?;
        }
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::export(e.to_string()))?;
    Ok(Bytes::from(bytes))
}

/// A standalone HTML page for printing (or printing to PDF).
#[must_use]
pub fn print_document(report: &ReportBreakdown) -> String {
    let mut html = String::with_capacity(4096);
    let title = html_escape(&report.title);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2rem; }}\n\
         .cards {{ display: flex; gap: 1rem; margin-bottom: 1.5rem; }}\n\
         .card {{ border: 1px solid #ddd; padding: 0.75rem 1rem; }}\n\
         table {{ border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 0.4rem; text-align: left; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n<p>Period: {}</p>\n<p>Generated: {}</p>\n",
        html_escape(&report.period),
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
    );

    html.push_str("<div class=\"cards\">\n");
    for card in &report.cards {
        let _ = writeln!(
            html,
            "<div class=\"card\"><div>{}</div><strong>{}</strong></div>",
            html_escape(&card.label),
            html_escape(&card.value)
        );
    }
    html.push_str("</div>\n");

    for section in &report.sections {
        let _ = writeln!(html, "<h2>{}</h2>\n<table>\n<tr>", html_escape(&section.title));
        for column in &section.columns {
            let _ = write!(html, "<th>{}</th>", html_escape(column));
        }
        html.push_str("</tr>\n");
        for row in &section.rows {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{}</td>", html_escape(cell));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
