//! # Rendering
//!
//! Turns a `CmdResult` into terminal text. Results go to stdout; paging hints
//! and errors go to stderr so piped output stays clean.
//!
//! Render functions return strings so tests can check them without a
//! terminal; the `print_*` wrappers do the writing.

use colored::Colorize;
use holla::commands::{CmdMessage, CmdResult, MessageLevel, Section};
use holla::error::HollaError;
use holla::output::{format_output, format_paging, OutputFormat};
use serde_json::Value;

pub fn render_message(message: &CmdMessage) -> String {
    match message.level {
        MessageLevel::Success => format!("{} {}", "✓".green(), message.content),
        MessageLevel::Error => format!("{} {}", "✗".red(), message.content),
        MessageLevel::Warning => format!("{} {}", "!".yellow(), message.content.yellow()),
        MessageLevel::Info => message.content.dimmed().to_string(),
    }
}

/// Body of a result: raw JSON, a document, its sections, or the listing in `format`.
pub fn render_body(result: &CmdResult, format: OutputFormat) -> Option<String> {
    if let Some(raw) = &result.raw {
        return Some(serde_json::to_string_pretty(raw).unwrap_or_default());
    }
    if let Some(document) = &result.document {
        if format != OutputFormat::Json {
            return Some(document.clone());
        }
    }
    if !result.sections.is_empty() {
        return render_sections(&result.sections, format);
    }
    result
        .listing
        .as_ref()
        .map(|listing| format_output(&listing.data, format, listing.columns))
}

/// JSON mode nests each section under its lowercased label; other modes print
/// a header per non-empty section.
fn render_sections(sections: &[Section], format: OutputFormat) -> Option<String> {
    if format == OutputFormat::Json {
        let body: serde_json::Map<String, Value> = sections
            .iter()
            .map(|s| (s.label.to_lowercase(), s.listing.data.clone()))
            .collect();
        return Some(serde_json::to_string_pretty(&body).unwrap_or_default());
    }
    let blocks: Vec<String> = sections
        .iter()
        .filter(|s| s.listing.data.as_array().map_or(true, |rows| !rows.is_empty()))
        .map(|s| {
            let header = format!("{}:", s.label).bold();
            let body = format_output(&s.listing.data, format, s.listing.columns);
            format!("{}\n{}", header, body)
        })
        .collect();
    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

/// Hints about further pages, if any.
pub fn render_footer(result: &CmdResult) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(banner) = &result.paging {
        if let Some(line) = format_paging(&banner.label, &banner.paging) {
            lines.push(line);
        }
    }
    if let Some(cursor) = &result.next_cursor {
        lines.push(format!("More results available. Next cursor: {}", cursor));
    }
    lines
}

pub fn print_result(result: &CmdResult, format: OutputFormat) {
    // JSON consumers only want the body on stdout
    let has_body =
        result.raw.is_some() || result.listing.is_some() || !result.sections.is_empty();
    let quiet = format == OutputFormat::Json && has_body;
    for message in &result.messages {
        if quiet || message.level == MessageLevel::Warning {
            eprintln!("{}", render_message(message));
        } else {
            println!("{}", render_message(message));
        }
    }
    if let Some(body) = render_body(result, format) {
        println!("{}", body);
    }
    for line in render_footer(result) {
        eprintln!("{}", line.dimmed());
    }
}

/// `✗ message`, plus the missing and granted scopes for permission errors.
pub fn render_error(err: &HollaError) -> String {
    let mut out = format!("{} {}", "✗".red(), err);
    if let HollaError::Api {
        needed, provided, ..
    } = err
    {
        if let Some(needed) = needed {
            out.push_str(&format!("\n  Needed: {}", needed));
        }
        if let Some(provided) = provided {
            out.push_str(&format!("\n  Provided: {}", provided));
        }
    }
    out
}

pub fn print_error(err: &HollaError) {
    eprintln!("{}", render_error(err));
}
