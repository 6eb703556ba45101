//! Rendering of command results as table, plain text or JSON.
//!
//! Formatting is pure: functions return strings and the CLI decides where
//! they go. Tables pad by display width so CJK names and emoji line up.

use crate::config::HollaConfig;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

impl OutputFormat {
    /// Flags win, then the configured default, then [`OutputFormat::Table`].
    pub fn resolve(json: bool, plain: bool, config: &HollaConfig) -> Self {
        if json {
            OutputFormat::Json
        } else if plain {
            OutputFormat::Plain
        } else {
            config.output_format().unwrap_or_default()
        }
    }
}

/// A table column: the row key it reads and the header it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

pub fn format_output(data: &Value, format: OutputFormat, columns: Option<&[Column]>) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).unwrap_or_default(),
        OutputFormat::Plain => format_plain(data, columns),
        OutputFormat::Table => format_table(data, columns),
    }
}

fn format_plain(data: &Value, columns: Option<&[Column]>) -> String {
    match data {
        Value::Array(rows) => {
            let keys = column_keys(rows, columns);
            rows.iter()
                .map(|row| {
                    keys.iter()
                        .map(|k| cell(row.get(k.as_str())))
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}\t{}", k, cell(Some(v))))
            .collect::<Vec<_>>()
            .join("\n"),
        other => cell(Some(other)),
    }
}

fn format_table(data: &Value, columns: Option<&[Column]>) -> String {
    match data {
        Value::Array(rows) if rows.is_empty() => "No results.".to_string(),
        Value::Array(rows) => {
            let cols: Vec<(String, String)> = match columns {
                Some(cols) => cols
                    .iter()
                    .map(|c| (c.key.to_string(), c.label.to_string()))
                    .collect(),
                None => column_keys(rows, None)
                    .into_iter()
                    .map(|k| (k.clone(), k))
                    .collect(),
            };

            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| cols.iter().map(|(k, _)| cell(row.get(k.as_str()))).collect())
                .collect();

            let widths: Vec<usize> = cols
                .iter()
                .enumerate()
                .map(|(i, (_, label))| {
                    cells
                        .iter()
                        .map(|r| r[i].width())
                        .chain(std::iter::once(label.width()))
                        .max()
                        .unwrap_or(0)
                })
                .collect();

            let header = cols
                .iter()
                .zip(&widths)
                .map(|((_, label), w)| pad(label, *w).bold().to_string())
                .collect::<Vec<_>>()
                .join("  ");
            let divider = widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("──");

            let mut lines = vec![header, divider];
            for row in &cells {
                let line = row
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| pad(c, *w))
                    .collect::<Vec<_>>()
                    .join("  ");
                lines.push(line.trim_end().to_string());
            }
            lines.join("\n")
        }
        Value::Object(map) => {
            let key_width = map.keys().map(|k| k.width()).max().unwrap_or(0);
            map.iter()
                .map(|(k, v)| format!("{}  {}", pad(k, key_width).bold(), cell(Some(v))))
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => cell(Some(other)),
    }
}

fn column_keys(rows: &[Value], columns: Option<&[Column]>) -> Vec<String> {
    match columns {
        Some(cols) => cols.iter().map(|c| c.key.to_string()).collect(),
        None => rows
            .first()
            .and_then(Value::as_object)
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default(),
    }
}

/// Render one value for a table or plain cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| cell(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

/// "5 minutes ago" style age of a Slack `ts` (`"1700000000.000100"`) at `now`.
pub fn relative_time(ts: &str, now: DateTime<Utc>) -> String {
    let Some(secs) = ts.split('.').next().and_then(|s| s.parse::<i64>().ok()) else {
        return String::new();
    };
    let Some(then) = DateTime::<Utc>::from_timestamp(secs, 0) else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(then).to_std().unwrap_or_default();
    timeago::Formatter::new().convert(elapsed)
}

/// Page-numbered position in a result set, as returned by search methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `"{label}Page 2/5 (93 total results)"`, or `None` when the page is unknown.
pub fn format_paging(label: &str, paging: &Paging) -> Option<String> {
    if paging.page == 0 || paging.pages == 0 {
        return None;
    }
    let total = paging
        .total
        .map(|t| format!(" ({} total results)", t))
        .unwrap_or_default();
    Some(format!(
        "{}Page {}/{}{}",
        label, paging.page, paging.pages, total
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlackConfig;
    use serde_json::json;

    const COLS: &[Column] = &[Column::new("id", "ID"), Column::new("name", "Name")];

    fn strip(s: &str) -> String {
        let re = regex::Regex::new("\x1b\\[[0-9;]*m").unwrap();
        re.replace_all(s, "").into_owned()
    }

    #[test]
    fn test_resolve_format() {
        let config = HollaConfig::default();
        assert_eq!(OutputFormat::resolve(false, false, &config), OutputFormat::Table);
        assert_eq!(OutputFormat::resolve(true, true, &config), OutputFormat::Json);
        assert_eq!(OutputFormat::resolve(false, true, &config), OutputFormat::Plain);

        let config = HollaConfig {
            slack: Some(SlackConfig {
                output_format: Some(OutputFormat::Plain),
                attribution: None,
            }),
        };
        assert_eq!(OutputFormat::resolve(false, false, &config), OutputFormat::Plain);
        assert_eq!(OutputFormat::resolve(true, false, &config), OutputFormat::Json);
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(
            format_output(&json!([]), OutputFormat::Table, Some(COLS)),
            "No results."
        );
    }

    #[test]
    fn test_table_layout() {
        let data = json!([
            {"id": "C1", "name": "general"},
            {"id": "C22", "name": "dev"},
        ]);
        let out = strip(&format_output(&data, OutputFormat::Table, Some(COLS)));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID   Name   ");
        assert_eq!(lines[1], "─".repeat(12));
        assert_eq!(lines[2], "C1   general");
        assert_eq!(lines[3], "C22  dev");
    }

    #[test]
    fn test_table_pads_by_display_width() {
        let data = json!([{"name": "日本"}, {"name": "abcd"}]);
        let out = strip(&format_output(
            &data,
            OutputFormat::Table,
            Some(&[Column::new("name", "N"), Column::new("missing", "X")]),
        ));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], "日本");
        assert_eq!(lines[0], "N     X");
    }

    #[test]
    fn test_plain_rows_and_objects() {
        let data = json!([{"id": "U1", "name": "ana", "admin": true}]);
        assert_eq!(
            format_output(&data, OutputFormat::Plain, None),
            "true\tU1\tana"
        );
        assert_eq!(
            format_output(&json!({"a": 1, "b": "x"}), OutputFormat::Plain, None),
            "a\t1\nb\tx"
        );
        assert_eq!(format_output(&json!([]), OutputFormat::Plain, None), "");
    }

    #[test]
    fn test_plain_joins_arrays() {
        let data = json!([{"users": ["U1", "U2"]}]);
        assert_eq!(format_output(&data, OutputFormat::Plain, None), "U1, U2");
    }

    #[test]
    fn test_scalar_passthrough() {
        let url = json!("https://acme.slack.com/archives/C1/p1");
        assert_eq!(
            format_output(&url, OutputFormat::Table, None),
            "https://acme.slack.com/archives/C1/p1"
        );
    }

    #[test]
    fn test_json_pretty() {
        let out = format_output(&json!({"ok": true}), OutputFormat::Json, None);
        assert_eq!(out, "{\n  \"ok\": true\n}");
    }

    #[test]
    fn test_relative_time() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_600, 0).unwrap();
        assert_eq!(relative_time("1700000000.000100", now), "10 minutes ago");
        assert_eq!(relative_time("garbage", now), "");
        // a ts in the future still renders
        assert!(!relative_time("1700000900.1", now).is_empty());
    }

    #[test]
    fn test_paging_banner() {
        let paging = Paging {
            page: 2,
            pages: 5,
            total: Some(93),
        };
        assert_eq!(
            format_paging("Messages: ", &paging).as_deref(),
            Some("Messages: Page 2/5 (93 total results)")
        );
        let no_total = Paging {
            total: None,
            ..paging
        };
        assert_eq!(format_paging("", &no_total).as_deref(), Some("Page 2/5"));
        assert_eq!(format_paging("", &Paging::default()), None);
    }
}
