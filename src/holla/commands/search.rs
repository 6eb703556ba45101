use super::{params, preview, text_at, CmdMessage, CmdResult, Context, DEFAULT_LIMIT};
use crate::error::{HollaError, Result};
use crate::output::{Column, Paging};
use serde_json::{json, Value};

const MESSAGE_COLUMNS: &[Column] = &[
    Column::new("channel", "Channel"),
    Column::new("user", "User"),
    Column::new("ts", "Timestamp"),
    Column::new("text", "Text"),
];

const FILE_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("title", "Title"),
    Column::new("type", "Type"),
    Column::new("user", "User"),
];

const PREVIEW_CHARS: usize = 80;

/// Page-number pagination and ordering for search methods.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    /// `score` (default) or `timestamp`
    pub sort: Option<String>,
    /// `desc` (default) or `asc`
    pub sort_dir: Option<String>,
}

impl SearchOptions {
    fn validate(&self) -> Result<()> {
        if let Some(sort) = self.sort.as_deref() {
            if sort != "score" && sort != "timestamp" {
                return Err(HollaError::invalid(format!(
                    "Invalid sort: {}. Valid: score, timestamp",
                    sort
                )));
            }
        }
        if let Some(dir) = self.sort_dir.as_deref() {
            if dir != "asc" && dir != "desc" {
                return Err(HollaError::invalid(format!(
                    "Invalid sort direction: {}. Valid: asc, desc",
                    dir
                )));
            }
        }
        Ok(())
    }
}

async fn run_search(
    ctx: &Context<'_>,
    method: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<Value> {
    options.validate()?;
    ctx.call(
        method,
        params([
            ("query", json!(query)),
            ("count", json!(options.limit.unwrap_or(DEFAULT_LIMIT))),
            ("page", json!(options.page)),
            ("sort", json!(options.sort.as_deref().unwrap_or("score"))),
            ("sort_dir", json!(options.sort_dir.as_deref().unwrap_or("desc"))),
        ]),
    )
    .await
}

fn paging(body: &Value, section: &str) -> Paging {
    body.pointer(&format!("/{}/paging", section))
        .cloned()
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default()
}

fn matches<'v>(body: &'v Value, section: &str) -> &'v [Value] {
    body.pointer(&format!("/{}/matches", section))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn message_rows(body: &Value) -> Vec<Value> {
    matches(body, "messages")
        .iter()
        .map(|m| {
            json!({
                "channel": text_at(m, "/channel/name"),
                "user": text_at(m, "/username"),
                "ts": text_at(m, "/ts"),
                "text": preview(&text_at(m, "/text"), PREVIEW_CHARS),
            })
        })
        .collect()
}

fn file_rows(body: &Value) -> Vec<Value> {
    matches(body, "files")
        .iter()
        .map(|f| {
            json!({
                "id": text_at(f, "/id"),
                "name": text_at(f, "/name"),
                "title": text_at(f, "/title"),
                "type": text_at(f, "/filetype"),
                "user": text_at(f, "/user"),
            })
        })
        .collect()
}

pub async fn messages(
    ctx: &Context<'_>,
    query: &str,
    options: &SearchOptions,
) -> Result<CmdResult> {
    let body = run_search(ctx, "search.messages", query, options).await?;
    let rows = message_rows(&body);

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), MESSAGE_COLUMNS)
        .with_paging("", paging(&body, "messages")))
}

pub async fn files(ctx: &Context<'_>, query: &str, options: &SearchOptions) -> Result<CmdResult> {
    let body = run_search(ctx, "search.files", query, options).await?;
    let rows = file_rows(&body);

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), FILE_COLUMNS)
        .with_paging("", paging(&body, "files")))
}

/// Messages and files in one query, shown as two sections.
pub async fn all(ctx: &Context<'_>, query: &str, options: &SearchOptions) -> Result<CmdResult> {
    let body = run_search(ctx, "search.all", query, options).await?;
    let messages = message_rows(&body);
    let files = file_rows(&body);

    let mut result = CmdResult::default();
    if messages.is_empty() && files.is_empty() {
        result.add_message(CmdMessage::info("No results found."));
    }
    Ok(result
        .with_section("Messages", Value::Array(messages), MESSAGE_COLUMNS)
        .with_section("Files", Value::Array(files), FILE_COLUMNS)
        .with_paging("Messages: ", paging(&body, "messages")))
}
