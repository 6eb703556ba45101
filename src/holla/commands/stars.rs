//! Saved items. Slack still calls them stars; they need a user token.

use super::{params, text_at, CmdResult, Context, PageRequest, DEFAULT_LIMIT};
use crate::error::{HollaError, Result};
use crate::output::Column;
use crate::slack::types::Params;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("type", "Type"),
    Column::new("channel", "Channel"),
    Column::new("ts", "Timestamp"),
    Column::new("text", "Text"),
    Column::new("date_create", "Starred At"),
];

/// What to star: a message (channel and ts) or a file.
#[derive(Debug, Clone, Default)]
pub struct StarTarget {
    pub channel: Option<String>,
    pub ts: Option<String>,
    pub file: Option<String>,
}

async fn target_params(ctx: &Context<'_>, target: &StarTarget) -> Result<Params> {
    let channel = match (&target.channel, &target.ts, &target.file) {
        (Some(channel), Some(_), _) => Some(ctx.resolver().resolve_channel(channel).await?),
        (None, None, Some(_)) => None,
        _ => {
            return Err(HollaError::invalid(
                "Provide --channel with --ts for a message, or --file for a file",
            ))
        }
    };
    Ok(params([
        ("channel", json!(channel)),
        ("timestamp", json!(target.ts)),
        ("file", json!(target.file)),
    ]))
}

pub async fn add(ctx: &Context<'_>, target: &StarTarget) -> Result<CmdResult> {
    let request = target_params(ctx, target).await?;
    ctx.call("stars.add", request).await?;
    Ok(CmdResult::success("Item starred"))
}

pub async fn remove(ctx: &Context<'_>, target: &StarTarget) -> Result<CmdResult> {
    let request = target_params(ctx, target).await?;
    ctx.call("stars.remove", request).await?;
    Ok(CmdResult::success("Star removed"))
}

/// One page of starred items. `stars.list` pages with `count`, not `limit`.
pub async fn list(ctx: &Context<'_>, page: &PageRequest) -> Result<CmdResult> {
    let body = ctx
        .call(
            "stars.list",
            params([
                ("count", json!(page.limit.unwrap_or(DEFAULT_LIMIT))),
                ("cursor", json!(page.cursor)),
            ]),
        )
        .await?;

    let rows: Vec<Value> = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(star_row).collect())
        .unwrap_or_default();
    let next = body
        .pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), LIST_COLUMNS)
        .with_next_cursor(next))
}

fn star_row(item: &Value) -> Value {
    let channel = match text_at(item, "/message/channel") {
        c if c.is_empty() => text_at(item, "/channel"),
        c => c,
    };
    let text = match text_at(item, "/message/text") {
        t if t.is_empty() => text_at(item, "/file/name"),
        t => t,
    };
    json!({
        "type": text_at(item, "/type"),
        "channel": channel,
        "ts": text_at(item, "/message/ts"),
        "text": text,
        "date_create": text_at(item, "/date_create"),
    })
}
