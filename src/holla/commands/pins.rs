use super::{params, text_at, CmdResult, Context};
use crate::error::Result;
use crate::output::Column;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("type", "Type"),
    Column::new("ts", "Timestamp"),
    Column::new("user", "User"),
    Column::new("text", "Text"),
    Column::new("created", "Pinned At"),
];

pub async fn add(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "pins.add",
        params([("channel", json!(id)), ("timestamp", json!(ts))]),
    )
    .await?;
    Ok(CmdResult::success(format!("Message pinned (ts: {})", ts)))
}

pub async fn remove(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "pins.remove",
        params([("channel", json!(id)), ("timestamp", json!(ts))]),
    )
    .await?;
    Ok(CmdResult::success(format!("Message unpinned (ts: {})", ts)))
}

pub async fn list(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx.call("pins.list", params([("channel", json!(id))])).await?;

    let rows: Vec<Value> = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    json!({
                        "type": text_at(item, "/type"),
                        "created": text_at(item, "/created"),
                        "user": text_at(item, "/message/user"),
                        "ts": text_at(item, "/message/ts"),
                        "text": text_at(item, "/message/text"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CmdResult::default().with_listing(Value::Array(rows), LIST_COLUMNS))
}
