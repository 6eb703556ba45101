use super::{params, text_at, value_at, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::output::Column;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("text", "Text"),
    Column::new("time", "Time"),
    Column::new("complete_ts", "Completed"),
];

pub async fn list(ctx: &Context<'_>) -> Result<CmdResult> {
    let body = ctx.call("reminders.list", Default::default()).await?;
    let rows: Vec<Value> = body
        .get("reminders")
        .and_then(Value::as_array)
        .map(|reminders| {
            reminders
                .iter()
                .map(|r| {
                    json!({
                        "id": text_at(r, "/id"),
                        "text": text_at(r, "/text"),
                        "time": text_at(r, "/time"),
                        "complete_ts": text_at(r, "/complete_ts"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CmdResult::default().with_listing(Value::Array(rows), LIST_COLUMNS))
}

/// `time` is anything Slack understands: unix seconds, "in 5 minutes", "tomorrow".
pub async fn add(ctx: &Context<'_>, text: &str, time: &str) -> Result<CmdResult> {
    let body = ctx
        .call(
            "reminders.add",
            params([("text", json!(text)), ("time", json!(time))]),
        )
        .await?;
    let id = text_at(&body, "/reminder/id");
    Ok(CmdResult::success(format!(
        "Reminder added (id: {})",
        if id.is_empty() { "unknown" } else { &id }
    )))
}

pub async fn info(ctx: &Context<'_>, reminder: &str) -> Result<CmdResult> {
    let body = ctx
        .call("reminders.info", params([("reminder", json!(reminder))]))
        .await?;
    let r = body
        .get("reminder")
        .ok_or_else(|| HollaError::invalid(format!("Reminder not found: {}", reminder)))?;
    Ok(CmdResult::default().with_data(json!({
        "id": value_at(r, "/id"),
        "text": value_at(r, "/text"),
        "creator": value_at(r, "/creator"),
        "user": value_at(r, "/user"),
        "time": value_at(r, "/time"),
        "complete_ts": value_at(r, "/complete_ts"),
        "recurring": value_at(r, "/recurring"),
    })))
}

pub async fn complete(ctx: &Context<'_>, reminder: &str) -> Result<CmdResult> {
    ctx.call("reminders.complete", params([("reminder", json!(reminder))]))
        .await?;
    Ok(CmdResult::success(format!("Reminder {} marked as complete", reminder)))
}

pub async fn delete(ctx: &Context<'_>, reminder: &str) -> Result<CmdResult> {
    ctx.call("reminders.delete", params([("reminder", json!(reminder))]))
        .await?;
    Ok(CmdResult::success(format!("Reminder {} deleted", reminder)))
}
