use super::{params, text_at, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::slack::attribution::{add_reaction, AttributionConfig};
use crate::slack::text::{normalize_slack_text, LinkStyle};
use serde_json::{json, Value};

/// Message text after shell-escape clean-up; empty input is an error.
fn message_text(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(HollaError::invalid(
            "No message provided. Use --message or pipe via stdin.",
        ));
    }
    Ok(normalize_slack_text(text, LinkStyle::Slack))
}

async fn post(
    ctx: &Context<'_>,
    channel: &str,
    text: &str,
    thread_ts: Option<&str>,
    attribution: &AttributionConfig,
) -> Result<String> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let text = attribution.decorate(&message_text(text)?);
    let body = ctx
        .call(
            "chat.postMessage",
            params([
                ("channel", json!(id)),
                ("text", json!(text)),
                ("thread_ts", json!(thread_ts)),
            ]),
        )
        .await?;

    let ts = text_at(&body, "/ts");
    if let Some(emoji) = &attribution.reaction {
        // the API echoes the channel ID even when a name was posted to
        let posted_in = text_at(&body, "/channel");
        let posted_in = if posted_in.is_empty() { id } else { posted_in };
        add_reaction(ctx.api(), &posted_in, &ts, emoji).await;
    }
    Ok(ts)
}

pub async fn send(
    ctx: &Context<'_>,
    channel: &str,
    text: &str,
    attribution: &AttributionConfig,
) -> Result<CmdResult> {
    let ts = post(ctx, channel, text, None, attribution).await?;
    Ok(CmdResult::success(format!("Message sent (ts: {})", ts)))
}

pub async fn reply(
    ctx: &Context<'_>,
    channel: &str,
    thread_ts: &str,
    text: &str,
    attribution: &AttributionConfig,
) -> Result<CmdResult> {
    let ts = post(ctx, channel, text, Some(thread_ts), attribution).await?;
    Ok(CmdResult::success(format!("Reply sent (ts: {})", ts)))
}

/// A single message, looked up by its timestamp.
pub async fn get(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx
        .call(
            "conversations.history",
            params([
                ("channel", json!(id)),
                ("latest", json!(ts)),
                ("oldest", json!(ts)),
                ("inclusive", json!(true)),
                ("limit", json!(1)),
            ]),
        )
        .await?;

    let msg = body
        .pointer("/messages/0")
        .ok_or_else(|| HollaError::invalid(format!("Message not found: {}", ts)))?;
    Ok(CmdResult::default().with_data(json!({
        "ts": text_at(msg, "/ts"),
        "user": text_at(msg, "/user"),
        "text": text_at(msg, "/text"),
    })))
}

pub async fn edit(ctx: &Context<'_>, channel: &str, ts: &str, text: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let text = message_text(text)?;
    let body = ctx
        .call(
            "chat.update",
            params([("channel", json!(id)), ("ts", json!(ts)), ("text", json!(text))]),
        )
        .await?;
    Ok(CmdResult::success(format!(
        "Message updated (ts: {})",
        text_at(&body, "/ts")
    )))
}

pub async fn delete(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "chat.delete",
        params([("channel", json!(id)), ("ts", json!(ts))]),
    )
    .await?;
    Ok(CmdResult::success(format!("Message deleted (ts: {})", ts)))
}

pub async fn permalink(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx
        .call(
            "chat.getPermalink",
            params([("channel", json!(id)), ("message_ts", json!(ts))]),
        )
        .await?;
    Ok(CmdResult::default().with_data(json!(text_at(&body, "/permalink"))))
}

/// Attach link previews to a message. `unfurls` is a JSON object keyed by URL.
pub async fn unfurl(
    ctx: &Context<'_>,
    channel: &str,
    ts: &str,
    unfurls: &str,
) -> Result<CmdResult> {
    let unfurls: Value = serde_json::from_str(unfurls)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| HollaError::invalid("--unfurls must be a JSON object"))?;
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "chat.unfurl",
        params([("channel", json!(id)), ("ts", json!(ts)), ("unfurls", unfurls)]),
    )
    .await?;
    Ok(CmdResult::success(format!("Unfurl data provided (ts: {})", ts)))
}

/// Schedule `text` for `post_at` (unix seconds).
pub async fn schedule(
    ctx: &Context<'_>,
    channel: &str,
    text: &str,
    post_at: &str,
) -> Result<CmdResult> {
    let post_at: i64 = post_at
        .trim()
        .parse()
        .map_err(|_| HollaError::invalid(format!("Invalid unix timestamp: {}", post_at)))?;
    let id = ctx.resolver().resolve_channel(channel).await?;
    let text = message_text(text)?;
    let body = ctx
        .call(
            "chat.scheduleMessage",
            params([
                ("channel", json!(id)),
                ("text", json!(text)),
                ("post_at", json!(post_at)),
            ]),
        )
        .await?;
    Ok(CmdResult::success(format!(
        "Message scheduled (id: {}, post_at: {})",
        text_at(&body, "/scheduled_message_id"),
        text_at(&body, "/post_at")
    )))
}

/// Ephemeral message only `user` can see.
pub async fn whisper(
    ctx: &Context<'_>,
    channel: &str,
    user: &str,
    text: &str,
) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let user_id = ctx.resolver().resolve_user(user).await?;
    let text = message_text(text)?;
    let body = ctx
        .call(
            "chat.postEphemeral",
            params([
                ("channel", json!(id)),
                ("user", json!(user_id)),
                ("text", json!(text)),
            ]),
        )
        .await?;
    Ok(CmdResult::success(format!(
        "Ephemeral message sent (ts: {})",
        text_at(&body, "/message_ts")
    )))
}
