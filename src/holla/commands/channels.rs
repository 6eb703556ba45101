use super::{collect_pages, params, text_at, value_at, CmdResult, Context, PageRequest};
use crate::error::Result;
use crate::output::{relative_time, Column};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_TYPES: &str = "public_channel,private_channel";

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("topic", "Topic"),
    Column::new("num_members", "Members"),
];

const MESSAGE_COLUMNS: &[Column] = &[
    Column::new("ts", "Timestamp"),
    Column::new("when", "When"),
    Column::new("user", "User"),
    Column::new("text", "Text"),
];

const MEMBER_COLUMNS: &[Column] = &[Column::new("id", "Member ID")];

pub async fn list(ctx: &Context<'_>, types: Option<&str>, page: &PageRequest) -> Result<CmdResult> {
    let base = params([("types", json!(types.unwrap_or(DEFAULT_TYPES)))]);
    let (channels, next) = collect_pages(ctx, "conversations.list", base, page, "channels").await?;

    let rows: Vec<Value> = channels
        .iter()
        .map(|ch| {
            json!({
                "id": text_at(ch, "/id"),
                "name": text_at(ch, "/name"),
                "topic": text_at(ch, "/topic/value"),
                "num_members": ch.get("num_members").and_then(Value::as_u64).unwrap_or(0),
            })
        })
        .collect();

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), LIST_COLUMNS)
        .with_next_cursor(next))
}

pub async fn info(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx.call("conversations.info", params([("channel", json!(id))])).await?;
    let ch = value_at(&body, "/channel");

    let data = json!({
        "id": value_at(&ch, "/id"),
        "name": value_at(&ch, "/name"),
        "is_channel": value_at(&ch, "/is_channel"),
        "is_private": value_at(&ch, "/is_private"),
        "is_archived": value_at(&ch, "/is_archived"),
        "created": value_at(&ch, "/created"),
        "creator": value_at(&ch, "/creator"),
        "num_members": value_at(&ch, "/num_members"),
        "topic": text_at(&ch, "/topic/value"),
        "purpose": text_at(&ch, "/purpose/value"),
    });
    Ok(CmdResult::default().with_data(data))
}

/// Messages in a channel, newest first. `before` maps to Slack's `latest`.
pub async fn history(
    ctx: &Context<'_>,
    channel: &str,
    before: Option<&str>,
    page: &PageRequest,
) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let base = params([("channel", json!(id)), ("latest", json!(before))]);
    let (messages, next) =
        collect_pages(ctx, "conversations.history", base, page, "messages").await?;

    Ok(CmdResult::default()
        .with_listing(message_rows(ctx, &messages).await, MESSAGE_COLUMNS)
        .with_next_cursor(next))
}

/// A thread: the parent message and its replies.
pub async fn replies(
    ctx: &Context<'_>,
    channel: &str,
    ts: &str,
    page: &PageRequest,
) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let base = params([("channel", json!(id)), ("ts", json!(ts))]);
    let (messages, next) =
        collect_pages(ctx, "conversations.replies", base, page, "messages").await?;

    Ok(CmdResult::default()
        .with_listing(message_rows(ctx, &messages).await, MESSAGE_COLUMNS)
        .with_next_cursor(next))
}

/// Table rows for messages, with user IDs shown as names.
async fn message_rows(ctx: &Context<'_>, messages: &[Value]) -> Value {
    let now = Utc::now();
    let mut names: HashMap<String, String> = HashMap::new();
    let mut rows = Vec::with_capacity(messages.len());

    for msg in messages {
        let user_id = text_at(msg, "/user");
        let user = if user_id.is_empty() {
            text_at(msg, "/username")
        } else if let Some(name) = names.get(&user_id) {
            name.clone()
        } else {
            let name = ctx.resolver().resolve_user_name(&user_id).await;
            names.insert(user_id.clone(), name.clone());
            name
        };
        let ts = text_at(msg, "/ts");
        rows.push(json!({
            "ts": ts,
            "when": relative_time(&ts, now),
            "user": user,
            "user_id": user_id,
            "text": text_at(msg, "/text"),
        }));
    }
    Value::Array(rows)
}

pub async fn members(ctx: &Context<'_>, channel: &str, page: &PageRequest) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let base = params([("channel", json!(id))]);
    let (members, next) =
        collect_pages(ctx, "conversations.members", base, page, "members").await?;

    let rows: Vec<Value> = members.into_iter().map(|m| json!({"id": m})).collect();
    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), MEMBER_COLUMNS)
        .with_next_cursor(next))
}

pub async fn join(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx.call("conversations.join", params([("channel", json!(id))])).await?;
    let name = text_at(&body, "/channel/name");
    Ok(CmdResult::success(if name.is_empty() {
        format!("Joined {}", id)
    } else {
        format!("Joined #{}", name)
    }))
}

pub async fn leave(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call("conversations.leave", params([("channel", json!(id))]))
        .await?;
    Ok(CmdResult::success(format!("Left {}", channel)))
}

/// Invite a comma-separated list of users.
pub async fn invite(ctx: &Context<'_>, channel: &str, users: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let user_ids = ctx.resolver().resolve_users(users).await?;
    ctx.call(
        "conversations.invite",
        params([("channel", json!(id)), ("users", json!(user_ids.join(",")))]),
    )
    .await?;
    let noun = if user_ids.len() == 1 { "User" } else { "Users" };
    Ok(CmdResult::success(format!("{} invited to channel", noun)))
}

pub async fn kick(ctx: &Context<'_>, channel: &str, user: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let user_id = ctx.resolver().resolve_user(user).await?;
    ctx.call(
        "conversations.kick",
        params([("channel", json!(id)), ("user", json!(user_id))]),
    )
    .await?;
    Ok(CmdResult::success("User removed from channel"))
}

pub async fn create(ctx: &Context<'_>, name: &str, private: bool) -> Result<CmdResult> {
    let name = name.trim_start_matches('#');
    let body = ctx
        .call(
            "conversations.create",
            params([("name", json!(name)), ("is_private", json!(private))]),
        )
        .await?;
    let created = text_at(&body, "/channel/name");
    let id = text_at(&body, "/channel/id");
    Ok(CmdResult::success(format!(
        "Channel created: #{} ({})",
        if created.is_empty() { name } else { &created },
        if id.is_empty() { "unknown" } else { &id }
    )))
}

pub async fn archive(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call("conversations.archive", params([("channel", json!(id))]))
        .await?;
    Ok(CmdResult::success(format!("Channel {} archived", channel)))
}

pub async fn unarchive(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call("conversations.unarchive", params([("channel", json!(id))]))
        .await?;
    Ok(CmdResult::success(format!("Channel {} unarchived", channel)))
}

pub async fn set_topic(ctx: &Context<'_>, channel: &str, topic: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "conversations.setTopic",
        params([("channel", json!(id)), ("topic", json!(topic))]),
    )
    .await?;
    Ok(CmdResult::success("Channel topic updated"))
}

pub async fn set_purpose(ctx: &Context<'_>, channel: &str, purpose: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "conversations.setPurpose",
        params([("channel", json!(id)), ("purpose", json!(purpose))]),
    )
    .await?;
    Ok(CmdResult::success("Channel purpose updated"))
}

pub async fn mark_read(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "conversations.mark",
        params([("channel", json!(id)), ("ts", json!(ts))]),
    )
    .await?;
    Ok(CmdResult::success("Channel marked as read"))
}
