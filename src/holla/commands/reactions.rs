use super::{params, preview, text_at, CmdResult, Context, PageRequest, DEFAULT_LIMIT};
use crate::error::Result;
use crate::output::Column;
use serde_json::{json, Value};

const REACTION_COLUMNS: &[Column] = &[
    Column::new("name", "Emoji"),
    Column::new("count", "Count"),
    Column::new("users", "Users"),
];

const ITEM_COLUMNS: &[Column] = &[
    Column::new("type", "Type"),
    Column::new("channel", "Channel"),
    Column::new("ts", "Timestamp"),
    Column::new("text", "Text"),
    Column::new("reactions", "Reactions"),
];

const PREVIEW_CHARS: usize = 80;

fn emoji_name(name: &str) -> &str {
    name.trim_matches(':')
}

pub async fn add(ctx: &Context<'_>, channel: &str, ts: &str, name: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let name = emoji_name(name);
    ctx.call(
        "reactions.add",
        params([
            ("channel", json!(id)),
            ("timestamp", json!(ts)),
            ("name", json!(name)),
        ]),
    )
    .await?;
    Ok(CmdResult::success(format!("Reaction :{}: added", name)))
}

pub async fn remove(ctx: &Context<'_>, channel: &str, ts: &str, name: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let name = emoji_name(name);
    ctx.call(
        "reactions.remove",
        params([
            ("channel", json!(id)),
            ("timestamp", json!(ts)),
            ("name", json!(name)),
        ]),
    )
    .await?;
    Ok(CmdResult::success(format!("Reaction :{}: removed", name)))
}

pub async fn get(ctx: &Context<'_>, channel: &str, ts: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx
        .call(
            "reactions.get",
            params([
                ("channel", json!(id)),
                ("timestamp", json!(ts)),
                ("full", json!(true)),
            ]),
        )
        .await?;

    let rows: Vec<Value> = body
        .pointer("/message/reactions")
        .and_then(Value::as_array)
        .map(|reactions| {
            reactions
                .iter()
                .map(|r| {
                    json!({
                        "name": r.get("name").cloned().unwrap_or(Value::Null),
                        "count": r.get("count").cloned().unwrap_or(json!(0)),
                        "users": r.get("users").cloned().unwrap_or(json!([])),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CmdResult::default().with_listing(Value::Array(rows), REACTION_COLUMNS))
}

/// Items a user (default: the token's user) has reacted to.
pub async fn list(ctx: &Context<'_>, user: Option<&str>, page: &PageRequest) -> Result<CmdResult> {
    let user_id = match user {
        Some(u) => Some(ctx.resolver().resolve_user(u).await?),
        None => None,
    };
    let body = ctx
        .call(
            "reactions.list",
            params([
                ("limit", json!(page.limit.unwrap_or(DEFAULT_LIMIT))),
                ("full", json!(true)),
                ("user", json!(user_id)),
                ("cursor", json!(page.cursor)),
            ]),
        )
        .await?;

    let rows: Vec<Value> = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(reacted_item).collect())
        .unwrap_or_default();
    let next = body
        .pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), ITEM_COLUMNS)
        .with_next_cursor(next))
}

fn reacted_item(item: &Value) -> Value {
    let reactions = item
        .pointer("/message/reactions")
        .and_then(Value::as_array)
        .map(|reactions| {
            reactions
                .iter()
                .map(|r| format!(":{}: ({})", text_at(r, "/name"), text_at(r, "/count")))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    json!({
        "type": text_at(item, "/type"),
        "channel": text_at(item, "/channel"),
        "ts": text_at(item, "/message/ts"),
        "text": preview(&text_at(item, "/message/text"), PREVIEW_CHARS),
        "reactions": reactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{format_output, OutputFormat};
    use crate::test_utils::{MockSlack, TestEnv};

    #[tokio::test]
    async fn test_add_strips_colons() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = add(&ctx, "C1", "1.0", ":tada:").await.unwrap();
        assert_eq!(result.messages[0].content, "Reaction :tada: added");
        assert_eq!(api.calls_to("reactions.add")[0]["name"], "tada");
    }

    #[tokio::test]
    async fn test_get_lists_reactions() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "reactions.get",
            json!({"message": {"reactions": [{"name": "eyes", "count": 2, "users": ["U1", "U2"]}]}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let listing = get(&ctx, "C1", "1.0").await.unwrap().listing.unwrap();
        let plain = format_output(&listing.data, OutputFormat::Plain, listing.columns);
        assert_eq!(plain, "eyes\t2\tU1, U2");
    }

    #[tokio::test]
    async fn test_list_summarises_reactions() {
        let env = TestEnv::new();
        let api = MockSlack::new().with_users(&[("ana", "U1")]).respond(
            "reactions.list",
            json!({"items": [{"type": "message", "channel": "C1",
                "message": {"ts": "1.0", "text": "launch day",
                    "reactions": [{"name": "tada", "count": 3}, {"name": "eyes", "count": 1}]}}]}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = list(&ctx, Some("@ana"), &PageRequest::default()).await.unwrap();
        let data = result.listing.unwrap().data;
        assert_eq!(data[0]["reactions"], ":tada: (3), :eyes: (1)");
        assert_eq!(data[0]["channel"], "C1");
        assert_eq!(result.next_cursor, None);

        let call = &api.calls_to("reactions.list")[0];
        assert_eq!(call["user"], "U1");
        assert_eq!(call["full"], true);
        assert_eq!(call["limit"], DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn test_get_without_reactions() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("reactions.get", json!({"message": {}}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let listing = get(&ctx, "C1", "1.0").await.unwrap().listing.unwrap();
        assert_eq!(listing.data, json!([]));
    }
}
