use super::{params, text_at, value_at, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::output::Column;
use serde_json::{json, Value};

const TEAM_COLUMNS: &[Column] = &[
    Column::new("user", "User"),
    Column::new("dnd_enabled", "DND Enabled"),
    Column::new("next_dnd_start_ts", "Next Start"),
    Column::new("next_dnd_end_ts", "Next End"),
];

/// Do-not-disturb state for `user`, or for the token's own user.
pub async fn status(ctx: &Context<'_>, user: Option<&str>) -> Result<CmdResult> {
    let user_id = match user {
        Some(u) => Some(ctx.resolver().resolve_user(u).await?),
        None => None,
    };
    let body = ctx.call("dnd.info", params([("user", json!(user_id))])).await?;
    Ok(CmdResult::default().with_data(json!({
        "dnd_enabled": value_at(&body, "/dnd_enabled"),
        "next_dnd_start_ts": value_at(&body, "/next_dnd_start_ts"),
        "next_dnd_end_ts": value_at(&body, "/next_dnd_end_ts"),
        "snooze_enabled": value_at(&body, "/snooze_enabled"),
        "snooze_endtime": value_at(&body, "/snooze_endtime"),
        "snooze_remaining": value_at(&body, "/snooze_remaining"),
    })))
}

pub async fn snooze(ctx: &Context<'_>, minutes: &str) -> Result<CmdResult> {
    let minutes: u32 = minutes
        .trim()
        .parse()
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| HollaError::invalid(format!("Invalid number of minutes: {}", minutes)))?;
    ctx.call("dnd.setSnooze", params([("num_minutes", json!(minutes))]))
        .await?;
    Ok(CmdResult::success(format!("DND snoozed for {} minutes", minutes)))
}

pub async fn end(ctx: &Context<'_>) -> Result<CmdResult> {
    ctx.call("dnd.endDnd", Default::default()).await?;
    Ok(CmdResult::success("DND mode ended"))
}

/// Cut a snooze short without touching scheduled do-not-disturb.
pub async fn unsnooze(ctx: &Context<'_>) -> Result<CmdResult> {
    ctx.call("dnd.endSnooze", Default::default()).await?;
    Ok(CmdResult::success("DND snooze ended"))
}

/// Do-not-disturb state for several users (comma-separated IDs or @names).
pub async fn team(ctx: &Context<'_>, users: &str) -> Result<CmdResult> {
    let mut ids = Vec::new();
    for user in users.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        ids.push(ctx.resolver().resolve_user(user).await?);
    }
    if ids.is_empty() {
        return Err(HollaError::invalid("Provide at least one user"));
    }
    let body = ctx
        .call("dnd.teamInfo", params([("users", json!(ids.join(",")))]))
        .await?;

    let rows: Vec<Value> = body
        .get("users")
        .and_then(Value::as_object)
        .map(|users| {
            users
                .iter()
                .map(|(id, info)| {
                    let enabled = info.get("dnd_enabled").and_then(Value::as_bool);
                    json!({
                        "user": id,
                        "dnd_enabled": enabled.unwrap_or(false),
                        "next_dnd_start_ts": text_at(info, "/next_dnd_start_ts"),
                        "next_dnd_end_ts": text_at(info, "/next_dnd_end_ts"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CmdResult::default().with_listing(Value::Array(rows), TEAM_COLUMNS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSlack, TestEnv};

    #[tokio::test]
    async fn test_status_for_self_sends_no_user() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "dnd.info",
            json!({"dnd_enabled": true, "snooze_enabled": false}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = status(&ctx, None).await.unwrap().listing.unwrap().data;
        assert_eq!(data["dnd_enabled"], true);
        assert!(api.calls_to("dnd.info")[0].get("user").is_none());
    }

    #[tokio::test]
    async fn test_snooze_validates_minutes() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");

        assert!(snooze(&ctx, "soon").await.is_err());
        assert!(snooze(&ctx, "0").await.is_err());
        let result = snooze(&ctx, "30").await.unwrap();
        assert_eq!(result.messages[0].content, "DND snoozed for 30 minutes");
        assert_eq!(api.calls_to("dnd.setSnooze")[0]["num_minutes"], 30);
    }

    #[tokio::test]
    async fn test_unsnooze() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = unsnooze(&ctx).await.unwrap();
        assert_eq!(result.messages[0].content, "DND snooze ended");
        assert_eq!(api.call_count("dnd.endSnooze"), 1);
        assert_eq!(api.call_count("dnd.endDnd"), 0);
    }

    #[tokio::test]
    async fn test_team_resolves_users() {
        let env = TestEnv::new();
        let api = MockSlack::new().with_users(&[("ana", "U1")]).respond(
            "dnd.teamInfo",
            json!({"users": {"U1": {"dnd_enabled": true, "next_dnd_start_ts": 1700000000},
                "U2": {}}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = team(&ctx, "@ana, U2").await.unwrap().listing.unwrap().data;
        assert_eq!(api.calls_to("dnd.teamInfo")[0]["users"], "U1,U2");
        assert_eq!(data[0]["user"], "U1");
        assert_eq!(data[0]["next_dnd_start_ts"], "1700000000");
        assert_eq!(data[1]["dnd_enabled"], false);

        assert!(team(&ctx, " , ").await.is_err());
    }
}
