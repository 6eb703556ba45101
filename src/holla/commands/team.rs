use super::{text_at, value_at, CmdResult, Context};
use crate::error::Result;
use crate::output::Column;
use serde_json::{json, Value};

const PROFILE_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("label", "Label"),
    Column::new("type", "Type"),
    Column::new("hint", "Hint"),
    Column::new("ordering", "Order"),
];

pub async fn info(ctx: &Context<'_>) -> Result<CmdResult> {
    let body = ctx.call("team.info", Default::default()).await?;
    let team = value_at(&body, "/team");
    Ok(CmdResult::default().with_data(json!({
        "id": value_at(&team, "/id"),
        "name": value_at(&team, "/name"),
        "domain": value_at(&team, "/domain"),
        "email_domain": value_at(&team, "/email_domain"),
    })))
}

/// Custom profile fields defined for the workspace.
pub async fn profile_fields(ctx: &Context<'_>) -> Result<CmdResult> {
    let body = ctx.call("team.profile.get", Default::default()).await?;
    let rows: Vec<Value> = body
        .pointer("/profile/fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .map(|f| {
                    json!({
                        "id": text_at(f, "/id"),
                        "label": text_at(f, "/label"),
                        "type": text_at(f, "/type"),
                        "hint": text_at(f, "/hint"),
                        "ordering": text_at(f, "/ordering"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CmdResult::default().with_listing(Value::Array(rows), PROFILE_COLUMNS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSlack, TestEnv};

    #[tokio::test]
    async fn test_info_fields() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "team.info",
            json!({"team": {"id": "T1", "name": "Acme", "domain": "acme", "icon": {}}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = info(&ctx).await.unwrap().listing.unwrap().data;
        assert_eq!(data["domain"], "acme");
        assert_eq!(data["email_domain"], serde_json::Value::Null);
        assert!(data.get("icon").is_none());
    }

    #[tokio::test]
    async fn test_profile_fields() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "team.profile.get",
            json!({"profile": {"fields": [{"id": "Xf1", "label": "Pronouns", "type": "text", "ordering": 0}]}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = profile_fields(&ctx).await.unwrap().listing.unwrap().data;
        assert_eq!(data[0]["label"], "Pronouns");
        assert_eq!(data[0]["ordering"], "0");
        assert_eq!(data[0]["hint"], "");
    }
}
