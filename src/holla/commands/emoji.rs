use super::{CmdResult, Context};
use crate::error::Result;
use crate::output::Column;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[Column::new("name", "Name"), Column::new("url", "URL")];

/// Custom emoji, sorted by name. Aliases show as `alias:<target>`.
pub async fn list(ctx: &Context<'_>) -> Result<CmdResult> {
    let body = ctx.call("emoji.list", Default::default()).await?;
    let mut rows: Vec<Value> = body
        .get("emoji")
        .and_then(Value::as_object)
        .map(|emoji| {
            emoji
                .iter()
                .map(|(name, url)| json!({"name": name, "url": url.as_str().unwrap_or_default()}))
                .collect()
        })
        .unwrap_or_default();
    rows.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    Ok(CmdResult::default().with_listing(Value::Array(rows), LIST_COLUMNS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{format_output, OutputFormat};
    use crate::test_utils::{MockSlack, TestEnv};

    #[tokio::test]
    async fn test_list_flattens_map() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "emoji.list",
            json!({"emoji": {"shipit": "https://e.io/shipit.png", "bees": "alias:shipit"}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let listing = list(&ctx).await.unwrap().listing.unwrap();
        let plain = format_output(&listing.data, OutputFormat::Plain, listing.columns);
        assert_eq!(plain, "bees\talias:shipit\nshipit\thttps://e.io/shipit.png");
    }

    #[tokio::test]
    async fn test_list_without_custom_emoji() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("emoji.list", json!({}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let listing = list(&ctx).await.unwrap().listing.unwrap();
        assert_eq!(listing.data, json!([]));
    }
}
