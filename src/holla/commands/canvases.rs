//! Canvas commands. Markdown goes through the canvas sanitizer before upload
//! because the canvas API rejects bullets nested under numbered items.

use super::{params, text_at, CmdMessage, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::output::Column;
use crate::slack::text::{normalize_slack_text, sanitize_canvas_markdown, LinkStyle};
use crate::slack::types::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

static CANVAS_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/]+\.slack\.com/docs/[^/]+/([A-Z][A-Z0-9]+)")
        .expect("valid canvas link pattern")
});

pub const ACCESS_LEVELS: &[&str] = &["read", "write"];

pub const EDIT_OPERATIONS: &[&str] = &[
    "insert_at_start",
    "insert_at_end",
    "insert_before",
    "insert_after",
    "replace",
    "delete",
];

const SECTION_COLUMNS: &[Column] = &[Column::new("id", "Section ID"), Column::new("type", "Type")];

const SANITIZED_WARNING: &str =
    "Nested bullets under numbered items were converted to numbered sub-items";

/// Markdown ready for the canvas API, plus a warning when it had to be rewritten.
fn prepare_markdown(markdown: &str) -> (Value, Option<CmdMessage>) {
    let normalized = normalize_slack_text(markdown, LinkStyle::Markdown);
    let sanitized = sanitize_canvas_markdown(&normalized);
    let warning = sanitized
        .modified
        .then(|| CmdMessage::warning(SANITIZED_WARNING));
    (
        json!({"type": "markdown", "markdown": sanitized.markdown}),
        warning,
    )
}

/// `https://{domain}.slack.com/docs/{team}/{canvas}` from an `auth.test` URL.
fn canvas_url(team_url: &str, team_id: &str, canvas_id: &str) -> Option<String> {
    let domain = team_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .trim_end_matches(".slack.com");
    if domain.is_empty() || team_id.is_empty() {
        return None;
    }
    Some(format!(
        "https://{}.slack.com/docs/{}/{}",
        domain, team_id, canvas_id
    ))
}

/// The canvas ID from a `https://<team>.slack.com/docs/<team>/<id>` link;
/// anything else is taken to be an ID already.
fn parse_canvas_id(input: &str) -> &str {
    CANVAS_LINK
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map_or(input, |m| m.as_str())
}

pub async fn create(
    ctx: &Context<'_>,
    title: Option<&str>,
    markdown: Option<&str>,
) -> Result<CmdResult> {
    let auth = ctx.api().auth_test().await?;

    let mut result = CmdResult::default();
    let content = markdown.map(|md| {
        let (content, warning) = prepare_markdown(md);
        if let Some(w) = warning {
            result.add_message(w);
        }
        content
    });

    let body = ctx
        .call(
            "canvases.create",
            params([("title", json!(title)), ("document_content", json!(content))]),
        )
        .await?;

    let canvas_id = text_at(&body, "/canvas_id");
    let canvas_id = if canvas_id.is_empty() {
        "unknown".to_string()
    } else {
        canvas_id
    };
    result.add_message(CmdMessage::success(format!(
        "Canvas created: {} ({})",
        title.unwrap_or("(untitled)"),
        canvas_id
    )));
    if let Some(url) = canvas_url(
        auth.url.as_deref().unwrap_or_default(),
        auth.team_id.as_deref().unwrap_or_default(),
        &canvas_id,
    ) {
        result.add_message(CmdMessage::info(format!("  {}", url)));
    }
    Ok(result)
}

/// One change to an existing canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasEdit {
    pub operation: String,
    pub markdown: Option<String>,
    pub section_id: Option<String>,
}

pub async fn edit(ctx: &Context<'_>, canvas: &str, change: &CanvasEdit) -> Result<CmdResult> {
    if !EDIT_OPERATIONS.contains(&change.operation.as_str()) {
        return Err(HollaError::invalid(format!(
            "Invalid operation: {}. Valid: {}",
            change.operation,
            EDIT_OPERATIONS.join(", ")
        )));
    }

    let mut result = CmdResult::default();
    let content = change.markdown.as_deref().map(|md| {
        let (content, warning) = prepare_markdown(md);
        if let Some(w) = warning {
            result.add_message(w);
        }
        content
    });

    let payload = params([
        ("operation", json!(change.operation)),
        ("document_content", json!(content)),
        ("section_id", json!(change.section_id)),
    ]);
    ctx.call(
        "canvases.edit",
        params([("canvas_id", json!(canvas)), ("changes", json!([payload]))]),
    )
    .await?;

    result.add_message(CmdMessage::success(format!(
        "Canvas {} updated ({})",
        canvas, change.operation
    )));
    Ok(result)
}

pub async fn delete(ctx: &Context<'_>, canvas: &str) -> Result<CmdResult> {
    ctx.call("canvases.delete", params([("canvas_id", json!(canvas))]))
        .await?;
    Ok(CmdResult::success(format!("Canvas {} deleted", canvas)))
}

/// Canvas contents as markdown. Canvases are files whose download is HTML.
pub async fn read(ctx: &Context<'_>, canvas: &str) -> Result<CmdResult> {
    let id = parse_canvas_id(canvas);
    let body = ctx.call("files.info", params([("file", json!(id))])).await?;
    let file = body
        .get("file")
        .ok_or_else(|| HollaError::invalid(format!("Canvas not found: {}", id)))?;
    let url = file
        .get("url_private_download")
        .or_else(|| file.get("url_private"))
        .and_then(Value::as_str)
        .ok_or_else(|| HollaError::invalid(format!("Canvas {} has no download URL", id)))?;

    debug!(canvas = id, url, "fetching canvas html");
    let html = ctx.api().download(url).await?;
    let markdown = htmd::convert(&String::from_utf8_lossy(&html))?;

    Ok(CmdResult::default()
        .with_data(json!({
            "id": text_at(file, "/id"),
            "title": text_at(file, "/title"),
            "markdown": markdown,
            "created": file.get("created").cloned().unwrap_or(Value::Null),
            "updated": file.get("updated").cloned().unwrap_or(Value::Null),
        }))
        .with_document(markdown))
}

/// Who a canvas is shared with: channels and/or users, comma-separated.
#[derive(Debug, Clone, Default)]
pub struct AccessTargets {
    pub channels: Option<String>,
    pub users: Option<String>,
}

async fn access_params(
    ctx: &Context<'_>,
    canvas: &str,
    targets: &AccessTargets,
) -> Result<Params> {
    if targets.channels.is_none() && targets.users.is_none() {
        return Err(HollaError::invalid("Provide --channels, --users or both"));
    }
    let mut channel_ids = Vec::new();
    for channel in split_list(targets.channels.as_deref()) {
        channel_ids.push(ctx.resolver().resolve_channel(channel).await?);
    }
    let mut user_ids = Vec::new();
    for user in split_list(targets.users.as_deref()) {
        user_ids.push(ctx.resolver().resolve_user(user).await?);
    }
    Ok(params([
        ("canvas_id", json!(parse_canvas_id(canvas))),
        ("channel_ids", json!((!channel_ids.is_empty()).then_some(channel_ids))),
        ("user_ids", json!((!user_ids.is_empty()).then_some(user_ids))),
    ]))
}

fn split_list(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub async fn set_access(
    ctx: &Context<'_>,
    canvas: &str,
    level: &str,
    targets: &AccessTargets,
) -> Result<CmdResult> {
    if !ACCESS_LEVELS.contains(&level) {
        return Err(HollaError::invalid(format!(
            "Invalid access level: {}. Must be \"read\" or \"write\"",
            level
        )));
    }
    let mut request = access_params(ctx, canvas, targets).await?;
    request.insert("access_level".to_string(), json!(level));
    ctx.call("canvases.access.set", request).await?;
    Ok(CmdResult::success(format!(
        "Access set to \"{}\" on canvas {}",
        level, canvas
    )))
}

pub async fn delete_access(
    ctx: &Context<'_>,
    canvas: &str,
    targets: &AccessTargets,
) -> Result<CmdResult> {
    let request = access_params(ctx, canvas, targets).await?;
    ctx.call("canvases.access.delete", request).await?;
    Ok(CmdResult::success(format!("Access removed on canvas {}", canvas)))
}

/// Sections of a canvas, optionally only those containing `contains`.
pub async fn sections(
    ctx: &Context<'_>,
    canvas: &str,
    contains: Option<&str>,
) -> Result<CmdResult> {
    let criteria = params([("contains_text", json!(contains))]);
    let body = ctx
        .call(
            "canvases.sections.lookup",
            params([("canvas_id", json!(canvas)), ("criteria", json!(criteria))]),
        )
        .await?;

    let rows: Vec<Value> = body
        .get("sections")
        .and_then(Value::as_array)
        .map(|sections| {
            sections
                .iter()
                .map(|s| json!({"id": text_at(s, "/id"), "type": text_at(s, "/type")}))
                .collect()
        })
        .unwrap_or_default();
    Ok(CmdResult::default().with_listing(Value::Array(rows), SECTION_COLUMNS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::test_utils::{MockSlack, TestEnv};

    #[test]
    fn test_canvas_url() {
        assert_eq!(
            canvas_url("https://acme.slack.com/", "T1", "F9").as_deref(),
            Some("https://acme.slack.com/docs/T1/F9")
        );
        assert_eq!(canvas_url("", "T1", "F9"), None);
    }

    #[test]
    fn test_parse_canvas_id() {
        assert_eq!(
            parse_canvas_id("https://acme.slack.com/docs/T0123/F0ABC123"),
            "F0ABC123"
        );
        assert_eq!(parse_canvas_id("F0ABC123"), "F0ABC123");
        assert_eq!(
            parse_canvas_id("https://example.com/docs/T1/F1"),
            "https://example.com/docs/T1/F1"
        );
    }

    #[tokio::test]
    async fn test_read_converts_html() {
        let env = TestEnv::new();
        let url = "https://files.slack.com/F9/canvas";
        let api = MockSlack::new()
            .respond(
                "files.info",
                json!({"file": {"id": "F9", "title": "Plan", "created": 1700000000,
                    "url_private": url}}),
            )
            .with_download(url, b"<h1>Goals</h1><p>Ship <strong>it</strong></p>");
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = read(&ctx, "https://acme.slack.com/docs/T1/F9").await.unwrap();
        let document = result.document.unwrap();
        assert!(document.starts_with("# Goals"));
        assert!(document.contains("**it**"));

        let data = result.listing.unwrap().data;
        assert_eq!(data["title"], "Plan");
        assert_eq!(data["markdown"], document.as_str());
        assert_eq!(api.calls_to("files.info")[0]["file"], "F9");
    }

    #[tokio::test]
    async fn test_read_without_url_fails() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("files.info", json!({"file": {"id": "F9"}}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let err = read(&ctx, "F9").await.unwrap_err();
        assert_eq!(err.to_string(), "Canvas F9 has no download URL");
    }

    #[tokio::test]
    async fn test_set_access_resolves_targets() {
        let env = TestEnv::new();
        let api = MockSlack::new()
            .with_channels(&[("general", "C1")])
            .with_users(&[("ana", "U1")]);
        let ctx = Context::new(&api, &env.cache, "acme");
        let targets = AccessTargets {
            channels: Some("#general, C2".into()),
            users: Some("@ana".into()),
        };

        let result = set_access(&ctx, "F9", "write", &targets).await.unwrap();
        assert_eq!(result.messages[0].content, "Access set to \"write\" on canvas F9");
        let call = &api.calls_to("canvases.access.set")[0];
        assert_eq!(call["channel_ids"], json!(["C1", "C2"]));
        assert_eq!(call["user_ids"], json!(["U1"]));
        assert_eq!(call["access_level"], "write");
    }

    #[tokio::test]
    async fn test_access_checks_level_and_targets() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");
        let users = AccessTargets {
            users: Some("U1".into()),
            ..Default::default()
        };

        assert!(set_access(&ctx, "F9", "admin", &users).await.is_err());
        assert!(delete_access(&ctx, "F9", &AccessTargets::default()).await.is_err());
        assert_eq!(api.call_count("canvases.access.set"), 0);

        delete_access(&ctx, "F9", &users).await.unwrap();
        let call = &api.calls_to("canvases.access.delete")[0];
        assert_eq!(call["user_ids"], json!(["U1"]));
        assert!(call.get("channel_ids").is_none());
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_warns() {
        let env = TestEnv::new();
        let api = MockSlack::new()
            .respond(
                "auth.test",
                json!({"url": "https://acme.slack.com/", "team_id": "T1"}),
            )
            .respond("canvases.create", json!({"canvas_id": "F9"}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = create(
            &ctx,
            Some("Plan"),
            Some("1. Item one:\n   - Sub A\n   - Sub B\nsee <https://x.io|docs>"),
        )
        .await
        .unwrap();

        let levels: Vec<_> = result.messages.iter().map(|m| m.level.clone()).collect();
        assert_eq!(
            levels,
            vec![MessageLevel::Warning, MessageLevel::Success, MessageLevel::Info]
        );
        assert_eq!(result.messages[1].content, "Canvas created: Plan (F9)");
        assert!(result.messages[2].content.ends_with("/docs/T1/F9"));

        let call = &api.calls_to("canvases.create")[0];
        assert_eq!(
            call["document_content"]["markdown"],
            "1. Item one:\n   1. Sub A\n   2. Sub B\nsee [docs](https://x.io)"
        );
    }

    #[tokio::test]
    async fn test_create_clean_markdown_has_no_warning() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("canvases.create", json!({"canvas_id": "F1"}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = create(&ctx, None, Some("- A\n  - B")).await.unwrap();
        assert!(result
            .messages
            .iter()
            .all(|m| m.level != MessageLevel::Warning));
        assert_eq!(result.messages[0].content, "Canvas created: (untitled) (F1)");
        assert!(api.calls_to("canvases.create")[0].get("title").is_none());
    }

    #[tokio::test]
    async fn test_edit_rejects_unknown_operation() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");
        let change = CanvasEdit {
            operation: "append".into(),
            ..Default::default()
        };

        let err = edit(&ctx, "F1", &change).await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid operation: append"));
        assert_eq!(api.call_count("canvases.edit"), 0);
    }

    #[tokio::test]
    async fn test_edit_payload() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");
        let change = CanvasEdit {
            operation: "insert_after".into(),
            markdown: Some("more".into()),
            section_id: Some("temp:C:1".into()),
        };

        edit(&ctx, "F1", &change).await.unwrap();
        let call = &api.calls_to("canvases.edit")[0];
        assert_eq!(call["canvas_id"], "F1");
        assert_eq!(call["changes"][0]["operation"], "insert_after");
        assert_eq!(call["changes"][0]["section_id"], "temp:C:1");
        assert_eq!(call["changes"][0]["document_content"]["markdown"], "more");
    }

    #[tokio::test]
    async fn test_sections_criteria() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "canvases.sections.lookup",
            json!({"sections": [{"id": "temp:C:1", "type": "h1"}]}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = sections(&ctx, "F1", Some("Goals")).await.unwrap().listing.unwrap().data;
        assert_eq!(data[0]["type"], "h1");
        assert_eq!(
            api.calls_to("canvases.sections.lookup")[0]["criteria"]["contains_text"],
            "Goals"
        );
    }
}
