use super::{params, text_at, CmdResult, Context};
use crate::error::Result;
use crate::output::Column;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("title", "Title"),
    Column::new("link", "Link"),
    Column::new("type", "Type"),
];

/// A bookmark to add to a channel header.
#[derive(Debug, Clone, Default)]
pub struct NewBookmark {
    pub title: String,
    pub link: String,
    /// Defaults to `link`
    pub kind: Option<String>,
    pub emoji: Option<String>,
}

/// Fields to change on an existing bookmark; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct BookmarkChange {
    pub title: Option<String>,
    pub link: Option<String>,
    pub emoji: Option<String>,
}

pub async fn add(ctx: &Context<'_>, channel: &str, bookmark: &NewBookmark) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "bookmarks.add",
        params([
            ("channel_id", json!(id)),
            ("title", json!(bookmark.title)),
            ("link", json!(bookmark.link)),
            ("type", json!(bookmark.kind.as_deref().unwrap_or("link"))),
            ("emoji", json!(bookmark.emoji)),
        ]),
    )
    .await?;
    Ok(CmdResult::success(format!(
        "Bookmark added: \"{}\" in {}",
        bookmark.title, id
    )))
}

pub async fn edit(
    ctx: &Context<'_>,
    channel: &str,
    bookmark: &str,
    change: &BookmarkChange,
) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    ctx.call(
        "bookmarks.edit",
        params([
            ("channel_id", json!(id)),
            ("bookmark_id", json!(bookmark)),
            ("title", json!(change.title)),
            ("link", json!(change.link)),
            ("emoji", json!(change.emoji)),
        ]),
    )
    .await?;
    Ok(CmdResult::success(format!("Bookmark updated: {}", bookmark)))
}

pub async fn list(ctx: &Context<'_>, channel: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_channel(channel).await?;
    let body = ctx
        .call("bookmarks.list", params([("channel_id", json!(id))]))
        .await?;

    let rows: Vec<Value> = body
        .get("bookmarks")
        .and_then(Value::as_array)
        .map(|bookmarks| {
            bookmarks
                .iter()
                .map(|b| {
                    json!({
                        "id": text_at(b, "/id"),
                        "title": text_at(b, "/title"),
                        "link": text_at(b, "/link"),
                        "type": text_at(b, "/type"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(CmdResult::default().with_listing(Value::Array(rows), LIST_COLUMNS))
}
