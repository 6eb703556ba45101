//! # Command Layer
//!
//! One module per Slack resource group. Each command takes typed arguments,
//! resolves names through the [`Resolver`], issues one or a few Web API calls
//! and returns a [`CmdResult`]. Commands never print; the CLI renders results.

use crate::error::Result;
use crate::output::{Column, Paging};
use crate::slack::types::Params;
use crate::slack::{Resolver, SlackApi};
use crate::store::cache::EntityCache;
use serde_json::Value;

pub mod auth;
pub mod bookmarks;
pub mod canvases;
pub mod channels;
pub mod chat;
pub mod dnd;
pub mod emoji;
pub mod files;
pub mod groups;
pub mod passthrough;
pub mod pins;
pub mod reactions;
pub mod reminders;
pub mod search;
pub mod stars;
pub mod team;
pub mod users;

/// Listing size used when the caller gives no `--limit`.
pub const DEFAULT_LIMIT: u32 = 20;

/// Everything a workspace-bound command needs.
pub struct Context<'a> {
    api: &'a dyn SlackApi,
    resolver: Resolver<'a>,
}

impl<'a> Context<'a> {
    pub fn new(api: &'a dyn SlackApi, cache: &'a EntityCache, workspace: &str) -> Self {
        Self {
            api,
            resolver: Resolver::new(api, cache, workspace),
        }
    }

    pub fn api(&self) -> &'a dyn SlackApi {
        self.api
    }

    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.api.call(method, params).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Data for the output formatter plus the columns to show.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub data: Value,
    pub columns: Option<&'static [Column]>,
}

/// One titled listing among several in a result (e.g. messages and files).
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label: String,
    pub listing: Listing,
}

/// Page banner for page-numbered results (search).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBanner {
    pub label: String,
    pub paging: Paging,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub messages: Vec<CmdMessage>,
    pub listing: Option<Listing>,
    /// Titled listings shown one after another; JSON mode keys them by label.
    pub sections: Vec<Section>,
    /// Text printed as-is in table and plain modes. JSON mode prints the
    /// listing instead.
    pub document: Option<String>,
    /// Response body shown verbatim as JSON whatever the output format.
    pub raw: Option<Value>,
    pub paging: Option<PageBanner>,
    /// Cursor for the next page when a listing stopped early.
    pub next_cursor: Option<String>,
}

impl CmdResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self::default().with_message(CmdMessage::success(content))
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_listing(mut self, data: Value, columns: &'static [Column]) -> Self {
        self.listing = Some(Listing {
            data,
            columns: Some(columns),
        });
        self
    }

    /// Data rendered with the formatter's default columns (object view).
    pub fn with_data(mut self, data: Value) -> Self {
        self.listing = Some(Listing {
            data,
            columns: None,
        });
        self
    }

    pub fn with_section(
        mut self,
        label: impl Into<String>,
        data: Value,
        columns: &'static [Column],
    ) -> Self {
        self.sections.push(Section {
            label: label.into(),
            listing: Listing {
                data,
                columns: Some(columns),
            },
        });
        self
    }

    pub fn with_document(mut self, text: impl Into<String>) -> Self {
        self.document = Some(text.into());
        self
    }

    pub fn with_raw(mut self, body: Value) -> Self {
        self.raw = Some(body);
        self
    }

    pub fn with_paging(mut self, label: impl Into<String>, paging: Paging) -> Self {
        self.paging = Some(PageBanner {
            label: label.into(),
            paging,
        });
        self
    }

    pub fn with_next_cursor(mut self, cursor: Option<String>) -> Self {
        self.next_cursor = cursor;
        self
    }
}

/// Cursor pagination arguments shared by listing commands.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    /// Keep following cursors until the listing is exhausted.
    pub all: bool,
}

/// Build a parameter bag, dropping null values.
pub(crate) fn params<const N: usize>(pairs: [(&str, Value); N]) -> Params {
    pairs
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Call a cursor-paginated method and gather the `key` array of each page.
///
/// Returns the items and, when stopping before the end, the next cursor.
pub(crate) async fn collect_pages(
    ctx: &Context<'_>,
    method: &str,
    mut base: Params,
    page: &PageRequest,
    key: &str,
) -> Result<(Vec<Value>, Option<String>)> {
    base.insert(
        "limit".to_string(),
        Value::from(page.limit.unwrap_or(DEFAULT_LIMIT)),
    );
    let mut cursor = page.cursor.clone();
    let mut items = Vec::new();

    loop {
        let mut request = base.clone();
        if let Some(c) = &cursor {
            request.insert("cursor".to_string(), Value::from(c.as_str()));
        }
        let body = ctx.call(method, request).await?;
        if let Some(batch) = body.get(key).and_then(Value::as_array) {
            items.extend(batch.iter().cloned());
        }
        cursor = body
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if !page.all || cursor.is_none() {
            return Ok((items, cursor));
        }
    }
}

/// String at a JSON pointer, or empty.
pub(crate) fn text_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Value at a JSON pointer, or null.
pub(crate) fn value_at(value: &Value, pointer: &str) -> Value {
    value.pointer(pointer).cloned().unwrap_or(Value::Null)
}

/// First `max` characters of `text`.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
