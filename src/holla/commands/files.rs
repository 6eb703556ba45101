use super::{params, text_at, value_at, CmdResult, Context, PageRequest, DEFAULT_LIMIT};
use crate::error::{HollaError, Result};
use crate::output::Column;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("filetype", "Type"),
    Column::new("size", "Size"),
    Column::new("timestamp", "Timestamp"),
];

/// Files visible to the token, optionally narrowed to a channel or uploader.
///
/// `files.list` takes `count` rather than `limit`, so it is paged by hand.
pub async fn list(
    ctx: &Context<'_>,
    channel: Option<&str>,
    user: Option<&str>,
    page: &PageRequest,
) -> Result<CmdResult> {
    let channel_id = match channel {
        Some(c) => Some(ctx.resolver().resolve_channel(c).await?),
        None => None,
    };
    let user_id = match user {
        Some(u) => Some(ctx.resolver().resolve_user(u).await?),
        None => None,
    };

    let mut cursor = page.cursor.clone();
    let mut files = Vec::new();
    loop {
        let body = ctx
            .call(
                "files.list",
                params([
                    ("count", json!(page.limit.unwrap_or(DEFAULT_LIMIT))),
                    ("channel", json!(channel_id)),
                    ("user", json!(user_id)),
                    ("cursor", json!(cursor)),
                ]),
            )
            .await?;
        if let Some(batch) = body.get("files").and_then(Value::as_array) {
            files.extend(batch.iter().map(|f| {
                json!({
                    "id": text_at(f, "/id"),
                    "name": text_at(f, "/name"),
                    "filetype": text_at(f, "/filetype"),
                    "size": value_at(f, "/size"),
                    "timestamp": text_at(f, "/timestamp"),
                })
            }));
        }
        cursor = body
            .pointer("/response_metadata/next_cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        if !page.all || cursor.is_none() {
            break;
        }
    }

    Ok(CmdResult::default()
        .with_listing(Value::Array(files), LIST_COLUMNS)
        .with_next_cursor(cursor))
}

async fn file_info(ctx: &Context<'_>, file: &str) -> Result<Value> {
    let body = ctx.call("files.info", params([("file", json!(file))])).await?;
    Ok(value_at(&body, "/file"))
}

pub async fn info(ctx: &Context<'_>, file: &str) -> Result<CmdResult> {
    let f = file_info(ctx, file).await?;
    let mut data = serde_json::Map::new();
    for key in [
        "id",
        "name",
        "title",
        "filetype",
        "size",
        "user",
        "created",
        "timestamp",
        "url_private",
        "permalink",
        "channels",
        "groups",
        "ims",
    ] {
        if let Some(v) = f.get(key) {
            data.insert(key.to_string(), v.clone());
        }
    }
    Ok(CmdResult::default().with_data(Value::Object(data)))
}

/// Save a file's contents to `dest`, or to its own name in the current directory.
pub async fn download(ctx: &Context<'_>, file: &str, dest: Option<&Path>) -> Result<CmdResult> {
    let f = file_info(ctx, file).await?;
    let url = f
        .get("url_private_download")
        .or_else(|| f.get("url_private"))
        .and_then(Value::as_str)
        .ok_or_else(|| HollaError::invalid(format!("File {} has no download URL", file)))?;

    let path = match dest {
        Some(p) => p.to_path_buf(),
        None => default_destination(&text_at(&f, "/name"), file),
    };

    debug!(file, url, path = %path.display(), "downloading file");
    let bytes = ctx.api().download(url).await?;
    tokio::fs::write(&path, &bytes).await?;

    Ok(CmdResult::success(format!(
        "Downloaded: {} ({} bytes)",
        path.display(),
        bytes.len()
    )))
}

/// The uploader's file name with any directory parts dropped, or the file ID.
fn default_destination(name: &str, file: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(file))
}

/// Where an upload goes and how it is labelled.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub channel: Option<String>,
    pub title: Option<String>,
    /// Posted alongside the file when it is shared to a channel.
    pub comment: Option<String>,
}

/// Upload a local file: reserve an upload URL, send the bytes, then complete
/// the upload (sharing it to a channel when one is given).
pub async fn upload(ctx: &Context<'_>, path: &Path, options: &UploadOptions) -> Result<CmdResult> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| HollaError::invalid(format!("Not a file: {}", path.display())))?;
    let bytes = tokio::fs::read(path).await?;
    let channel_id = match options.channel.as_deref() {
        Some(c) => Some(ctx.resolver().resolve_channel(c).await?),
        None => None,
    };

    let reserved = ctx
        .call(
            "files.getUploadURLExternal",
            params([("filename", json!(filename)), ("length", json!(bytes.len()))]),
        )
        .await?;
    let url = text_at(&reserved, "/upload_url");
    let file_id = text_at(&reserved, "/file_id");
    if url.is_empty() || file_id.is_empty() {
        return Err(HollaError::invalid(format!(
            "Slack did not accept an upload of {}",
            filename
        )));
    }

    debug!(file = %file_id, bytes = bytes.len(), "sending file contents");
    ctx.api().upload(&url, bytes).await?;

    let title = options.title.as_deref().unwrap_or(&filename);
    ctx.call(
        "files.completeUploadExternal",
        params([
            ("files", json!([{"id": file_id, "title": title}])),
            ("channel_id", json!(channel_id)),
            ("initial_comment", json!(options.comment)),
        ]),
    )
    .await?;

    let destination = channel_id
        .map(|id| format!(" to channel {}", id))
        .unwrap_or_default();
    Ok(CmdResult::success(format!("File uploaded: {}{}", filename, destination)))
}

pub async fn delete(ctx: &Context<'_>, file: &str) -> Result<CmdResult> {
    ctx.call("files.delete", params([("file", json!(file))]))
        .await?;
    Ok(CmdResult::success(format!("File deleted: {}", file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSlack, TestEnv};

    #[tokio::test]
    async fn test_list_resolves_filters() {
        let env = TestEnv::new();
        let api = MockSlack::new()
            .with_channels(&[("general", "C1")])
            .with_users(&[("ana", "U1")])
            .respond(
                "files.list",
                json!({"files": [{"id": "F1", "name": "a.txt", "filetype": "text", "size": 12}]}),
            );
        let ctx = Context::new(&api, &env.cache, "acme");

        let result = list(&ctx, Some("#general"), Some("@ana"), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(result.listing.unwrap().data[0]["size"], 12);
        assert_eq!(result.next_cursor, None);

        let call = &api.calls_to("files.list")[0];
        assert_eq!(call["channel"], "C1");
        assert_eq!(call["user"], "U1");
        assert_eq!(call["count"], DEFAULT_LIMIT);
        assert!(call.get("cursor").is_none());
    }

    #[tokio::test]
    async fn test_info_keeps_known_fields() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "files.info",
            json!({"file": {"id": "F1", "name": "a.txt", "mode": "hosted", "channels": ["C1"]}}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");

        let data = info(&ctx, "F1").await.unwrap().listing.unwrap().data;
        assert_eq!(data["name"], "a.txt");
        assert_eq!(data["channels"], json!(["C1"]));
        assert!(data.get("mode").is_none());
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let env = TestEnv::new();
        let url = "https://files.slack.com/F1/a.txt";
        let api = MockSlack::new()
            .respond(
                "files.info",
                json!({"file": {"id": "F1", "name": "a.txt", "url_private_download": url}}),
            )
            .with_download(url, b"hello");
        let ctx = Context::new(&api, &env.cache, "acme");
        let dest = env._temp_dir.path().join("out.txt");

        let result = download(&ctx, "F1", Some(&dest)).await.unwrap();
        assert_eq!(
            result.messages[0].content,
            format!("Downloaded: {} (5 bytes)", dest.display())
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_default_destination_stays_in_current_dir() {
        assert_eq!(default_destination("a.txt", "F1"), PathBuf::from("a.txt"));
        assert_eq!(default_destination("../evil", "F1"), PathBuf::from("evil"));
        assert_eq!(default_destination("/tmp/x", "F1"), PathBuf::from("x"));
        assert_eq!(default_destination("..", "F1"), PathBuf::from("F1"));
        assert_eq!(default_destination("", "F1"), PathBuf::from("F1"));
    }

    #[tokio::test]
    async fn test_upload_reserves_sends_and_completes() {
        let env = TestEnv::new();
        let url = "https://files.slack.com/upload/v1/abc";
        let api = MockSlack::new()
            .with_channels(&[("general", "C1")])
            .respond(
                "files.getUploadURLExternal",
                json!({"upload_url": url, "file_id": "F9"}),
            );
        let ctx = Context::new(&api, &env.cache, "acme");
        let path = env._temp_dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let options = UploadOptions {
            channel: Some("#general".into()),
            comment: Some("fresh notes".into()),
            ..Default::default()
        };

        let result = upload(&ctx, &path, &options).await.unwrap();
        assert_eq!(result.messages[0].content, "File uploaded: notes.txt to channel C1");

        let reserve = &api.calls_to("files.getUploadURLExternal")[0];
        assert_eq!(reserve["filename"], "notes.txt");
        assert_eq!(reserve["length"], 5);
        assert_eq!(api.uploads(), vec![(url.to_string(), b"hello".to_vec())]);

        let complete = &api.calls_to("files.completeUploadExternal")[0];
        assert_eq!(complete["files"], json!([{"id": "F9", "title": "notes.txt"}]));
        assert_eq!(complete["channel_id"], "C1");
        assert_eq!(complete["initial_comment"], "fresh notes");
    }

    #[tokio::test]
    async fn test_upload_without_channel_stays_private() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "files.getUploadURLExternal",
            json!({"upload_url": "https://u", "file_id": "F9"}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");
        let path = env._temp_dir.path().join("a.txt");
        std::fs::write(&path, b"x").unwrap();
        let options = UploadOptions {
            title: Some("Report".into()),
            ..Default::default()
        };

        let result = upload(&ctx, &path, &options).await.unwrap();
        assert_eq!(result.messages[0].content, "File uploaded: a.txt");
        let complete = &api.calls_to("files.completeUploadExternal")[0];
        assert_eq!(complete["files"][0]["title"], "Report");
        assert!(complete.get("channel_id").is_none());
    }

    #[tokio::test]
    async fn test_upload_missing_file_makes_no_calls() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let ctx = Context::new(&api, &env.cache, "acme");
        let path = env._temp_dir.path().join("missing.txt");

        assert!(upload(&ctx, &path, &UploadOptions::default()).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_download_without_url_fails() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("files.info", json!({"file": {"id": "F1"}}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let err = download(&ctx, "F1", None).await.unwrap_err();
        assert_eq!(err.to_string(), "File F1 has no download URL");
    }
}
