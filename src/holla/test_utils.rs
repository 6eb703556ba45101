//! In-memory Slack stand-in plus a temp-dir storage layout for tests.

use crate::error::{HollaError, Result};
use crate::slack::client::{check_ok, SlackApi};
use crate::slack::types::Params;
use crate::store::cache::EntityCache;
use crate::store::credentials::CredentialStore;
use crate::store::StorageConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

/// Scripted Slack API. Listing methods are served from in-memory pages;
/// anything else returns a canned response (default `{"ok": true}`).
#[derive(Default)]
pub struct MockSlack {
    channel_pages: Vec<Vec<(String, String)>>,
    user_pages: Vec<Vec<(String, String)>>,
    groups: Vec<Value>,
    responses: HashMap<String, Value>,
    downloads: HashMap<String, Vec<u8>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl MockSlack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels served as a single page.
    pub fn with_channels(self, channels: &[(&str, &str)]) -> Self {
        self.with_channel_page(channels)
    }

    /// Append one more page to the channel listing.
    pub fn with_channel_page(mut self, channels: &[(&str, &str)]) -> Self {
        self.channel_pages.push(owned(channels));
        self
    }

    pub fn with_users(self, users: &[(&str, &str)]) -> Self {
        self.with_user_page(users)
    }

    pub fn with_user_page(mut self, users: &[(&str, &str)]) -> Self {
        self.user_pages.push(owned(users));
        self
    }

    /// `(id, name, handle)` triples served by `usergroups.list`.
    pub fn with_groups(mut self, groups: &[(&str, &str, &str)]) -> Self {
        self.groups = groups
            .iter()
            .map(|(id, name, handle)| json!({"id": id, "name": name, "handle": handle}))
            .collect();
        self
    }

    /// Canned body for `method`. `ok` defaults to true when absent.
    pub fn respond(mut self, method: &str, body: Value) -> Self {
        self.responses.insert(method.to_string(), body);
        self
    }

    /// Make `method` fail with the given Slack error code.
    pub fn fail(self, method: &str, error: &str) -> Self {
        self.respond(method, json!({"ok": false, "error": error}))
    }

    /// Bytes served by `download(url)`.
    pub fn with_download(mut self, url: &str, bytes: &[u8]) -> Self {
        self.downloads.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// `(url, bytes)` for every `upload` so far.
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Params> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }

    fn page(pages: &[Vec<(String, String)>], params: &Params, key: &str) -> Value {
        let index = params
            .get("cursor")
            .and_then(Value::as_str)
            .and_then(|c| c.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let items: Vec<Value> = pages
            .get(index)
            .map(|page| {
                page.iter()
                    .map(|(name, id)| json!({"id": id, "name": name}))
                    .collect()
            })
            .unwrap_or_default();
        let next = if index + 1 < pages.len() {
            format!("page-{}", index + 1)
        } else {
            String::new()
        };
        let mut body = serde_json::Map::new();
        body.insert("ok".to_string(), Value::Bool(true));
        body.insert(key.to_string(), Value::Array(items));
        body.insert(
            "response_metadata".to_string(),
            json!({"next_cursor": next}),
        );
        Value::Object(body)
    }
}

#[async_trait]
impl SlackApi for MockSlack {
    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        if let Some(body) = self.responses.get(method) {
            let mut body = body.clone();
            if let Some(obj) = body.as_object_mut() {
                obj.entry("ok").or_insert(Value::Bool(true));
            }
            return check_ok(method, body);
        }

        let body = match method {
            "conversations.list" => Self::page(&self.channel_pages, &params, "channels"),
            "users.list" => Self::page(&self.user_pages, &params, "members"),
            "usergroups.list" => json!({"ok": true, "usergroups": self.groups}),
            _ => json!({"ok": true}),
        };
        Ok(body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads
            .get(url)
            .cloned()
            .ok_or_else(|| HollaError::invalid(format!("no download registered for {}", url)))
    }

    async fn upload(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        self.uploads.lock().unwrap().push((url.to_string(), bytes));
        Ok(())
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

/// A throwaway config tree with stores pointing into it.
pub struct TestEnv {
    // Held so the directory lives as long as the test
    pub _temp_dir: TempDir,
    pub storage: StorageConfig,
    pub cache: EntityCache,
    pub credentials: CredentialStore,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let storage = StorageConfig::from_root(temp_dir.path());
        let cache = EntityCache::new(&storage.cache_dir);
        let credentials = CredentialStore::new(&storage.credentials_dir).with_env(|_| None);
        Self {
            _temp_dir: temp_dir,
            storage,
            cache,
            credentials,
        }
    }
}
