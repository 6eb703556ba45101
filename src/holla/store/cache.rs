use super::{file_stem, write_atomic};
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// How long a fetched name map stays usable.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Display name → platform ID.
pub type NameMap = BTreeMap<String, String>;

/// The category of names held in one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Channels,
    Users,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Channels => "channels",
            EntityKind::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch milliseconds after which the entry is stale.
    pub expires_at: i64,
}

/// File-backed TTL cache, namespaced by workspace.
#[derive(Debug, Clone)]
pub struct EntityCache {
    dir: PathBuf,
}

impl EntityCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing (workspace, kind). Both parts are in the name so two
    /// workspaces never share an entry.
    pub fn entry_path(&self, workspace: &str, kind: EntityKind) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", file_stem(workspace), kind.as_str()))
    }

    /// The cached map, or `None` when missing, stale, or unreadable.
    pub async fn load(&self, workspace: &str, kind: EntityKind) -> Option<NameMap> {
        let path = self.entry_path(workspace, kind);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => {
                debug!(workspace, kind = kind.as_str(), "cache miss");
                return None;
            }
        };

        let entry: CacheEntry<NameMap> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring corrupt cache file");
                return None;
            }
        };

        if Utc::now().timestamp_millis() > entry.expires_at {
            debug!(workspace, kind = kind.as_str(), "cache expired");
            return None;
        }

        debug!(workspace, kind = kind.as_str(), entries = entry.data.len(), "cache hit");
        Some(entry.data)
    }

    /// Replace the entry for (workspace, kind), valid for [`CACHE_TTL`].
    pub async fn save(&self, workspace: &str, kind: EntityKind, data: &NameMap) -> Result<()> {
        let entry = CacheEntry {
            data,
            expires_at: Utc::now().timestamp_millis() + CACHE_TTL.as_millis() as i64,
        };
        let content = serde_json::to_string(&entry)?;
        write_atomic(&self.entry_path(workspace, kind), content.as_bytes()).await
    }

    /// Delete cache files for one workspace, or for all when `workspace` is `None`.
    /// Returns the number of files removed.
    pub async fn clear(&self, workspace: Option<&str>) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let prefix = workspace.map(|w| format!("{}-", file_stem(w)));
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".json") {
                continue;
            }
            let matches = match &prefix {
                Some(prefix) => [EntityKind::Channels, EntityKind::Users]
                    .iter()
                    .any(|k| name == format!("{}{}.json", prefix, k.as_str())),
                None => true,
            };
            if matches {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, EntityCache) {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::new(dir.path().join("cache"));
        (dir, cache)
    }

    fn map(pairs: &[(&str, &str)]) -> NameMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_dir, cache) = setup();
        let data = map(&[("general", "C001")]);
        cache
            .save("acme", EntityKind::Channels, &data)
            .await
            .unwrap();

        assert_eq!(cache.load("acme", EntityKind::Channels).await, Some(data));
        assert_eq!(cache.load("acme", EntityKind::Users).await, None);
    }

    #[tokio::test]
    async fn test_workspaces_do_not_share_entries() {
        let (_dir, cache) = setup();
        cache
            .save("a", EntityKind::Channels, &map(&[("general", "C001")]))
            .await
            .unwrap();
        cache
            .save("b", EntityKind::Channels, &map(&[("general", "C999")]))
            .await
            .unwrap();

        let a = cache.load("a", EntityKind::Channels).await.unwrap();
        let b = cache.load("b", EntityKind::Channels).await.unwrap();
        assert_eq!(a["general"], "C001");
        assert_eq!(b["general"], "C999");
    }

    #[tokio::test]
    async fn test_similar_workspace_names_keep_separate_files() {
        let (_dir, cache) = setup();
        cache
            .save("my team", EntityKind::Channels, &map(&[("general", "C_A")]))
            .await
            .unwrap();
        cache
            .save("my_team", EntityKind::Channels, &map(&[("general", "C_B")]))
            .await
            .unwrap();

        assert_ne!(
            cache.entry_path("my team", EntityKind::Channels),
            cache.entry_path("my_team", EntityKind::Channels)
        );
        let a = cache.load("my team", EntityKind::Channels).await.unwrap();
        let b = cache.load("my_team", EntityKind::Channels).await.unwrap();
        assert_eq!(a["general"], "C_A");
        assert_eq!(b["general"], "C_B");

        assert_eq!(cache.clear(Some("my team")).await.unwrap(), 1);
        assert!(cache.load("my_team", EntityKind::Channels).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_but_kept() {
        let (_dir, cache) = setup();
        let path = cache.entry_path("acme", EntityKind::Users);
        std::fs::create_dir_all(cache.dir()).unwrap();
        let stale = CacheEntry {
            data: map(&[("john", "U001")]),
            expires_at: Utc::now().timestamp_millis() - 1_000,
        };
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        assert_eq!(cache.load("acme", EntityKind::Users).await, None);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let (_dir, cache) = setup();
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.entry_path("acme", EntityKind::Channels), "garbage").unwrap();

        assert_eq!(cache.load("acme", EntityKind::Channels).await, None);
    }

    #[tokio::test]
    async fn test_file_format() {
        let (_dir, cache) = setup();
        cache
            .save("acme", EntityKind::Channels, &map(&[("general", "C001")]))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(cache.entry_path("acme", EntityKind::Channels)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["data"]["general"], "C001");
        let expires = value["expiresAt"].as_i64().unwrap();
        let now = Utc::now().timestamp_millis();
        assert!(expires > now && expires <= now + CACHE_TTL.as_millis() as i64);
    }

    #[tokio::test]
    async fn test_clear_single_workspace() {
        let (_dir, cache) = setup();
        let data = map(&[("x", "1")]);
        cache.save("a", EntityKind::Channels, &data).await.unwrap();
        cache.save("a", EntityKind::Users, &data).await.unwrap();
        cache.save("b", EntityKind::Users, &data).await.unwrap();

        assert_eq!(cache.clear(Some("a")).await.unwrap(), 2);
        assert!(cache.load("b", EntityKind::Users).await.is_some());
        assert_eq!(cache.clear(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_missing_dir() {
        let (_dir, cache) = setup();
        assert_eq!(cache.clear(None).await.unwrap(), 0);
    }
}
