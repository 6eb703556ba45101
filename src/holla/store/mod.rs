//! # Storage Layer
//!
//! Everything holla keeps on disk lives under three directories, described by
//! [`StorageConfig`]. The config is built once at process start and passed to
//! every store explicitly, so tests can point the whole tool at a temp dir.
//!
//! ## Implementations
//!
//! - [`credentials::CredentialStore`]: one JSON file per workspace holding its tokens
//! - [`cache::EntityCache`]: TTL-bound name→ID maps, one file per (workspace, kind)
//!
//! ## Storage Format
//!
//! ```text
//! ~/.config/holla/
//! ├── config.json             # User preferences (output format, attribution)
//! ├── credentials/
//! │   └── {workspace}.json    # {"name", "botToken"?, "userToken"?}
//! └── cache/
//!     └── {workspace}-{kind}.json   # {"data": {name: id}, "expiresAt": epoch-ms}
//! ```
//!
//! Files are replaced whole: contents go to a synced temp file which is then
//! renamed over the target, so a concurrent reader sees either the old or the
//! new file.

use crate::error::{HollaError, Result};
use directories::BaseDirs;
use sha2::Digest as _;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub mod cache;
pub mod credentials;

/// Environment variable that relocates the whole config tree.
pub const HOME_ENV: &str = "HOLLA_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub config_dir: PathBuf,
    pub credentials_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl StorageConfig {
    /// Lay out the standard sub-directories under `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            credentials_dir: root.join("credentials"),
            cache_dir: root.join("cache"),
            config_dir: root,
        }
    }

    /// `$HOLLA_HOME` if set, otherwise `~/.config/holla`.
    pub fn discover() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::from_root(PathBuf::from(root)));
        }
        let base = BaseDirs::new()
            .ok_or_else(|| HollaError::invalid("Could not determine home directory"))?;
        Ok(Self::from_root(base.home_dir().join(".config").join("holla")))
    }
}

/// Write `contents` to `path` via a sibling temp file, fsync, and a rename.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let path = path.to_path_buf();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || write_atomic_sync(&path, &contents))
        .await
        .map_err(std::io::Error::other)?
}

fn write_atomic_sync(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| HollaError::invalid(format!("Invalid path: {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// First 12 hex digits of the SHA-256 of `value`.
pub(crate) fn fingerprint(value: &str) -> String {
    let digest = sha2::Sha256::digest(value.as_bytes());
    let mut out = String::with_capacity(12);
    for b in &digest[..6] {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Map a workspace name onto something safe to embed in a file name.
///
/// Clean names are kept as they are. Anything else gets its unsafe characters
/// replaced plus a fingerprint of the raw name, so two names never share a file.
pub(crate) fn file_stem(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean == name && !name.starts_with('.') && !name.is_empty() {
        clean
    } else {
        format!("{}~{}", clean, fingerprint(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_root_layout() {
        let cfg = StorageConfig::from_root("/tmp/h");
        assert_eq!(cfg.config_dir, PathBuf::from("/tmp/h"));
        assert_eq!(cfg.credentials_dir, PathBuf::from("/tmp/h/credentials"));
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/h/cache"));
    }

    #[test]
    fn test_file_stem_keeps_clean_names() {
        assert_eq!(file_stem("acme-corp"), "acme-corp");
        assert_eq!(file_stem("team_1.eu"), "team_1.eu");
    }

    #[test]
    fn test_file_stem_replaces_separators() {
        let stem = file_stem("../etc/passwd");
        assert!(stem.starts_with(".._etc_passwd~"));
        assert!(!stem.contains('/'));
    }

    #[test]
    fn test_file_stem_never_merges_names() {
        assert_ne!(file_stem("my team"), file_stem("my_team"));
        assert_ne!(file_stem("café"), file_stem("caf_"));
        assert_ne!(file_stem("a/b"), file_stem("a\\b"));
        assert_eq!(file_stem("my team"), file_stem("my team"));
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fp = fingerprint("xoxb-1");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("xoxb-1"));
        assert_ne!(fp, fingerprint("xoxb-2"));
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_tmp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub").join("file.json");

        write_atomic(&target, b"{}").await.unwrap();
        write_atomic(&target, b"{\"a\":1}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"a\":1}");
        for entry in std::fs::read_dir(target.parent().unwrap()).unwrap() {
            let name = entry.unwrap().file_name().into_string().unwrap();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }
}
