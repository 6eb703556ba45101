use super::{file_stem, fingerprint, write_atomic};
use crate::error::{HollaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Process-wide token override; when set, stored credentials are ignored.
pub const TOKEN_ENV: &str = "SLACK_TOKEN";

/// Workspace label reported when the token came from [`TOKEN_ENV`].
pub const ENV_WORKSPACE: &str = "env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCredentials {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
}

impl WorkspaceCredentials {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bot_token: None,
            user_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Bot,
    User,
}

impl TokenType {
    /// Classify a token by its Slack prefix (`xoxb-` bot, `xoxp-` user).
    pub fn from_token(token: &str) -> Option<Self> {
        if token.starts_with("xoxb-") {
            Some(TokenType::Bot)
        } else if token.starts_with("xoxp-") {
            Some(TokenType::User)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Bot => "bot",
            TokenType::User => "user",
        }
    }
}

/// A token chosen for a command, with the workspace it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    /// Label shown to the user.
    pub workspace: String,
    /// Key for the entity cache. For [`TOKEN_ENV`] tokens it is derived from the
    /// token, since the label says nothing about which workspace it reaches.
    pub cache_namespace: String,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Per-workspace token files under `credentials_dir`.
pub struct CredentialStore {
    dir: PathBuf,
    env: EnvLookup,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup (tests use this instead of mutating the process env).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn credential_path(&self, workspace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(workspace)))
    }

    pub async fn store_token(
        &self,
        workspace: &str,
        token_type: TokenType,
        token: &str,
    ) -> Result<()> {
        let mut creds = self
            .workspace_credentials(workspace)
            .await
            .unwrap_or_else(|| WorkspaceCredentials::new(workspace));

        match token_type {
            TokenType::Bot => creds.bot_token = Some(token.to_string()),
            TokenType::User => creds.user_token = Some(token.to_string()),
        }

        let content = serde_json::to_string_pretty(&creds)?;
        write_atomic(&self.credential_path(workspace), content.as_bytes()).await?;
        debug!(workspace, token_type = token_type.as_str(), "stored token");
        Ok(())
    }

    /// Read one workspace record. Missing or unreadable files yield `None`.
    pub async fn workspace_credentials(&self, workspace: &str) -> Option<WorkspaceCredentials> {
        let content = tokio::fs::read_to_string(self.credential_path(workspace))
            .await
            .ok()?;
        serde_json::from_str(&content).ok()
    }

    /// All stored records, sorted by name. Corrupt files are skipped.
    pub async fn list_workspaces(&self) -> Result<Vec<WorkspaceCredentials>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut workspaces = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = match tokio::fs::read_to_string(&path).await {
                Ok(content) => serde_json::from_str::<WorkspaceCredentials>(&content)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match parsed {
                Ok(creds) => workspaces.push(creds),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "skipping unreadable credential file")
                }
            }
        }

        workspaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(workspaces)
    }

    /// Delete a workspace record. Returns whether a file was removed.
    pub async fn remove_workspace(&self, workspace: &str) -> bool {
        tokio::fs::remove_file(self.credential_path(workspace))
            .await
            .is_ok()
    }

    /// Pick the token a command should use.
    ///
    /// Order: the [`TOKEN_ENV`] override, then the named workspace, then the only
    /// stored workspace. With `prefer_user` a user token wins over a bot token.
    pub async fn get_token(
        &self,
        workspace: Option<&str>,
        prefer_user: bool,
    ) -> Result<ResolvedToken> {
        if let Some(token) = (self.env)(TOKEN_ENV).filter(|t| !t.is_empty()) {
            return Ok(ResolvedToken {
                cache_namespace: format!("{}~{}", ENV_WORKSPACE, fingerprint(&token)),
                workspace: workspace.unwrap_or(ENV_WORKSPACE).to_string(),
                token,
            });
        }

        let mut workspaces = self.list_workspaces().await?;
        if workspaces.is_empty() {
            return Err(HollaError::NoWorkspaces);
        }

        let creds = match workspace {
            Some(name) => match workspaces.iter().position(|w| w.name == name) {
                Some(idx) => workspaces.swap_remove(idx),
                None => {
                    return Err(HollaError::WorkspaceNotFound {
                        name: name.to_string(),
                        available: names(&workspaces),
                    })
                }
            },
            None if workspaces.len() == 1 => workspaces.remove(0),
            None => {
                return Err(HollaError::AmbiguousWorkspace {
                    available: names(&workspaces),
                })
            }
        };

        let token = if prefer_user {
            creds.user_token.or(creds.bot_token)
        } else {
            creds.bot_token.or(creds.user_token)
        };

        match token {
            Some(token) => Ok(ResolvedToken {
                token,
                cache_namespace: creds.name.clone(),
                workspace: creds.name,
            }),
            None => Err(HollaError::MissingToken {
                workspace: creds.name,
            }),
        }
    }
}

fn names(workspaces: &[WorkspaceCredentials]) -> Vec<String> {
    workspaces.iter().map(|w| w.name.clone()).collect()
}
