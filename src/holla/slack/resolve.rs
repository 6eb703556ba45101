//! # Name Resolution
//!
//! Commands accept human-friendly references and turn them into the IDs Slack
//! expects:
//!
//! - `#name` is a channel, `@name` is a user. Anything without the sigil is
//!   taken to already be an ID and is returned untouched, without touching the
//!   cache or the network.
//! - User groups have no sigil: an input shaped like a usergroup ID (`S0123ABC`)
//!   matches by ID, anything else matches by handle.
//!
//! Channel and user maps are fetched in full (paginated) on a cache miss and
//! stored in the [`EntityCache`] for [`CACHE_TTL`](crate::store::cache::CACHE_TTL).
//! There is no partial refresh: a channel created after the map was cached does
//! not resolve until the entry expires. Group lists are always fetched fresh,
//! since membership changes are something holla itself does.
//!
//! Misses produce `*NotFound` errors carrying up to three edit-distance
//! suggestions (see [`suggest`](super::suggest)).

use super::client::SlackApi;
use super::suggest::suggestion;
use super::types::{next_cursor, ListConversations, ListUsers, UserGroup};
use crate::error::{HollaError, Result};
use crate::store::cache::{EntityCache, EntityKind, NameMap};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

/// Page size for the full listings behind the name maps.
pub const LIST_PAGE_SIZE: u32 = 200;

const CHANNEL_TYPES: &str = "public_channel,private_channel";

static GROUP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S[A-Z0-9]{2,}$").expect("valid usergroup id pattern"));

/// A user group looked up by ID or handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGroup {
    pub id: String,
    pub name: String,
    pub handle: String,
}

impl From<UserGroup> for ResolvedGroup {
    fn from(group: UserGroup) -> Self {
        Self {
            id: group.id,
            name: group.name,
            handle: group.handle,
        }
    }
}

/// Resolves names for one workspace.
pub struct Resolver<'a> {
    api: &'a dyn SlackApi,
    cache: &'a EntityCache,
    workspace: String,
}

impl<'a> Resolver<'a> {
    pub fn new(
        api: &'a dyn SlackApi,
        cache: &'a EntityCache,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            api,
            cache,
            workspace: workspace.into(),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// `#name` → channel ID; anything else is returned as-is.
    pub async fn resolve_channel(&self, input: &str) -> Result<String> {
        let Some(name) = input.strip_prefix('#') else {
            return Ok(input.to_string());
        };
        let map = self.name_map(EntityKind::Channels).await?;
        match map.get(name) {
            Some(id) => Ok(id.clone()),
            None => Err(HollaError::ChannelNotFound {
                input: input.to_string(),
                suggestion: suggestion(name, map.keys().map(String::as_str), "#"),
            }),
        }
    }

    /// `@name` → user ID; anything else is returned as-is.
    pub async fn resolve_user(&self, input: &str) -> Result<String> {
        let Some(name) = input.strip_prefix('@') else {
            return Ok(input.to_string());
        };
        let map = self.name_map(EntityKind::Users).await?;
        match map.get(name) {
            Some(id) => Ok(id.clone()),
            None => Err(HollaError::UserNotFound {
                input: input.to_string(),
                suggestion: suggestion(name, map.keys().map(String::as_str), "@"),
            }),
        }
    }

    /// Resolve a comma-separated list of channel references.
    pub async fn resolve_channels(&self, inputs: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for input in split_list(inputs) {
            ids.push(self.resolve_channel(input).await?);
        }
        Ok(ids)
    }

    /// Resolve a comma-separated list of user references.
    pub async fn resolve_users(&self, inputs: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for input in split_list(inputs) {
            ids.push(self.resolve_user(input).await?);
        }
        Ok(ids)
    }

    /// User ID → user name. Falls back to the ID itself; never fails.
    pub async fn resolve_user_name(&self, id: &str) -> String {
        match self.name_map(EntityKind::Users).await {
            Ok(map) => map
                .iter()
                .find(|(_, v)| v.as_str() == id)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| id.to_string()),
            Err(e) => {
                debug!(error = %e, "user listing failed; showing raw id");
                id.to_string()
            }
        }
    }

    /// Find a user group by ID (`S…`) or handle (`eng` or `@eng`).
    pub async fn resolve_group(&self, input: &str) -> Result<ResolvedGroup> {
        let mut groups = self.api.list_user_groups().await?.usergroups;
        let handle = input.strip_prefix('@').unwrap_or(input);

        let found = if GROUP_ID.is_match(input) {
            groups.iter().position(|g| g.id == input)
        } else {
            groups.iter().position(|g| g.handle == handle)
        };

        if let Some(idx) = found {
            return Ok(groups.swap_remove(idx).into());
        }
        Err(HollaError::GroupNotFound {
            input: input.to_string(),
            suggestion: suggestion(handle, groups.iter().map(|g| g.handle.as_str()), "@"),
        })
    }

    /// Cached map for `kind`, fetching and caching the full listing on a miss.
    async fn name_map(&self, kind: EntityKind) -> Result<NameMap> {
        if let Some(map) = self.cache.load(&self.workspace, kind).await {
            return Ok(map);
        }

        let map = match kind {
            EntityKind::Channels => self.fetch_channels().await?,
            EntityKind::Users => self.fetch_users().await?,
        };

        if let Err(e) = self.cache.save(&self.workspace, kind, &map).await {
            warn!(
                workspace = %self.workspace,
                kind = kind.as_str(),
                error = %e,
                "failed to write name cache"
            );
        }
        Ok(map)
    }

    async fn fetch_channels(&self) -> Result<NameMap> {
        let mut map = NameMap::new();
        let mut request = ListConversations {
            limit: LIST_PAGE_SIZE,
            types: Some(CHANNEL_TYPES.to_string()),
            cursor: None,
            exclude_archived: true,
        };
        loop {
            let page = self.api.list_conversations(&request).await?;
            for ch in page.channels {
                if let (Some(name), Some(id)) = (ch.name, ch.id) {
                    map.insert(name, id);
                }
            }
            request.cursor = next_cursor(&page.response_metadata);
            if request.cursor.is_none() {
                break;
            }
        }
        debug!(workspace = %self.workspace, channels = map.len(), "fetched channel map");
        Ok(map)
    }

    async fn fetch_users(&self) -> Result<NameMap> {
        let mut map = NameMap::new();
        let mut request = ListUsers {
            limit: LIST_PAGE_SIZE,
            cursor: None,
        };
        loop {
            let page = self.api.list_users(&request).await?;
            for user in page.members {
                if let (Some(name), Some(id)) = (user.name, user.id) {
                    map.insert(name, id);
                }
            }
            request.cursor = next_cursor(&page.response_metadata);
            if request.cursor.is_none() {
                break;
            }
        }
        debug!(workspace = %self.workspace, users = map.len(), "fetched user map");
        Ok(map)
    }
}

fn split_list(inputs: &str) -> impl Iterator<Item = &str> {
    inputs.split(',').map(str::trim).filter(|s| !s.is_empty())
}
