//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It is the single
//! entry point for every holla operation, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Binds** each call to one workspace: its client, its cache entries
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`
//! - **Token selection**: The caller picks the token and builds the client
//! - **Presentation concerns**: Returns data structures, not strings
//!
//! ## Generic Over SlackApi
//!
//! `HollaApi<C: SlackApi>` is generic over the transport:
//! - Production: `HollaApi<SlackClient>`
//! - Testing: `HollaApi<MockSlack>`
//!
//! ## Workspace-less Operations
//!
//! Login, logout, status and cache clearing run before (or without) a
//! workspace client, so they are free functions in this module.

use crate::commands::bookmarks::{BookmarkChange, NewBookmark};
use crate::commands::canvases::{AccessTargets, CanvasEdit};
use crate::commands::files::UploadOptions;
use crate::commands::groups::GroupFields;
use crate::commands::stars::StarTarget;
use crate::commands::users::ProfileChange;
use crate::commands::{self, passthrough::RawCall, search::SearchOptions};
use crate::commands::{CmdResult, Context, PageRequest};
use crate::error::Result;
use crate::slack::attribution::AttributionConfig;
use crate::slack::SlackApi;
use crate::store::cache::EntityCache;
use crate::store::credentials::CredentialStore;
use std::path::Path;

/// The main API facade, bound to one workspace.
///
/// `namespace` keys the entity cache: the stored workspace name, or a token
/// fingerprint for environment tokens (see `ResolvedToken::cache_namespace`).
pub struct HollaApi<C: SlackApi> {
    client: C,
    cache: EntityCache,
    namespace: String,
}

impl<C: SlackApi> HollaApi<C> {
    pub fn new(client: C, cache: EntityCache, namespace: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn ctx(&self) -> Context<'_> {
        Context::new(&self.client, &self.cache, &self.namespace)
    }

    // --- auth ---

    pub async fn whoami(&self) -> Result<CmdResult> {
        commands::auth::whoami(&self.ctx()).await
    }

    // --- channels ---

    pub async fn list_channels(
        &self,
        types: Option<&str>,
        page: &PageRequest,
    ) -> Result<CmdResult> {
        commands::channels::list(&self.ctx(), types, page).await
    }

    pub async fn channel_info(&self, channel: &str) -> Result<CmdResult> {
        commands::channels::info(&self.ctx(), channel).await
    }

    pub async fn channel_history(
        &self,
        channel: &str,
        before: Option<&str>,
        page: &PageRequest,
    ) -> Result<CmdResult> {
        commands::channels::history(&self.ctx(), channel, before, page).await
    }

    pub async fn thread_replies(
        &self,
        channel: &str,
        ts: &str,
        page: &PageRequest,
    ) -> Result<CmdResult> {
        commands::channels::replies(&self.ctx(), channel, ts, page).await
    }

    pub async fn channel_members(&self, channel: &str, page: &PageRequest) -> Result<CmdResult> {
        commands::channels::members(&self.ctx(), channel, page).await
    }

    pub async fn join_channel(&self, channel: &str) -> Result<CmdResult> {
        commands::channels::join(&self.ctx(), channel).await
    }

    pub async fn leave_channel(&self, channel: &str) -> Result<CmdResult> {
        commands::channels::leave(&self.ctx(), channel).await
    }

    pub async fn invite_to_channel(&self, channel: &str, users: &str) -> Result<CmdResult> {
        commands::channels::invite(&self.ctx(), channel, users).await
    }

    pub async fn kick_from_channel(&self, channel: &str, user: &str) -> Result<CmdResult> {
        commands::channels::kick(&self.ctx(), channel, user).await
    }

    pub async fn create_channel(&self, name: &str, private: bool) -> Result<CmdResult> {
        commands::channels::create(&self.ctx(), name, private).await
    }

    pub async fn archive_channel(&self, channel: &str) -> Result<CmdResult> {
        commands::channels::archive(&self.ctx(), channel).await
    }

    pub async fn unarchive_channel(&self, channel: &str) -> Result<CmdResult> {
        commands::channels::unarchive(&self.ctx(), channel).await
    }

    pub async fn set_channel_topic(&self, channel: &str, topic: &str) -> Result<CmdResult> {
        commands::channels::set_topic(&self.ctx(), channel, topic).await
    }

    pub async fn set_channel_purpose(&self, channel: &str, purpose: &str) -> Result<CmdResult> {
        commands::channels::set_purpose(&self.ctx(), channel, purpose).await
    }

    pub async fn mark_channel_read(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::channels::mark_read(&self.ctx(), channel, ts).await
    }

    // --- chat ---

    pub async fn send_message(
        &self,
        channel: &str,
        text: &str,
        attribution: &AttributionConfig,
    ) -> Result<CmdResult> {
        commands::chat::send(&self.ctx(), channel, text, attribution).await
    }

    pub async fn reply_to_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
        attribution: &AttributionConfig,
    ) -> Result<CmdResult> {
        commands::chat::reply(&self.ctx(), channel, thread_ts, text, attribution).await
    }

    pub async fn get_message(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::chat::get(&self.ctx(), channel, ts).await
    }

    pub async fn edit_message(&self, channel: &str, ts: &str, text: &str) -> Result<CmdResult> {
        commands::chat::edit(&self.ctx(), channel, ts, text).await
    }

    pub async fn delete_message(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::chat::delete(&self.ctx(), channel, ts).await
    }

    pub async fn permalink(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::chat::permalink(&self.ctx(), channel, ts).await
    }

    pub async fn schedule_message(
        &self,
        channel: &str,
        text: &str,
        post_at: &str,
    ) -> Result<CmdResult> {
        commands::chat::schedule(&self.ctx(), channel, text, post_at).await
    }

    pub async fn whisper(&self, channel: &str, user: &str, text: &str) -> Result<CmdResult> {
        commands::chat::whisper(&self.ctx(), channel, user, text).await
    }

    pub async fn unfurl(&self, channel: &str, ts: &str, unfurls: &str) -> Result<CmdResult> {
        commands::chat::unfurl(&self.ctx(), channel, ts, unfurls).await
    }

    // --- reactions ---

    pub async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<CmdResult> {
        commands::reactions::add(&self.ctx(), channel, ts, name).await
    }

    pub async fn remove_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<CmdResult> {
        commands::reactions::remove(&self.ctx(), channel, ts, name).await
    }

    pub async fn get_reactions(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::reactions::get(&self.ctx(), channel, ts).await
    }

    pub async fn list_reactions(
        &self,
        user: Option<&str>,
        page: &PageRequest,
    ) -> Result<CmdResult> {
        commands::reactions::list(&self.ctx(), user, page).await
    }

    // --- users ---

    pub async fn list_users(&self, page: &PageRequest) -> Result<CmdResult> {
        commands::users::list(&self.ctx(), page).await
    }

    pub async fn user_info(&self, user: &str) -> Result<CmdResult> {
        commands::users::info(&self.ctx(), user).await
    }

    pub async fn find_user(&self, email: &str) -> Result<CmdResult> {
        commands::users::find(&self.ctx(), email).await
    }

    pub async fn user_presence(&self, user: &str) -> Result<CmdResult> {
        commands::users::presence(&self.ctx(), user).await
    }

    pub async fn user_profile(&self, user: Option<&str>) -> Result<CmdResult> {
        commands::users::profile_card(&self.ctx(), user).await
    }

    pub async fn set_presence(&self, presence: &str) -> Result<CmdResult> {
        commands::users::set_presence(&self.ctx(), presence).await
    }

    pub async fn set_profile(&self, change: &ProfileChange) -> Result<CmdResult> {
        commands::users::set_profile(&self.ctx(), change).await
    }

    // --- pins ---

    pub async fn pin(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::pins::add(&self.ctx(), channel, ts).await
    }

    pub async fn unpin(&self, channel: &str, ts: &str) -> Result<CmdResult> {
        commands::pins::remove(&self.ctx(), channel, ts).await
    }

    pub async fn list_pins(&self, channel: &str) -> Result<CmdResult> {
        commands::pins::list(&self.ctx(), channel).await
    }

    // --- stars ---

    pub async fn star(&self, target: &StarTarget) -> Result<CmdResult> {
        commands::stars::add(&self.ctx(), target).await
    }

    pub async fn unstar(&self, target: &StarTarget) -> Result<CmdResult> {
        commands::stars::remove(&self.ctx(), target).await
    }

    pub async fn list_stars(&self, page: &PageRequest) -> Result<CmdResult> {
        commands::stars::list(&self.ctx(), page).await
    }

    // --- bookmarks ---

    pub async fn add_bookmark(&self, channel: &str, bookmark: &NewBookmark) -> Result<CmdResult> {
        commands::bookmarks::add(&self.ctx(), channel, bookmark).await
    }

    pub async fn edit_bookmark(
        &self,
        channel: &str,
        bookmark: &str,
        change: &BookmarkChange,
    ) -> Result<CmdResult> {
        commands::bookmarks::edit(&self.ctx(), channel, bookmark, change).await
    }

    pub async fn list_bookmarks(&self, channel: &str) -> Result<CmdResult> {
        commands::bookmarks::list(&self.ctx(), channel).await
    }

    // --- emoji ---

    pub async fn list_emoji(&self) -> Result<CmdResult> {
        commands::emoji::list(&self.ctx()).await
    }

    // --- search ---

    pub async fn search_messages(&self, query: &str, options: &SearchOptions) -> Result<CmdResult> {
        commands::search::messages(&self.ctx(), query, options).await
    }

    pub async fn search_files(&self, query: &str, options: &SearchOptions) -> Result<CmdResult> {
        commands::search::files(&self.ctx(), query, options).await
    }

    pub async fn search_all(&self, query: &str, options: &SearchOptions) -> Result<CmdResult> {
        commands::search::all(&self.ctx(), query, options).await
    }

    // --- user groups ---

    pub async fn list_groups(&self, include_disabled: bool) -> Result<CmdResult> {
        commands::groups::list(&self.ctx(), include_disabled).await
    }

    pub async fn group_members(&self, group: &str) -> Result<CmdResult> {
        commands::groups::members(&self.ctx(), group).await
    }

    pub async fn add_group_member(&self, group: &str, user: &str) -> Result<CmdResult> {
        commands::groups::add_member(&self.ctx(), group, user).await
    }

    pub async fn remove_group_member(&self, group: &str, user: &str) -> Result<CmdResult> {
        commands::groups::remove_member(&self.ctx(), group, user).await
    }

    pub async fn create_group(&self, name: &str, fields: &GroupFields) -> Result<CmdResult> {
        commands::groups::create(&self.ctx(), name, fields).await
    }

    pub async fn update_group(&self, group: &str, fields: &GroupFields) -> Result<CmdResult> {
        commands::groups::update(&self.ctx(), group, fields).await
    }

    pub async fn enable_group(&self, group: &str) -> Result<CmdResult> {
        commands::groups::enable(&self.ctx(), group).await
    }

    pub async fn disable_group(&self, group: &str) -> Result<CmdResult> {
        commands::groups::disable(&self.ctx(), group).await
    }

    pub async fn set_group_members(&self, group: &str, users: &str) -> Result<CmdResult> {
        commands::groups::set_members(&self.ctx(), group, users).await
    }

    // --- canvases ---

    pub async fn create_canvas(
        &self,
        title: Option<&str>,
        markdown: Option<&str>,
    ) -> Result<CmdResult> {
        commands::canvases::create(&self.ctx(), title, markdown).await
    }

    pub async fn edit_canvas(&self, canvas: &str, change: &CanvasEdit) -> Result<CmdResult> {
        commands::canvases::edit(&self.ctx(), canvas, change).await
    }

    pub async fn delete_canvas(&self, canvas: &str) -> Result<CmdResult> {
        commands::canvases::delete(&self.ctx(), canvas).await
    }

    pub async fn canvas_sections(&self, canvas: &str, contains: Option<&str>) -> Result<CmdResult> {
        commands::canvases::sections(&self.ctx(), canvas, contains).await
    }

    pub async fn read_canvas(&self, canvas: &str) -> Result<CmdResult> {
        commands::canvases::read(&self.ctx(), canvas).await
    }

    pub async fn set_canvas_access(
        &self,
        canvas: &str,
        level: &str,
        targets: &AccessTargets,
    ) -> Result<CmdResult> {
        commands::canvases::set_access(&self.ctx(), canvas, level, targets).await
    }

    pub async fn delete_canvas_access(
        &self,
        canvas: &str,
        targets: &AccessTargets,
    ) -> Result<CmdResult> {
        commands::canvases::delete_access(&self.ctx(), canvas, targets).await
    }

    // --- dnd, reminders, team ---

    pub async fn dnd_status(&self, user: Option<&str>) -> Result<CmdResult> {
        commands::dnd::status(&self.ctx(), user).await
    }

    pub async fn dnd_snooze(&self, minutes: &str) -> Result<CmdResult> {
        commands::dnd::snooze(&self.ctx(), minutes).await
    }

    pub async fn dnd_end(&self) -> Result<CmdResult> {
        commands::dnd::end(&self.ctx()).await
    }

    pub async fn dnd_unsnooze(&self) -> Result<CmdResult> {
        commands::dnd::unsnooze(&self.ctx()).await
    }

    pub async fn dnd_team(&self, users: &str) -> Result<CmdResult> {
        commands::dnd::team(&self.ctx(), users).await
    }

    pub async fn list_reminders(&self) -> Result<CmdResult> {
        commands::reminders::list(&self.ctx()).await
    }

    pub async fn add_reminder(&self, text: &str, time: &str) -> Result<CmdResult> {
        commands::reminders::add(&self.ctx(), text, time).await
    }

    pub async fn reminder_info(&self, reminder: &str) -> Result<CmdResult> {
        commands::reminders::info(&self.ctx(), reminder).await
    }

    pub async fn complete_reminder(&self, reminder: &str) -> Result<CmdResult> {
        commands::reminders::complete(&self.ctx(), reminder).await
    }

    pub async fn delete_reminder(&self, reminder: &str) -> Result<CmdResult> {
        commands::reminders::delete(&self.ctx(), reminder).await
    }

    pub async fn team_info(&self) -> Result<CmdResult> {
        commands::team::info(&self.ctx()).await
    }

    pub async fn team_profile(&self) -> Result<CmdResult> {
        commands::team::profile_fields(&self.ctx()).await
    }

    // --- files ---

    pub async fn list_files(
        &self,
        channel: Option<&str>,
        user: Option<&str>,
        page: &PageRequest,
    ) -> Result<CmdResult> {
        commands::files::list(&self.ctx(), channel, user, page).await
    }

    pub async fn file_info(&self, file: &str) -> Result<CmdResult> {
        commands::files::info(&self.ctx(), file).await
    }

    pub async fn download_file(&self, file: &str, dest: Option<&Path>) -> Result<CmdResult> {
        commands::files::download(&self.ctx(), file, dest).await
    }

    pub async fn upload_file(&self, path: &Path, options: &UploadOptions) -> Result<CmdResult> {
        commands::files::upload(&self.ctx(), path, options).await
    }

    pub async fn delete_file(&self, file: &str) -> Result<CmdResult> {
        commands::files::delete(&self.ctx(), file).await
    }

    // --- raw ---

    pub async fn raw_call(&self, raw: &RawCall) -> Result<CmdResult> {
        commands::passthrough::call(&self.ctx(), raw).await
    }
}

/// Validate `token` with `client` and store it under the workspace Slack reports.
pub async fn login<C: SlackApi>(
    store: &CredentialStore,
    client: &C,
    token: &str,
) -> Result<CmdResult> {
    commands::auth::login(store, client, token).await
}

pub async fn logout(store: &CredentialStore, workspace: Option<&str>) -> Result<CmdResult> {
    commands::auth::logout(store, workspace).await
}

/// Check every stored token; `connect` builds a client for one token.
pub async fn status<C, F>(store: &CredentialStore, connect: F) -> Result<CmdResult>
where
    C: SlackApi,
    F: Fn(&str) -> Result<C>,
{
    commands::auth::status(store, connect).await
}

/// Drop cached name lookups for one workspace, or all of them.
pub async fn clear_cache(cache: &EntityCache, workspace: Option<&str>) -> Result<CmdResult> {
    let removed = cache.clear(workspace).await?;
    let scope = match workspace {
        Some(w) => format!(" for \"{}\"", w),
        None => String::new(),
    };
    Ok(CmdResult::success(format!(
        "Cache cleared{} ({} file{} removed)",
        scope,
        removed,
        if removed == 1 { "" } else { "s" }
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cache::{EntityKind, NameMap};
    use crate::test_utils::{MockSlack, TestEnv};
    use serde_json::json;

    fn api(env: &TestEnv, mock: MockSlack) -> HollaApi<MockSlack> {
        HollaApi::new(mock, EntityCache::new(&env.storage.cache_dir), "acme")
    }

    #[tokio::test]
    async fn test_send_resolves_channel_name() {
        let env = TestEnv::new();
        let mock = MockSlack::new()
            .with_channels(&[("general", "C1")])
            .respond("chat.postMessage", json!({"ts": "1.0", "channel": "C1"}));
        let api = api(&env, mock);
        let attribution = AttributionConfig {
            reaction: None,
            suffix: None,
            agent: "holla".into(),
        };

        let result = api.send_message("#general", "hi", &attribution).await.unwrap();
        assert_eq!(result.messages[0].content, "Message sent (ts: 1.0)");
        assert_eq!(api.client.calls_to("chat.postMessage")[0]["channel"], "C1");
    }

    #[tokio::test]
    async fn test_lookups_are_cached_per_workspace() {
        let env = TestEnv::new();
        let mock = MockSlack::new().with_channels(&[("general", "C1")]);
        let api = api(&env, mock);

        api.join_channel("#general").await.unwrap();
        api.leave_channel("#general").await.unwrap();
        assert_eq!(api.client.call_count("conversations.list"), 1);
        assert!(env.cache.load("acme", EntityKind::Channels).await.is_some());
    }

    #[tokio::test]
    async fn test_env_tokens_for_different_teams_do_not_share_lookups() {
        use crate::store::credentials::TOKEN_ENV;

        let env = TestEnv::new();
        let connect = |token: &'static str, channel_id: &str| {
            let store = CredentialStore::new(&env.storage.credentials_dir)
                .with_env(move |key| (key == TOKEN_ENV).then(|| token.to_string()));
            let mock = MockSlack::new()
                .with_channels(&[("general", channel_id)])
                .respond("conversations.join", json!({}));
            (store, mock)
        };

        let (store_a, mock_a) = connect("xoxb-A", "C_A");
        let resolved_a = store_a.get_token(None, false).await.unwrap();
        let api_a = HollaApi::new(mock_a, env.cache.clone(), resolved_a.cache_namespace);
        api_a.join_channel("#general").await.unwrap();

        let (store_b, mock_b) = connect("xoxb-B", "C_B");
        let resolved_b = store_b.get_token(None, false).await.unwrap();
        let api_b = HollaApi::new(mock_b, env.cache.clone(), resolved_b.cache_namespace);
        api_b.join_channel("#general").await.unwrap();

        assert_eq!(api_b.client.call_count("conversations.list"), 1);
        assert_eq!(api_b.client.calls_to("conversations.join")[0]["channel"], "C_B");
    }

    #[tokio::test]
    async fn test_raw_call_passes_through() {
        let env = TestEnv::new();
        let api = api(&env, MockSlack::new().respond("bots.info", json!({"bot": {"id": "B1"}})));
        let raw = commands::passthrough::parse_args(&["bots.info".to_string()]).unwrap();

        let result = api.raw_call(&raw).await.unwrap();
        assert_eq!(result.raw.unwrap()["bot"]["id"], "B1");
    }

    #[tokio::test]
    async fn test_clear_cache_counts_files() {
        let env = TestEnv::new();
        let map: NameMap = [("general".to_string(), "C1".to_string())].into_iter().collect();
        env.cache.save("acme", EntityKind::Channels, &map).await.unwrap();
        env.cache.save("acme", EntityKind::Users, &map).await.unwrap();
        env.cache.save("globex", EntityKind::Users, &map).await.unwrap();

        let result = clear_cache(&env.cache, Some("acme")).await.unwrap();
        assert_eq!(result.messages[0].content, "Cache cleared for \"acme\" (2 files removed)");

        let result = clear_cache(&env.cache, None).await.unwrap();
        assert_eq!(result.messages[0].content, "Cache cleared (1 file removed)");
    }
}
