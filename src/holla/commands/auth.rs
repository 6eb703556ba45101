use super::{CmdMessage, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::output::Column;
use crate::slack::types::AuthInfo;
use crate::slack::SlackApi;
use crate::store::credentials::{CredentialStore, TokenType};
use serde_json::{json, Value};
use tracing::info;

const STATUS_COLUMNS: &[Column] = &[
    Column::new("workspace", "Workspace"),
    Column::new("bot", "Bot"),
    Column::new("user", "User"),
];

const WHOAMI_COLUMNS: &[Column] = &[
    Column::new("user_id", "User ID"),
    Column::new("user", "Username"),
    Column::new("team_id", "Team ID"),
    Column::new("team", "Team"),
    Column::new("url", "URL"),
];

/// Workspace key for a token: the first label of the team URL's host,
/// else the team name lowercased with whitespace runs turned into `-`.
pub fn workspace_name(auth: &AuthInfo) -> Option<String> {
    let from_url = auth
        .url
        .as_deref()
        .and_then(|u| reqwest::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string))
        .and_then(|host| host.split('.').next().map(str::to_string))
        .filter(|label| !label.is_empty());
    from_url.or_else(|| {
        auth.team.as_deref().map(|team| {
            team.split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
                .to_lowercase()
        })
    })
}

/// Verify `token` against `api` (a client built for it) and store it.
pub async fn login(store: &CredentialStore, api: &dyn SlackApi, token: &str) -> Result<CmdResult> {
    let token_type = TokenType::from_token(token).ok_or_else(|| {
        HollaError::invalid("Token must start with xoxb- (bot) or xoxp- (user)")
    })?;

    let auth = api.auth_test().await?;
    let team = auth.team.clone().unwrap_or_default();
    let workspace = workspace_name(&auth)
        .ok_or_else(|| HollaError::invalid("Slack did not report a team for this token"))?;

    store.store_token(&workspace, token_type, token).await?;
    info!(%workspace, token_type = token_type.as_str(), "logged in");

    Ok(CmdResult::success(format!(
        "Authorized! {} token saved for \"{}\" ({})",
        token_type.as_str(),
        team,
        workspace
    )))
}

/// Remove a workspace's credentials; with no name, the only stored workspace.
pub async fn logout(store: &CredentialStore, workspace: Option<&str>) -> Result<CmdResult> {
    let workspace = match workspace {
        Some(name) => name.to_string(),
        None => {
            let mut all = store.list_workspaces().await?;
            match all.len() {
                0 => {
                    return Ok(CmdResult::default()
                        .with_message(CmdMessage::info("No workspaces configured.")))
                }
                1 => all.remove(0).name,
                _ => {
                    return Err(HollaError::AmbiguousWorkspace {
                        available: all.into_iter().map(|w| w.name).collect(),
                    })
                }
            }
        }
    };

    if store.remove_workspace(&workspace).await {
        Ok(CmdResult::success(format!(
            "Credentials removed for \"{}\"",
            workspace
        )))
    } else {
        let available = store
            .list_workspaces()
            .await?
            .into_iter()
            .map(|w| w.name)
            .collect();
        Err(HollaError::WorkspaceNotFound {
            name: workspace,
            available,
        })
    }
}

/// Check every stored token. `connect` builds a client for one token.
pub async fn status<C, F>(store: &CredentialStore, connect: F) -> Result<CmdResult>
where
    C: SlackApi,
    F: Fn(&str) -> Result<C>,
{
    let workspaces = store.list_workspaces().await?;
    if workspaces.is_empty() {
        return Ok(CmdResult::default().with_message(CmdMessage::info(
            HollaError::NoWorkspaces.to_string(),
        )));
    }

    let mut rows = Vec::new();
    for ws in &workspaces {
        let bot = check_token(ws.bot_token.as_deref(), &connect).await;
        let user = check_token(ws.user_token.as_deref(), &connect).await;
        rows.push(json!({"workspace": ws.name, "bot": bot, "user": user}));
    }

    Ok(CmdResult::default().with_listing(Value::Array(rows), STATUS_COLUMNS))
}

async fn check_token<C, F>(token: Option<&str>, connect: &F) -> &'static str
where
    C: SlackApi,
    F: Fn(&str) -> Result<C>,
{
    let Some(token) = token else {
        return "-";
    };
    let verified = match connect(token) {
        Ok(client) => client.auth_test().await.is_ok(),
        Err(_) => false,
    };
    if verified {
        "✓"
    } else {
        "✗ (invalid)"
    }
}

pub async fn whoami(ctx: &Context<'_>) -> Result<CmdResult> {
    let auth = ctx.api().auth_test().await?;
    let row = json!({
        "user_id": auth.user_id.unwrap_or_default(),
        "user": auth.user.unwrap_or_default(),
        "team_id": auth.team_id.unwrap_or_default(),
        "team": auth.team.unwrap_or_default(),
        "url": auth.url.unwrap_or_default(),
    });
    Ok(CmdResult::default().with_listing(json!([row]), WHOAMI_COLUMNS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSlack, TestEnv};

    fn auth(team: Option<&str>, url: Option<&str>) -> AuthInfo {
        serde_json::from_value(json!({"team": team, "url": url})).unwrap()
    }

    #[test]
    fn test_workspace_name_from_url() {
        assert_eq!(
            workspace_name(&auth(Some("Acme Corp"), Some("https://acme-corp.slack.com/"))),
            Some("acme-corp".to_string())
        );
    }

    #[test]
    fn test_workspace_name_from_team() {
        assert_eq!(
            workspace_name(&auth(Some("Acme  Big Corp"), None)),
            Some("acme-big-corp".to_string())
        );
        assert_eq!(workspace_name(&auth(None, None)), None);
    }

    #[tokio::test]
    async fn test_login_stores_bot_token() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "auth.test",
            json!({"team": "Acme", "url": "https://acme.slack.com/"}),
        );

        let result = login(&env.credentials, &api, "xoxb-123").await.unwrap();
        assert!(result.messages[0].content.contains("bot token saved"));

        let creds = env.credentials.workspace_credentials("acme").await.unwrap();
        assert_eq!(creds.bot_token.as_deref(), Some("xoxb-123"));
        assert_eq!(creds.user_token, None);
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_prefix() {
        let env = TestEnv::new();
        let api = MockSlack::new();
        let err = login(&env.credentials, &api, "xapp-1").await.unwrap_err();
        assert!(matches!(err, HollaError::InvalidInput(_)));
        assert_eq!(api.call_count("auth.test"), 0);
    }

    #[tokio::test]
    async fn test_login_fails_on_invalid_token() {
        let env = TestEnv::new();
        let api = MockSlack::new().fail("auth.test", "invalid_auth");
        let err = login(&env.credentials, &api, "xoxp-1").await.unwrap_err();
        assert!(matches!(err, HollaError::Api { .. }));
        assert!(env.credentials.list_workspaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_single_workspace() {
        let env = TestEnv::new();
        env.credentials
            .store_token("acme", TokenType::Bot, "xoxb-1")
            .await
            .unwrap();

        let result = logout(&env.credentials, None).await.unwrap();
        assert_eq!(result.messages[0].level, crate::commands::MessageLevel::Success);
        assert!(env.credentials.list_workspaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_ambiguous_and_unknown() {
        let env = TestEnv::new();
        for ws in ["acme", "globex"] {
            env.credentials
                .store_token(ws, TokenType::Bot, "xoxb-1")
                .await
                .unwrap();
        }

        let err = logout(&env.credentials, None).await.unwrap_err();
        assert!(matches!(err, HollaError::AmbiguousWorkspace { .. }));

        let err = logout(&env.credentials, Some("initech")).await.unwrap_err();
        assert!(matches!(err, HollaError::WorkspaceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_logout_nothing_configured() {
        let env = TestEnv::new();
        let result = logout(&env.credentials, None).await.unwrap();
        assert_eq!(result.messages[0].content, "No workspaces configured.");
    }

    #[tokio::test]
    async fn test_status_checks_each_token() {
        let env = TestEnv::new();
        env.credentials
            .store_token("acme", TokenType::Bot, "xoxb-good")
            .await
            .unwrap();
        env.credentials
            .store_token("acme", TokenType::User, "xoxp-bad")
            .await
            .unwrap();

        let result = status(&env.credentials, |token: &str| {
            Ok(if token == "xoxb-good" {
                MockSlack::new()
            } else {
                MockSlack::new().fail("auth.test", "invalid_auth")
            })
        })
        .await
        .unwrap();

        let data = result.listing.unwrap().data;
        assert_eq!(data[0]["workspace"], "acme");
        assert_eq!(data[0]["bot"], "✓");
        assert_eq!(data[0]["user"], "✗ (invalid)");
    }

    #[tokio::test]
    async fn test_whoami_row() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond(
            "auth.test",
            json!({"user": "ana", "user_id": "U1", "team": "Acme", "team_id": "T1"}),
        );
        let ctx = Context::new(&api, &env.cache, "acme");
        let data = whoami(&ctx).await.unwrap().listing.unwrap().data;
        assert_eq!(data[0]["user"], "ana");
        assert_eq!(data[0]["url"], "");
    }
}
