use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely-typed parameter bag passed to any Slack method.
pub type Params = serde_json::Map<String, Value>;

/// Build a [`Params`] from any serializable request struct.
pub fn to_params<T: Serialize>(request: &T) -> Result<Params> {
    match serde_json::to_value(request)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Params::new()),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListConversations {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclude_archived: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListUsers {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Anything Slack lists with an `id` and a `name`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NamedEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationsPage {
    #[serde(default)]
    pub channels: Vec<NamedEntity>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersPage {
    #[serde(default)]
    pub members: Vec<NamedEntity>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserGroupsList {
    #[serde(default)]
    pub usergroups: Vec<UserGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub handle: String,
}

/// The subset of `auth.test` holla uses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// The non-empty cursor for the next page, if any.
pub fn next_cursor(meta: &Option<ResponseMetadata>) -> Option<String> {
    meta.as_ref()
        .and_then(|m| m.next_cursor.clone())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_conversations_params() {
        let params = to_params(&ListConversations {
            limit: 200,
            types: Some("public_channel,private_channel".to_string()),
            cursor: None,
            exclude_archived: true,
        })
        .unwrap();

        assert_eq!(params["limit"], 200);
        assert_eq!(params["exclude_archived"], true);
        assert!(!params.contains_key("cursor"));
    }

    #[test]
    fn test_empty_cursor_ends_pagination() {
        let page: ConversationsPage = serde_json::from_value(json!({
            "channels": [{"id": "C1", "name": "general"}],
            "response_metadata": {"next_cursor": ""}
        }))
        .unwrap();
        assert_eq!(next_cursor(&page.response_metadata), None);

        let page: UsersPage = serde_json::from_value(json!({
            "members": [],
            "response_metadata": {"next_cursor": "dXNlcjpVMDYx"}
        }))
        .unwrap();
        assert_eq!(
            next_cursor(&page.response_metadata).as_deref(),
            Some("dXNlcjpVMDYx")
        );
    }
}
