use super::{params, text_at, CmdMessage, CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::output::Column;
use crate::slack::ResolvedGroup;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("handle", "Handle"),
    Column::new("description", "Description"),
];

const MEMBER_COLUMNS: &[Column] = &[Column::new("user_id", "User ID")];

pub async fn list(ctx: &Context<'_>, include_disabled: bool) -> Result<CmdResult> {
    let body = ctx
        .call(
            "usergroups.list",
            params([("include_disabled", json!(include_disabled))]),
        )
        .await?;

    let rows: Vec<Value> = body
        .get("usergroups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .map(|g| {
                    json!({
                        "id": text_at(g, "/id"),
                        "name": text_at(g, "/name"),
                        "handle": text_at(g, "/handle"),
                        "description": text_at(g, "/description"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CmdResult::default().with_listing(Value::Array(rows), LIST_COLUMNS))
}

async fn current_members(ctx: &Context<'_>, group: &ResolvedGroup) -> Result<Vec<String>> {
    let body = ctx
        .call(
            "usergroups.users.list",
            params([("usergroup", json!(group.id))]),
        )
        .await?;
    Ok(body
        .get("users")
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

async fn update_members(ctx: &Context<'_>, group: &ResolvedGroup, users: &[String]) -> Result<()> {
    ctx.call(
        "usergroups.users.update",
        params([
            ("usergroup", json!(group.id)),
            ("users", json!(users.join(","))),
        ]),
    )
    .await?;
    Ok(())
}

pub async fn members(ctx: &Context<'_>, group: &str) -> Result<CmdResult> {
    let group = ctx.resolver().resolve_group(group).await?;
    let rows: Vec<Value> = current_members(ctx, &group)
        .await?
        .into_iter()
        .map(|id| json!({"user_id": id}))
        .collect();
    Ok(CmdResult::default().with_listing(Value::Array(rows), MEMBER_COLUMNS))
}

pub async fn add_member(ctx: &Context<'_>, group: &str, user: &str) -> Result<CmdResult> {
    let group = ctx.resolver().resolve_group(group).await?;
    let user_id = ctx.resolver().resolve_user(user).await?;
    let mut members = current_members(ctx, &group).await?;
    let user_name = ctx.resolver().resolve_user_name(&user_id).await;

    if members.contains(&user_id) {
        return Ok(CmdResult::default().with_message(CmdMessage::info(format!(
            "@{} is already a member of {} (@{})",
            user_name, group.name, group.handle
        ))));
    }

    members.push(user_id);
    update_members(ctx, &group, &members).await?;
    Ok(CmdResult::success(format!(
        "Added @{} to {} (@{})",
        user_name, group.name, group.handle
    )))
}

pub async fn remove_member(ctx: &Context<'_>, group: &str, user: &str) -> Result<CmdResult> {
    let group = ctx.resolver().resolve_group(group).await?;
    let user_id = ctx.resolver().resolve_user(user).await?;
    let members = current_members(ctx, &group).await?;
    let user_name = ctx.resolver().resolve_user_name(&user_id).await;

    if !members.contains(&user_id) {
        return Ok(CmdResult::default().with_message(CmdMessage::info(format!(
            "@{} is not a member of {} (@{})",
            user_name, group.name, group.handle
        ))));
    }

    let remaining: Vec<String> = members.into_iter().filter(|m| *m != user_id).collect();
    update_members(ctx, &group, &remaining).await?;
    Ok(CmdResult::success(format!(
        "Removed @{} from {} (@{})",
        user_name, group.name, group.handle
    )))
}

/// Name, handle and description of a user group; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct GroupFields {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub description: Option<String>,
}

pub async fn create(ctx: &Context<'_>, name: &str, fields: &GroupFields) -> Result<CmdResult> {
    let body = ctx
        .call(
            "usergroups.create",
            params([
                ("name", json!(name)),
                ("handle", json!(fields.handle)),
                ("description", json!(fields.description)),
            ]),
        )
        .await?;
    let created_name = match text_at(&body, "/usergroup/name") {
        n if n.is_empty() => name.to_string(),
        n => n,
    };
    let id = match text_at(&body, "/usergroup/id") {
        id if id.is_empty() => "unknown".to_string(),
        id => id,
    };
    Ok(CmdResult::success(format!("User group created: {} ({})", created_name, id)))
}

/// Admin operations take the group ID so disabled groups stay reachable.
pub async fn update(ctx: &Context<'_>, group: &str, fields: &GroupFields) -> Result<CmdResult> {
    ctx.call(
        "usergroups.update",
        params([
            ("usergroup", json!(group)),
            ("name", json!(fields.name)),
            ("handle", json!(fields.handle)),
            ("description", json!(fields.description)),
        ]),
    )
    .await?;
    Ok(CmdResult::success(format!("User group {} updated", group)))
}

pub async fn enable(ctx: &Context<'_>, group: &str) -> Result<CmdResult> {
    ctx.call("usergroups.enable", params([("usergroup", json!(group))]))
        .await?;
    Ok(CmdResult::success(format!("User group {} enabled", group)))
}

pub async fn disable(ctx: &Context<'_>, group: &str) -> Result<CmdResult> {
    ctx.call("usergroups.disable", params([("usergroup", json!(group))]))
        .await?;
    Ok(CmdResult::success(format!("User group {} disabled", group)))
}

/// Replace a group's whole membership with `users` (comma-separated).
pub async fn set_members(ctx: &Context<'_>, group: &str, users: &str) -> Result<CmdResult> {
    let mut ids = Vec::new();
    for user in users.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        ids.push(ctx.resolver().resolve_user(user).await?);
    }
    if ids.is_empty() {
        return Err(HollaError::invalid("Provide at least one user"));
    }
    ctx.call(
        "usergroups.users.update",
        params([("usergroup", json!(group)), ("users", json!(ids.join(",")))]),
    )
    .await?;
    Ok(CmdResult::success(format!("Members updated for user group {}", group)))
}
