use super::{collect_pages, params, text_at, value_at, CmdResult, Context, PageRequest};
use crate::error::{HollaError, Result};
use crate::output::Column;
use serde_json::{json, Value};

const LIST_COLUMNS: &[Column] = &[
    Column::new("id", "ID"),
    Column::new("name", "Name"),
    Column::new("real_name", "Real Name"),
    Column::new("display_name", "Display Name"),
];

pub async fn list(ctx: &Context<'_>, page: &PageRequest) -> Result<CmdResult> {
    let (members, next) =
        collect_pages(ctx, "users.list", Default::default(), page, "members").await?;
    let rows: Vec<Value> = members
        .iter()
        .filter(|u| !u.get("deleted").and_then(Value::as_bool).unwrap_or(false))
        .map(|u| {
            json!({
                "id": text_at(u, "/id"),
                "name": text_at(u, "/name"),
                "real_name": text_at(u, "/real_name"),
                "display_name": text_at(u, "/profile/display_name"),
            })
        })
        .collect();

    Ok(CmdResult::default()
        .with_listing(Value::Array(rows), LIST_COLUMNS)
        .with_next_cursor(next))
}

fn profile(user: &Value) -> Value {
    let status = format!(
        "{} {}",
        text_at(user, "/profile/status_emoji"),
        text_at(user, "/profile/status_text")
    );
    json!({
        "id": text_at(user, "/id"),
        "name": text_at(user, "/name"),
        "real_name": text_at(user, "/real_name"),
        "display_name": text_at(user, "/profile/display_name"),
        "email": text_at(user, "/profile/email"),
        "timezone": text_at(user, "/tz"),
        "admin": user.get("is_admin").and_then(Value::as_bool).unwrap_or(false),
        "bot": user.get("is_bot").and_then(Value::as_bool).unwrap_or(false),
        "status": status.trim(),
    })
}

pub async fn info(ctx: &Context<'_>, user: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_user(user).await?;
    let body = ctx.call("users.info", params([("user", json!(id))])).await?;
    Ok(CmdResult::default().with_data(profile(&value_at(&body, "/user"))))
}

pub async fn find(ctx: &Context<'_>, email: &str) -> Result<CmdResult> {
    let body = ctx
        .call("users.lookupByEmail", params([("email", json!(email))]))
        .await?;
    Ok(CmdResult::default().with_data(profile(&value_at(&body, "/user"))))
}

pub async fn presence(ctx: &Context<'_>, user: &str) -> Result<CmdResult> {
    let id = ctx.resolver().resolve_user(user).await?;
    let body = ctx
        .call("users.getPresence", params([("user", json!(id))]))
        .await?;
    let presence = body
        .get("presence")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Ok(CmdResult::default().with_data(json!({
        "presence": presence,
        "online": value_at(&body, "/online"),
        "auto_away": value_at(&body, "/auto_away"),
    })))
}

pub const PRESENCE_VALUES: &[&str] = &["auto", "away"];

/// Editable profile fields; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileChange {
    pub display_name: Option<String>,
    pub status_text: Option<String>,
    pub status_emoji: Option<String>,
}

/// The profile card of `user`, or of the token's own user.
pub async fn profile_card(ctx: &Context<'_>, user: Option<&str>) -> Result<CmdResult> {
    let user_id = match user {
        Some(u) => Some(ctx.resolver().resolve_user(u).await?),
        None => None,
    };
    let body = ctx
        .call("users.profile.get", params([("user", json!(user_id))]))
        .await?;
    let p = value_at(&body, "/profile");
    let status = format!(
        "{} {}",
        text_at(&p, "/status_emoji"),
        text_at(&p, "/status_text")
    );
    Ok(CmdResult::default().with_data(json!({
        "real_name": text_at(&p, "/real_name"),
        "display_name": text_at(&p, "/display_name"),
        "email": text_at(&p, "/email"),
        "phone": text_at(&p, "/phone"),
        "title": text_at(&p, "/title"),
        "status": status.trim(),
        "avatar": text_at(&p, "/image_72"),
    })))
}

pub async fn set_presence(ctx: &Context<'_>, presence: &str) -> Result<CmdResult> {
    if !PRESENCE_VALUES.contains(&presence) {
        return Err(HollaError::invalid("Presence must be \"auto\" or \"away\""));
    }
    ctx.call("users.setPresence", params([("presence", json!(presence))]))
        .await?;
    Ok(CmdResult::success(format!("Presence set to \"{}\"", presence)))
}

pub async fn set_profile(ctx: &Context<'_>, change: &ProfileChange) -> Result<CmdResult> {
    let profile = params([
        ("display_name", json!(change.display_name)),
        ("status_text", json!(change.status_text)),
        ("status_emoji", json!(change.status_emoji)),
    ]);
    if profile.is_empty() {
        return Err(HollaError::invalid(
            "At least one profile field is required: --display-name, --status-text, --status-emoji",
        ));
    }
    ctx.call("users.profile.set", params([("profile", Value::Object(profile))]))
        .await?;
    Ok(CmdResult::success("Profile updated"))
}
