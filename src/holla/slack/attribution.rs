//! Marking messages that were sent on someone's behalf by a tool.
//!
//! A sent message may get a reaction (default `:robot_face:`) and/or a text
//! suffix naming the agent that sent it. Both come from `config.json` and can
//! be switched off per invocation.

use super::client::SlackApi;
use super::types::Params;
use crate::config::{HollaConfig, Setting};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_REACTION: &str = "robot_face";
pub const DEFAULT_AGENT: &str = "holla";

/// Snapshot of the process facts agent detection looks at.
#[derive(Debug, Clone, Default)]
pub struct AgentSignals {
    pub vars: Vec<(String, String)>,
    pub parent: Option<String>,
}

impl AgentSignals {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
            parent: parent_process_name(),
        }
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn detect(&self, override_name: Option<&str>) -> String {
        if let Some(name) = override_name.filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if self.var("CLAUDECODE") == Some("1") {
            return "claude".to_string();
        }
        if self.vars.iter().any(|(k, _)| k.starts_with("CURSOR_")) {
            return "cursor".to_string();
        }
        if self
            .parent
            .as_deref()
            .is_some_and(|name| name.contains("claude"))
        {
            return "claude".to_string();
        }
        DEFAULT_AGENT.to_string()
    }
}

/// Name of the agent driving this process, unless `override_name` is given.
/// The process is only inspected when there is no override.
pub fn detect_agent(override_name: Option<&str>) -> String {
    match override_name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => AgentSignals::from_process().detect(None),
    }
}

#[cfg(unix)]
fn parent_process_name() -> Option<String> {
    let ppid = std::os::unix::process::parent_id();
    let output = std::process::Command::new("ps")
        .args(["-p", &ppid.to_string(), "-o", "comm="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn parent_process_name() -> Option<String> {
    None
}

/// `text` followed by a line with `template`, `{agent}` substituted.
pub fn apply_suffix(text: &str, agent: &str, template: &str) -> String {
    format!("{}\n{}", text, template.replace("{agent}", agent))
}

/// Per-invocation switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct AttributionFlags {
    pub agent: Option<String>,
    pub no_attribution: bool,
    pub no_reaction: bool,
    pub no_suffix: bool,
}

/// Effective attribution for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionConfig {
    pub reaction: Option<String>,
    pub suffix: Option<String>,
    pub agent: String,
}

impl AttributionConfig {
    /// `agent` is only asked for when a suffix will be written.
    pub fn resolve<F>(config: &HollaConfig, flags: &AttributionFlags, agent: F) -> Self
    where
        F: FnOnce() -> String,
    {
        let settings = config.attribution();

        let mut reaction = match settings.and_then(|a| a.reaction.as_ref()) {
            None | Some(Setting::Flag(true)) => Some(DEFAULT_REACTION.to_string()),
            Some(Setting::Flag(false)) => None,
            Some(Setting::Value(v)) => Some(v.clone()),
        };
        let mut suffix = settings
            .and_then(|a| a.suffix.as_ref())
            .and_then(Setting::value)
            .map(str::to_string);

        if flags.no_attribution || flags.no_reaction {
            reaction = None;
        }
        if flags.no_attribution || flags.no_suffix {
            suffix = None;
        }

        let agent = match suffix {
            Some(_) => agent(),
            None => DEFAULT_AGENT.to_string(),
        };
        Self {
            reaction,
            suffix,
            agent,
        }
    }

    /// Message text with the suffix applied, if one is configured.
    pub fn decorate(&self, text: &str) -> String {
        match &self.suffix {
            Some(template) => apply_suffix(text, &self.agent, template),
            None => text.to_string(),
        }
    }
}

/// Add `emoji` to a message. Failures are logged and ignored.
pub async fn add_reaction(api: &dyn SlackApi, channel: &str, ts: &str, emoji: &str) {
    let mut params = Params::new();
    params.insert("channel".into(), Value::from(channel));
    params.insert("timestamp".into(), Value::from(ts));
    params.insert("name".into(), Value::from(emoji));
    if let Err(e) = api.call("reactions.add", params).await {
        debug!(error = %e, emoji, "attribution reaction failed");
    }
}
