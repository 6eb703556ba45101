//! Raw Web API passthrough: `holla slack api <method> [--key value ...]`.
//!
//! Arguments arrive unparsed so any method parameter can be given. A JSON
//! object body (via `--body` or as a bare positional) forms the base, and
//! `--key value` pairs are layered over it with kebab-case keys camel-cased.

use super::{CmdResult, Context};
use crate::error::{HollaError, Result};
use crate::slack::types::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static KEBAB: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([a-z])").expect("valid kebab pattern"));

const USAGE: &str = "Usage: holla slack api <method> [--key value ...]";

/// A parsed passthrough invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCall {
    pub method: String,
    pub params: Params,
    /// `--workspace`/`-w` given after the method name.
    pub workspace: Option<String>,
}

fn camel_case(key: &str) -> String {
    KEBAB
        .replace_all(key, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

fn parse_body(raw: &str, source: &str) -> Result<Params> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HollaError::invalid(format!(
            "{} must be a JSON object",
            source
        ))),
        Err(_) => Err(HollaError::invalid(format!("Invalid JSON in {}", source))),
    }
}

pub fn parse_args(args: &[String]) -> Result<RawCall> {
    let method = match args.first() {
        Some(m) if !m.is_empty() && !m.starts_with('-') => m.clone(),
        _ => return Err(HollaError::invalid(USAGE)),
    };

    let mut flag_body: Option<&str> = None;
    let mut positional_body: Option<&str> = None;
    let mut workspace = None;
    let mut pairs: Vec<(String, Value)> = Vec::new();

    let rest = &args[1..];
    let mut i = 0;
    while i < rest.len() {
        let arg = rest[i].as_str();
        let next = rest
            .get(i + 1)
            .map(String::as_str)
            .filter(|n| !n.starts_with("--"));

        match arg {
            "--body" | "--workspace" | "-w" => {
                let value = next.ok_or_else(|| {
                    HollaError::invalid(format!("{} requires a value", arg))
                })?;
                if arg == "--body" {
                    flag_body = Some(value);
                } else {
                    workspace = Some(value.to_string());
                }
                i += 2;
            }
            _ if arg.starts_with("--") => {
                let key = camel_case(&arg[2..]);
                match next {
                    Some(value) => {
                        pairs.push((key, Value::String(value.to_string())));
                        i += 2;
                    }
                    None => {
                        pairs.push((key, Value::Bool(true)));
                        i += 1;
                    }
                }
            }
            _ if arg.trim_start().starts_with('{') => {
                if positional_body.is_none() {
                    positional_body = Some(arg);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    let mut params = match (flag_body, positional_body) {
        (Some(body), _) => parse_body(body, "--body")?,
        (None, Some(body)) => parse_body(body, "body")?,
        (None, None) => Params::new(),
    };
    if let (Some(_), Some(positional)) = (flag_body, positional_body) {
        // Still reject garbage even though --body wins.
        parse_body(positional, "body")?;
    }
    params.extend(pairs);

    Ok(RawCall {
        method,
        params,
        workspace,
    })
}

/// Invoke the method and hand back Slack's response untouched.
pub async fn call(ctx: &Context<'_>, raw: &RawCall) -> Result<CmdResult> {
    let body = ctx.call(&raw.method, raw.params.clone()).await?;
    Ok(CmdResult::default().with_raw(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSlack, TestEnv};
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parsed(list: &[&str]) -> Value {
        Value::Object(parse_args(&args(list)).unwrap().params)
    }

    #[test]
    fn test_method_only() {
        let raw = parse_args(&args(&["users.list"])).unwrap();
        assert_eq!(raw.method, "users.list");
        assert!(raw.params.is_empty());
        assert_eq!(raw.workspace, None);
    }

    #[test]
    fn test_missing_method_is_usage_error() {
        assert!(parse_args(&[]).is_err());
        let err = parse_args(&args(&["--limit", "5"])).unwrap_err();
        assert!(err.to_string().starts_with("Usage:"));
    }

    #[test]
    fn test_body_flag_and_positional() {
        assert_eq!(
            parsed(&["users.list", "--body", r#"{"limit":100}"#]),
            json!({"limit": 100})
        );
        assert_eq!(
            parsed(&["users.list", r#"{"limit":1000}"#]),
            json!({"limit": 1000})
        );
        assert_eq!(
            parsed(&["users.list", "--body", r#"{"limit":50}"#, r#"{"limit":100}"#]),
            json!({"limit": 50})
        );
    }

    #[test]
    fn test_kebab_flags_become_camel_case() {
        assert_eq!(
            parsed(&["conversations.list", "--exclude-archived", "true"]),
            json!({"excludeArchived": "true"})
        );
        assert_eq!(
            parsed(&["conversations.list", "--exclude-archived", "--limit", "5"]),
            json!({"excludeArchived": true, "limit": "5"})
        );
    }

    #[test]
    fn test_flags_override_body() {
        assert_eq!(
            parsed(&["users.list", "--body", r#"{"limit":1,"team_id":"T1"}"#, "--limit", "9"]),
            json!({"limit": "9", "team_id": "T1"})
        );
    }

    #[test]
    fn test_workspace_is_not_a_param() {
        let raw =
            parse_args(&args(&["users.list", "--workspace", "acme", "--limit", "50"])).unwrap();
        assert_eq!(raw.workspace.as_deref(), Some("acme"));
        assert_eq!(Value::Object(raw.params), json!({"limit": "50"}));

        let raw = parse_args(&args(&["users.list", "-w", "acme"])).unwrap();
        assert_eq!(raw.workspace.as_deref(), Some("acme"));
        assert!(raw.params.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_args(&args(&["users.list", "--body", "not-json"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON in --body");
        assert!(parse_args(&args(&["users.list", "{not-json}"])).is_err());
        assert!(parse_args(&args(&["users.list", "--body", "[1]"])).is_err());
    }

    #[test]
    fn test_nested_body() {
        assert_eq!(
            parsed(&[
                "chat.postMessage",
                "--body",
                r#"{"channel":"C123","blocks":[{"type":"section"}]}"#
            ]),
            json!({"channel": "C123", "blocks": [{"type": "section"}]})
        );
    }

    #[tokio::test]
    async fn test_call_returns_raw_body() {
        let env = TestEnv::new();
        let api = MockSlack::new().respond("emoji.list", json!({"emoji": {"party": "url"}}));
        let ctx = Context::new(&api, &env.cache, "acme");

        let raw = parse_args(&args(&["emoji.list", "--include-categories"])).unwrap();
        let result = call(&ctx, &raw).await.unwrap();
        assert_eq!(result.raw.unwrap()["emoji"]["party"], "url");
        assert_eq!(api.calls_to("emoji.list")[0]["includeCategories"], true);
    }
}
