//! Text clean-up applied before content is sent to Slack.

use once_cell::sync::Lazy;
use regex::Regex;

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^|>\s]+)\|([^>]+)>").expect("valid link pattern"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s").expect("valid numbered item pattern"));
static INDENTED_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s+)-\s").expect("valid bullet pattern"));

/// What to do with Slack `<url|label>` link markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// Leave links as Slack markup (messages).
    #[default]
    Slack,
    /// Rewrite to `[label](url)` (markdown destinations such as canvases).
    Markdown,
}

/// Undo shell mangling of Slack special syntax.
///
/// zsh history expansion escapes `!` inside `<>`, turning `<!here>` into
/// `<\!here>`; every such backslash is removed. With [`LinkStyle::Markdown`],
/// `<http(s)://…|label>` links also become `[label](url)`. User and channel
/// mentions are never touched.
pub fn normalize_slack_text(text: &str, links: LinkStyle) -> String {
    let text = text.replace("<\\!", "<!");
    match links {
        LinkStyle::Slack => text,
        LinkStyle::Markdown => LINK.replace_all(&text, "[$2]($1)").into_owned(),
    }
}

/// Result of [`sanitize_canvas_markdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub markdown: String,
    /// True when at least one line was rewritten.
    pub modified: bool,
}

/// Rewrite bullet sub-items under a numbered item into numbered sub-items.
///
/// The canvas API rejects a `-` list nested inside a `1.` list. Inside a
/// numbered list, each indented `- ` child becomes `N. ` (numbering restarts
/// under every parent) with its indentation kept. A non-empty, unindented line
/// that is not a numbered item ends the list, so bullets after it are left
/// alone. Applying the function to its own output changes nothing.
pub fn sanitize_canvas_markdown(markdown: &str) -> Sanitized {
    let mut in_numbered = false;
    let mut sub_counter = 0usize;
    let mut modified = false;
    let mut out = Vec::new();

    for line in markdown.split('\n') {
        if NUMBERED_ITEM.is_match(line) {
            in_numbered = true;
            sub_counter = 0;
            out.push(line.to_string());
            continue;
        }

        if in_numbered {
            if let Some(caps) = INDENTED_BULLET.captures(line) {
                sub_counter += 1;
                let indent = &caps[1];
                let rest = &line[caps[0].len()..];
                out.push(format!("{}{}. {}", indent, sub_counter, rest));
                modified = true;
                continue;
            }
        }

        let indented = line.starts_with(|c: char| c.is_whitespace());
        if !line.is_empty() && !indented {
            in_numbered = false;
        }
        out.push(line.to_string());
    }

    Sanitized {
        markdown: out.join("\n"),
        modified,
    }
}
