//! # Holla Architecture
//!
//! Holla is a **library for talking to chat workspaces** that happens to ship a
//! CLI. Each command maps onto one or a few Slack Web API calls; the interesting
//! parts are name resolution (with its on-disk cache) and text clean-up.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, reads stdin, renders output            │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, bound to one workspace        │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Resolve names, call Slack, shape rows                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │  Slack Layer (slack/)        │  │  Storage Layer (store/)  │
//! │  - SlackApi trait + client   │  │  - Credentials per       │
//! │  - Resolver, suggestions     │  │    workspace             │
//! │  - Text and attribution      │  │  - TTL name→ID cache     │
//! └──────────────────────────────┘  └──────────────────────────┘
//! ```
//!
//! ## Name Resolution
//!
//! Users type `#general` and `@ana`; Slack wants `C0123` and `U0456`. The
//! [`slack::Resolver`] turns sigil-prefixed names into IDs using a per-workspace
//! cache that is refilled from a full listing when missing or older than five
//! minutes. Input without a sigil is passed through untouched. A miss yields a
//! not-found error carrying the closest known names.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never prints and never exits. Network access goes
//! through the [`slack::SlackApi`] trait, so every command is tested against an
//! in-memory stand-in.
//!
//! ## Testing Strategy
//!
//! 1. **Commands** (`commands/*.rs`): unit tests against `MockSlack`, where most
//!    testing lives.
//! 2. **Slack and storage** (`slack/`, `store/`): resolver, cache and
//!    credential behaviour on temp directories.
//! 3. **API** (`api.rs`): dispatch tests.
//! 4. **CLI** (`cli/` + `tests/`): argument parsing, rendering, and end-to-end
//!    runs of the binary that need no network.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: One module per Slack resource group
//! - [`slack`]: Web API client, name resolution, text transforms, attribution
//! - [`store`]: Credential and cache files
//! - [`config`]: `config.json` preferences
//! - [`output`]: Table, plain and JSON formatting
//! - [`logging`]: tracing setup
//! - [`error`]: Error types
//! - `cli`: Argument parsing and terminal rendering for the binary (not part of the lib API)

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod slack;
pub mod store;

#[cfg(test)]
pub mod test_utils;
