//! Everything that knows about Slack itself: the Web API client, name
//! resolution, message attribution and text clean-up.

pub mod attribution;
pub mod client;
pub mod resolve;
pub mod suggest;
pub mod text;
pub mod types;

pub use client::{SlackApi, SlackClient};
pub use resolve::{ResolvedGroup, Resolver};
