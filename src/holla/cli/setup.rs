use clap::{Args, Parser, Subcommand};
use holla::commands::PageRequest;
use holla::slack::attribution::AttributionFlags;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "holla", bin_name = "holla", version)]
#[command(about = "Talk to your chat workspaces from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Platform,

    /// Workspace to use when several are logged in
    #[arg(short, long, global = true, help_heading = "Options")]
    pub workspace: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, conflicts_with = "plain", help_heading = "Options")]
    pub json: bool,

    /// Output as tab-separated plain text
    #[arg(long, global = true, help_heading = "Options")]
    pub plain: bool,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Platform {
    /// Slack workspaces
    Slack {
        #[command(subcommand)]
        command: SlackCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SlackCommand {
    /// Log in, log out and inspect stored tokens
    #[command(display_order = 1)]
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Browse and manage channels
    #[command(display_order = 2)]
    Channels {
        #[command(subcommand)]
        command: ChannelsCommand,
    },

    /// Send, edit and inspect messages
    #[command(display_order = 3)]
    Chat {
        #[command(subcommand)]
        command: ChatCommand,
    },

    /// Emoji reactions on messages
    #[command(display_order = 4)]
    Reactions {
        #[command(subcommand)]
        command: ReactionsCommand,
    },

    /// Look up people
    #[command(display_order = 5)]
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Pinned messages
    #[command(display_order = 6)]
    Pins {
        #[command(subcommand)]
        command: PinsCommand,
    },

    /// Search messages and files
    #[command(display_order = 7)]
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },

    /// User groups (@handles)
    #[command(display_order = 8)]
    Groups {
        #[command(subcommand)]
        command: GroupsCommand,
    },

    /// Canvases
    #[command(display_order = 9)]
    Canvases {
        #[command(subcommand)]
        command: CanvasesCommand,
    },

    /// Do not disturb
    #[command(display_order = 10)]
    Dnd {
        #[command(subcommand)]
        command: DndCommand,
    },

    /// Reminders
    #[command(display_order = 11)]
    Reminders {
        #[command(subcommand)]
        command: RemindersCommand,
    },

    /// Workspace details
    #[command(display_order = 12)]
    Team {
        #[command(subcommand)]
        command: TeamCommand,
    },

    /// Shared files
    #[command(display_order = 13)]
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },

    /// Saved (starred) messages and files
    #[command(display_order = 14)]
    Stars {
        #[command(subcommand)]
        command: StarsCommand,
    },

    /// Channel bookmarks
    #[command(display_order = 15)]
    Bookmarks {
        #[command(subcommand)]
        command: BookmarksCommand,
    },

    /// Custom emoji
    #[command(display_order = 16)]
    Emoji {
        #[command(subcommand)]
        command: EmojiCommand,
    },

    /// Local name lookup cache
    #[command(display_order = 17)]
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Raw Slack API passthrough (any method)
    #[command(display_order = 18)]
    Api {
        /// Raw JSON body
        #[arg(long)]
        body: Option<String>,

        /// API method followed by --key value pairs
        #[arg(
            value_name = "METHOD [--key value ...]",
            trailing_var_arg = true,
            allow_hyphen_values = true,
            num_args = 0..
        )]
        args: Vec<String>,
    },
}

impl SlackCommand {
    /// Whether the command works best with (or needs) a user token.
    pub fn prefers_user_token(&self) -> bool {
        matches!(
            self,
            SlackCommand::Chat {
                command: ChatCommand::Edit { .. } | ChatCommand::Schedule { .. }
            } | SlackCommand::Users {
                command: UsersCommand::SetPresence { .. } | UsersCommand::SetProfile { .. }
            } | SlackCommand::Files {
                command: FilesCommand::Upload { .. }
            } | SlackCommand::Search { .. }
                | SlackCommand::Dnd { .. }
                | SlackCommand::Reminders { .. }
                | SlackCommand::Stars { .. }
        )
    }
}

/// Cursor pagination flags shared by listings.
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Number of results per page (default 20)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Pagination cursor from a previous call
    #[arg(long)]
    pub cursor: Option<String>,

    /// Keep fetching until every page is read
    #[arg(long)]
    pub all: bool,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        PageRequest {
            limit: args.limit,
            cursor: args.cursor,
            all: args.all,
        }
    }
}

/// A message addressed by channel and timestamp.
#[derive(Args, Debug, Clone)]
pub struct MessageRef {
    /// Channel ID or #name
    #[arg(long)]
    pub channel: String,

    /// Message timestamp
    #[arg(long)]
    pub ts: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AttributionArgs {
    /// Agent name used in the attribution suffix
    #[arg(long)]
    pub agent: Option<String>,

    /// Send without reaction or suffix
    #[arg(long)]
    pub no_attribution: bool,

    /// Skip the attribution reaction
    #[arg(long)]
    pub no_reaction: bool,

    /// Skip the attribution suffix
    #[arg(long)]
    pub no_suffix: bool,
}

impl From<&AttributionArgs> for AttributionFlags {
    fn from(args: &AttributionArgs) -> Self {
        AttributionFlags {
            agent: args.agent.clone(),
            no_attribution: args.no_attribution,
            no_reaction: args.no_reaction,
            no_suffix: args.no_suffix,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store a bot (xoxb-) or user (xoxp-) token
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget a workspace's tokens
    Logout,
    /// Check every stored token
    Status,
    /// Show who the current token belongs to
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum ChannelsCommand {
    /// List channels
    #[command(alias = "ls")]
    List {
        /// Conversation types, e.g. public_channel,private_channel
        #[arg(long)]
        types: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show channel details
    Info {
        #[arg(long)]
        channel: String,
    },
    /// Fetch message history
    History {
        #[arg(long)]
        channel: String,
        /// Only messages before this timestamp
        #[arg(long)]
        before: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Fetch a thread
    Replies {
        #[arg(long)]
        channel: String,
        /// Thread parent timestamp
        #[arg(long)]
        ts: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// List channel members
    Members {
        #[arg(long)]
        channel: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Join a channel
    Join {
        #[arg(long)]
        channel: String,
    },
    /// Leave a channel
    Leave {
        #[arg(long)]
        channel: String,
    },
    /// Invite users (comma-separated IDs or @names)
    Invite {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user: String,
    },
    /// Remove a user from a channel
    Kick {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user: String,
    },
    /// Create a channel
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        private: bool,
    },
    /// Archive a channel
    Archive {
        #[arg(long)]
        channel: String,
    },
    /// Unarchive a channel
    Unarchive {
        #[arg(long)]
        channel: String,
    },
    /// Set the channel topic
    Topic {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        topic: String,
    },
    /// Set the channel purpose
    Purpose {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        purpose: String,
    },
    /// Move the read cursor
    MarkRead {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        ts: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    /// Send a message (reads stdin when --message is absent)
    Send {
        #[arg(long)]
        channel: String,
        #[arg(short, long)]
        message: Option<String>,
        #[command(flatten)]
        attribution: AttributionArgs,
    },
    /// Reply in a thread (reads stdin when --message is absent)
    Reply {
        #[arg(long)]
        channel: String,
        /// Thread parent timestamp
        #[arg(long)]
        thread: String,
        #[arg(short, long)]
        message: Option<String>,
        #[command(flatten)]
        attribution: AttributionArgs,
    },
    /// Fetch one message
    Get {
        #[command(flatten)]
        target: MessageRef,
    },
    /// Edit a message
    Edit {
        #[command(flatten)]
        target: MessageRef,
        #[arg(short, long)]
        message: String,
    },
    /// Delete a message
    Delete {
        #[command(flatten)]
        target: MessageRef,
    },
    /// Print a message's permalink
    Permalink {
        #[command(flatten)]
        target: MessageRef,
    },
    /// Schedule a message
    Schedule {
        #[arg(long)]
        channel: String,
        #[arg(short, long)]
        message: String,
        /// Unix timestamp to post at
        #[arg(long)]
        at: String,
    },
    /// Ephemeral message only one user sees
    Whisper {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user: String,
        #[arg(short, long)]
        message: String,
    },
    /// Attach link previews to a message
    Unfurl {
        #[command(flatten)]
        target: MessageRef,
        /// JSON object keyed by URL
        #[arg(long)]
        unfurls: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReactionsCommand {
    /// Add a reaction
    Add {
        #[command(flatten)]
        target: MessageRef,
        /// Emoji name, with or without colons
        #[arg(long)]
        name: String,
    },
    /// Remove a reaction
    Remove {
        #[command(flatten)]
        target: MessageRef,
        #[arg(long)]
        name: String,
    },
    /// Reactions on a message
    Get {
        #[command(flatten)]
        target: MessageRef,
    },
    /// Items a user has reacted to
    #[command(alias = "ls")]
    List {
        /// User ID or @name (defaults to yourself)
        #[arg(long)]
        user: Option<String>,
        /// Number of results (default 20)
        #[arg(long)]
        limit: Option<u32>,
        /// Pagination cursor from a previous call
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a user's profile
    Info {
        #[arg(long)]
        user: String,
    },
    /// Look a user up by email
    Find {
        #[arg(long)]
        email: String,
    },
    /// Show presence
    Presence {
        #[arg(long)]
        user: String,
    },
    /// Show a profile card (defaults to yourself)
    Profile {
        #[arg(long)]
        user: Option<String>,
    },
    /// Set your presence to auto or away
    SetPresence {
        #[arg(long)]
        presence: String,
    },
    /// Update your display name or status
    SetProfile {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        status_text: Option<String>,
        /// Emoji such as :palm_tree:
        #[arg(long)]
        status_emoji: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PinsCommand {
    /// Pin a message
    Add {
        #[command(flatten)]
        target: MessageRef,
    },
    /// Unpin a message
    Remove {
        #[command(flatten)]
        target: MessageRef,
    },
    /// List pinned items
    List {
        #[arg(long)]
        channel: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub query: String,
    /// Results per page (default 20)
    #[arg(long)]
    pub limit: Option<u32>,
    /// Page number
    #[arg(long)]
    pub page: Option<u32>,
    /// score or timestamp
    #[arg(long)]
    pub sort: Option<String>,
    /// asc or desc
    #[arg(long)]
    pub sort_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    /// Search messages
    Messages {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search files
    Files {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search messages and files together
    All {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupsCommand {
    /// List user groups
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        include_disabled: bool,
    },
    /// List a group's members
    Members {
        /// Group ID or handle
        #[arg(long)]
        group: String,
    },
    /// Add a user to a group
    AddMember {
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
    },
    /// Remove a user from a group
    RemoveMember {
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
    },
    /// Replace a group's members
    SetMembers {
        /// Group ID
        #[arg(long)]
        group: String,
        /// Comma-separated user IDs or @names
        #[arg(long)]
        users: String,
    },
    /// Create a user group
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename or describe a user group
    Update {
        /// Group ID
        #[arg(long)]
        group: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Enable a user group
    Enable {
        /// Group ID
        #[arg(long)]
        group: String,
    },
    /// Disable a user group
    Disable {
        /// Group ID
        #[arg(long)]
        group: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CanvasesCommand {
    /// Create a canvas
    Create {
        #[arg(long)]
        title: Option<String>,
        /// Markdown content
        #[arg(long)]
        markdown: Option<String>,
    },
    /// Change a canvas
    Edit {
        #[arg(long)]
        canvas: String,
        /// insert_at_start, insert_at_end, insert_before, insert_after, replace or delete
        #[arg(long)]
        operation: String,
        #[arg(long)]
        markdown: Option<String>,
        #[arg(long)]
        section_id: Option<String>,
    },
    /// Delete a canvas
    Delete {
        #[arg(long)]
        canvas: String,
    },
    /// Look up canvas sections
    Sections {
        #[arg(long)]
        canvas: String,
        /// Only sections containing this text
        #[arg(long)]
        contains: Option<String>,
    },
    /// Print a canvas as markdown
    Read {
        /// Canvas ID or link
        #[arg(long)]
        canvas: String,
    },
    /// Share a canvas with channels or users
    AccessSet {
        #[arg(long)]
        canvas: String,
        /// read or write
        #[arg(long)]
        level: String,
        #[command(flatten)]
        targets: AccessArgs,
    },
    /// Stop sharing a canvas with channels or users
    AccessDelete {
        #[arg(long)]
        canvas: String,
        #[command(flatten)]
        targets: AccessArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AccessArgs {
    /// Comma-separated channel IDs or #names
    #[arg(long)]
    pub channels: Option<String>,
    /// Comma-separated user IDs or @names
    #[arg(long)]
    pub users: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum DndCommand {
    /// Show do-not-disturb state
    Status {
        #[arg(long)]
        user: Option<String>,
    },
    /// Snooze notifications
    Snooze {
        #[arg(long)]
        minutes: String,
    },
    /// End do-not-disturb
    End,
    /// End a snooze early
    Unsnooze,
    /// Do-not-disturb state of several users
    Team {
        /// Comma-separated user IDs or @names
        #[arg(long)]
        users: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// List reminders
    #[command(alias = "ls")]
    List,
    /// Add a reminder
    Add {
        #[arg(long)]
        text: String,
        /// Unix timestamp or natural language ("in 5 minutes")
        #[arg(long)]
        time: String,
    },
    /// Show one reminder
    Info {
        #[arg(long)]
        reminder: String,
    },
    /// Mark a reminder as complete
    Complete {
        #[arg(long)]
        reminder: String,
    },
    /// Delete a reminder
    Delete {
        #[arg(long)]
        reminder: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Show workspace details
    Info,
    /// Custom profile fields
    Profile,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// List files
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show file details
    Info {
        #[arg(long)]
        file: String,
    },
    /// Download a file
    Download {
        #[arg(long)]
        file: String,
        /// Destination path (defaults to the file's name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a local file, optionally sharing it to a channel
    Upload {
        /// Path of the file to upload
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Comment posted with the file
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Delete a file
    Delete {
        #[arg(long)]
        file: String,
    },
}

/// A message (--channel with --ts) or a file (--file).
#[derive(Args, Debug, Clone, Default)]
pub struct StarArgs {
    #[arg(long, requires = "ts")]
    pub channel: Option<String>,
    #[arg(long, requires = "channel")]
    pub ts: Option<String>,
    #[arg(long, conflicts_with = "channel")]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum StarsCommand {
    /// Star a message or file
    Add {
        #[command(flatten)]
        target: StarArgs,
    },
    /// Remove a star
    Remove {
        #[command(flatten)]
        target: StarArgs,
    },
    /// List starred items
    #[command(alias = "ls")]
    List {
        /// Number of results (default 20)
        #[arg(long)]
        limit: Option<u32>,
        /// Pagination cursor from a previous call
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookmarksCommand {
    /// Bookmark a link in a channel
    Add {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        link: String,
        /// Bookmark type (default: link)
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
    },
    /// Change a bookmark
    Edit {
        #[arg(long)]
        channel: String,
        /// Bookmark ID
        #[arg(long)]
        bookmark: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
    },
    /// List a channel's bookmarks
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        channel: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum EmojiCommand {
    /// List custom emoji
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Remove cached channel and user lookups
    Clear {
        /// Clear every workspace, not just the selected one
        #[arg(long)]
        all: bool,
    },
}
