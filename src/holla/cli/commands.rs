//! # CLI Dispatch
//!
//! The CLI is **one possible client** of the holla library. It is the only
//! place that reads stdin, writes to stdout/stderr or picks an exit code.
//!
//! ## Flow
//!
//! 1. Parse arguments with clap and start logging
//! 2. Locate the config tree and load `config.json`
//! 3. Run workspace-less commands (login, logout, status, cache clear) directly
//! 4. Otherwise pick a token, build a `SlackClient` and a `HollaApi` for it
//! 5. Dispatch, then render the `CmdResult` in the chosen output format

use super::render::print_result;
use super::setup::{
    AccessArgs, AuthCommand, BookmarksCommand, CacheCommand, CanvasesCommand, ChannelsCommand,
    ChatCommand, Cli, DndCommand, EmojiCommand, FilesCommand, GroupsCommand, PinsCommand,
    Platform, ReactionsCommand, RemindersCommand, SearchArgs, SearchCommand, SlackCommand,
    StarArgs, StarsCommand, TeamCommand, UsersCommand,
};
use clap::Parser;
use holla::api::{self, HollaApi};
use holla::commands::bookmarks::{BookmarkChange, NewBookmark};
use holla::commands::canvases::{AccessTargets, CanvasEdit};
use holla::commands::files::UploadOptions;
use holla::commands::groups::GroupFields;
use holla::commands::passthrough;
use holla::commands::search::SearchOptions;
use holla::commands::stars::StarTarget;
use holla::commands::users::ProfileChange;
use holla::commands::{CmdResult, PageRequest};
use holla::config::HollaConfig;
use holla::error::{HollaError, Result};
use holla::logging::init_tracing;
use holla::output::OutputFormat;
use holla::slack::attribution::{detect_agent, AttributionConfig, AttributionFlags};
use holla::slack::SlackClient;
use holla::store::cache::EntityCache;
use holla::store::credentials::CredentialStore;
use holla::store::StorageConfig;
use std::io::{IsTerminal, Read};
use tracing::{debug, warn};

struct AppContext {
    storage: StorageConfig,
    config: HollaConfig,
    credentials: CredentialStore,
    cache: EntityCache,
    workspace: Option<String>,
    format: OutputFormat,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let storage = StorageConfig::discover()?;
    let config = HollaConfig::load(&storage.config_dir).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config.json");
        HollaConfig::default()
    });
    let ctx = AppContext {
        credentials: CredentialStore::new(&storage.credentials_dir),
        cache: EntityCache::new(&storage.cache_dir),
        format: OutputFormat::resolve(cli.json, cli.plain, &config),
        workspace: cli.workspace,
        storage,
        config,
    };
    debug!(config_dir = %ctx.storage.config_dir.display(), "storage located");

    let Platform::Slack { command } = cli.command;
    let result = run_slack(&ctx, command).await?;
    print_result(&result, ctx.format);
    Ok(())
}

async fn run_slack(ctx: &AppContext, command: SlackCommand) -> Result<CmdResult> {
    let workspace = ctx.workspace.as_deref();
    let prefer_user = command.prefers_user_token();

    match command {
        SlackCommand::Auth { command } => match command {
            AuthCommand::Login { token } => {
                let client = SlackClient::new(&token)?;
                api::login(&ctx.credentials, &client, &token).await
            }
            AuthCommand::Logout => api::logout(&ctx.credentials, workspace).await,
            AuthCommand::Status => {
                api::status(&ctx.credentials, |token: &str| SlackClient::new(token)).await
            }
            AuthCommand::Whoami => connect(ctx, workspace, false).await?.whoami().await,
        },
        SlackCommand::Cache {
            command: CacheCommand::Clear { all },
        } => api::clear_cache(&ctx.cache, if all { None } else { workspace }).await,
        SlackCommand::Api { body, mut args } => {
            if let Some(body) = body {
                args.push("--body".to_string());
                args.push(body);
            }
            let raw = passthrough::parse_args(&args)?;
            let workspace = raw.workspace.as_deref().or(workspace);
            connect(ctx, workspace, false).await?.raw_call(&raw).await
        }
        SlackCommand::Channels { command } => {
            channels(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Chat { command } => {
            chat(ctx, &connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Reactions { command } => {
            reactions(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Users { command } => {
            users(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Pins { command } => {
            pins(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Search { command } => {
            search(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Groups { command } => {
            groups(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Canvases { command } => {
            canvases(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Dnd { command } => {
            let api = connect(ctx, workspace, prefer_user).await?;
            match command {
                DndCommand::Status { user } => api.dnd_status(user.as_deref()).await,
                DndCommand::Snooze { minutes } => api.dnd_snooze(&minutes).await,
                DndCommand::End => api.dnd_end().await,
                DndCommand::Unsnooze => api.dnd_unsnooze().await,
                DndCommand::Team { users } => api.dnd_team(&users).await,
            }
        }
        SlackCommand::Reminders { command } => {
            let api = connect(ctx, workspace, prefer_user).await?;
            match command {
                RemindersCommand::List => api.list_reminders().await,
                RemindersCommand::Add { text, time } => api.add_reminder(&text, &time).await,
                RemindersCommand::Info { reminder } => api.reminder_info(&reminder).await,
                RemindersCommand::Complete { reminder } => api.complete_reminder(&reminder).await,
                RemindersCommand::Delete { reminder } => api.delete_reminder(&reminder).await,
            }
        }
        SlackCommand::Team { command } => {
            let api = connect(ctx, workspace, prefer_user).await?;
            match command {
                TeamCommand::Info => api.team_info().await,
                TeamCommand::Profile => api.team_profile().await,
            }
        }
        SlackCommand::Files { command } => {
            files(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Stars { command } => {
            stars(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Bookmarks { command } => {
            bookmarks(&connect(ctx, workspace, prefer_user).await?, command).await
        }
        SlackCommand::Emoji {
            command: EmojiCommand::List,
        } => connect(ctx, workspace, prefer_user).await?.list_emoji().await,
    }
}

async fn connect(
    ctx: &AppContext,
    workspace: Option<&str>,
    prefer_user: bool,
) -> Result<HollaApi<SlackClient>> {
    let resolved = ctx.credentials.get_token(workspace, prefer_user).await?;
    debug!(
        workspace = %resolved.workspace,
        namespace = %resolved.cache_namespace,
        prefer_user,
        "token selected"
    );
    let client = SlackClient::new(resolved.token)?;
    Ok(HollaApi::new(client, ctx.cache.clone(), resolved.cache_namespace))
}

/// `--message`, or stdin when it is piped in.
fn message_or_stdin(message: Option<String>) -> Result<String> {
    if let Some(message) = message {
        return Ok(message);
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(HollaError::invalid(
            "No message provided. Use --message or pipe via stdin.",
        ));
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text)?;
    Ok(text.trim_end().to_string())
}

fn attribution(ctx: &AppContext, flags: AttributionFlags) -> AttributionConfig {
    AttributionConfig::resolve(&ctx.config, &flags, || detect_agent(flags.agent.as_deref()))
}

fn search_options(args: SearchArgs) -> (String, SearchOptions) {
    (
        args.query,
        SearchOptions {
            limit: args.limit,
            page: args.page,
            sort: args.sort,
            sort_dir: args.sort_dir,
        },
    )
}

fn star_target(args: StarArgs) -> StarTarget {
    StarTarget {
        channel: args.channel,
        ts: args.ts,
        file: args.file,
    }
}

fn access_targets(args: AccessArgs) -> AccessTargets {
    AccessTargets {
        channels: args.channels,
        users: args.users,
    }
}

type Api = HollaApi<SlackClient>;

async fn channels(api: &Api, command: ChannelsCommand) -> Result<CmdResult> {
    match command {
        ChannelsCommand::List { types, page } => {
            api.list_channels(types.as_deref(), &page.into()).await
        }
        ChannelsCommand::Info { channel } => api.channel_info(&channel).await,
        ChannelsCommand::History {
            channel,
            before,
            page,
        } => {
            api.channel_history(&channel, before.as_deref(), &page.into()).await
        }
        ChannelsCommand::Replies { channel, ts, page } => {
            api.thread_replies(&channel, &ts, &page.into()).await
        }
        ChannelsCommand::Members { channel, page } => {
            api.channel_members(&channel, &page.into()).await
        }
        ChannelsCommand::Join { channel } => api.join_channel(&channel).await,
        ChannelsCommand::Leave { channel } => api.leave_channel(&channel).await,
        ChannelsCommand::Invite { channel, user } => api.invite_to_channel(&channel, &user).await,
        ChannelsCommand::Kick { channel, user } => api.kick_from_channel(&channel, &user).await,
        ChannelsCommand::Create { name, private } => api.create_channel(&name, private).await,
        ChannelsCommand::Archive { channel } => api.archive_channel(&channel).await,
        ChannelsCommand::Unarchive { channel } => api.unarchive_channel(&channel).await,
        ChannelsCommand::Topic { channel, topic } => api.set_channel_topic(&channel, &topic).await,
        ChannelsCommand::Purpose { channel, purpose } => {
            api.set_channel_purpose(&channel, &purpose).await
        }
        ChannelsCommand::MarkRead { channel, ts } => api.mark_channel_read(&channel, &ts).await,
    }
}

async fn chat(ctx: &AppContext, api: &Api, command: ChatCommand) -> Result<CmdResult> {
    match command {
        ChatCommand::Send {
            channel,
            message,
            attribution: flags,
        } => {
            let text = message_or_stdin(message)?;
            let attribution = attribution(ctx, AttributionFlags::from(&flags));
            api.send_message(&channel, &text, &attribution).await
        }
        ChatCommand::Reply {
            channel,
            thread,
            message,
            attribution: flags,
        } => {
            let text = message_or_stdin(message)?;
            let attribution = attribution(ctx, AttributionFlags::from(&flags));
            api.reply_to_thread(&channel, &thread, &text, &attribution).await
        }
        ChatCommand::Get { target } => api.get_message(&target.channel, &target.ts).await,
        ChatCommand::Edit { target, message } => {
            api.edit_message(&target.channel, &target.ts, &message).await
        }
        ChatCommand::Delete { target } => api.delete_message(&target.channel, &target.ts).await,
        ChatCommand::Permalink { target } => api.permalink(&target.channel, &target.ts).await,
        ChatCommand::Schedule {
            channel,
            message,
            at,
        } => api.schedule_message(&channel, &message, &at).await,
        ChatCommand::Whisper {
            channel,
            user,
            message,
        } => api.whisper(&channel, &user, &message).await,
        ChatCommand::Unfurl { target, unfurls } => {
            api.unfurl(&target.channel, &target.ts, &unfurls).await
        }
    }
}

async fn reactions(api: &Api, command: ReactionsCommand) -> Result<CmdResult> {
    match command {
        ReactionsCommand::Add { target, name } => {
            api.add_reaction(&target.channel, &target.ts, &name).await
        }
        ReactionsCommand::Remove { target, name } => {
            api.remove_reaction(&target.channel, &target.ts, &name).await
        }
        ReactionsCommand::Get { target } => api.get_reactions(&target.channel, &target.ts).await,
        ReactionsCommand::List {
            user,
            limit,
            cursor,
        } => {
            let page = PageRequest {
                limit,
                cursor,
                all: false,
            };
            api.list_reactions(user.as_deref(), &page).await
        }
    }
}

async fn users(api: &Api, command: UsersCommand) -> Result<CmdResult> {
    match command {
        UsersCommand::List { page } => api.list_users(&page.into()).await,
        UsersCommand::Info { user } => api.user_info(&user).await,
        UsersCommand::Find { email } => api.find_user(&email).await,
        UsersCommand::Presence { user } => api.user_presence(&user).await,
        UsersCommand::Profile { user } => api.user_profile(user.as_deref()).await,
        UsersCommand::SetPresence { presence } => api.set_presence(&presence).await,
        UsersCommand::SetProfile {
            display_name,
            status_text,
            status_emoji,
        } => {
            let change = ProfileChange {
                display_name,
                status_text,
                status_emoji,
            };
            api.set_profile(&change).await
        }
    }
}

async fn pins(api: &Api, command: PinsCommand) -> Result<CmdResult> {
    match command {
        PinsCommand::Add { target } => api.pin(&target.channel, &target.ts).await,
        PinsCommand::Remove { target } => api.unpin(&target.channel, &target.ts).await,
        PinsCommand::List { channel } => api.list_pins(&channel).await,
    }
}

async fn search(api: &Api, command: SearchCommand) -> Result<CmdResult> {
    match command {
        SearchCommand::Messages { search } => {
            let (query, options) = search_options(search);
            api.search_messages(&query, &options).await
        }
        SearchCommand::Files { search } => {
            let (query, options) = search_options(search);
            api.search_files(&query, &options).await
        }
        SearchCommand::All { search } => {
            let (query, options) = search_options(search);
            api.search_all(&query, &options).await
        }
    }
}

async fn groups(api: &Api, command: GroupsCommand) -> Result<CmdResult> {
    match command {
        GroupsCommand::List { include_disabled } => api.list_groups(include_disabled).await,
        GroupsCommand::Members { group } => api.group_members(&group).await,
        GroupsCommand::AddMember { group, user } => api.add_group_member(&group, &user).await,
        GroupsCommand::RemoveMember { group, user } => {
            api.remove_group_member(&group, &user).await
        }
        GroupsCommand::SetMembers { group, users } => api.set_group_members(&group, &users).await,
        GroupsCommand::Create {
            name,
            handle,
            description,
        } => {
            let fields = GroupFields {
                name: None,
                handle,
                description,
            };
            api.create_group(&name, &fields).await
        }
        GroupsCommand::Update {
            group,
            name,
            handle,
            description,
        } => {
            let fields = GroupFields {
                name,
                handle,
                description,
            };
            api.update_group(&group, &fields).await
        }
        GroupsCommand::Enable { group } => api.enable_group(&group).await,
        GroupsCommand::Disable { group } => api.disable_group(&group).await,
    }
}

async fn canvases(api: &Api, command: CanvasesCommand) -> Result<CmdResult> {
    match command {
        CanvasesCommand::Create { title, markdown } => {
            api.create_canvas(title.as_deref(), markdown.as_deref()).await
        }
        CanvasesCommand::Edit {
            canvas,
            operation,
            markdown,
            section_id,
        } => {
            let change = CanvasEdit {
                operation,
                markdown,
                section_id,
            };
            api.edit_canvas(&canvas, &change).await
        }
        CanvasesCommand::Delete { canvas } => api.delete_canvas(&canvas).await,
        CanvasesCommand::Sections { canvas, contains } => {
            api.canvas_sections(&canvas, contains.as_deref()).await
        }
        CanvasesCommand::Read { canvas } => api.read_canvas(&canvas).await,
        CanvasesCommand::AccessSet {
            canvas,
            level,
            targets,
        } => {
            api.set_canvas_access(&canvas, &level, &access_targets(targets)).await
        }
        CanvasesCommand::AccessDelete { canvas, targets } => {
            api.delete_canvas_access(&canvas, &access_targets(targets)).await
        }
    }
}

async fn files(api: &Api, command: FilesCommand) -> Result<CmdResult> {
    match command {
        FilesCommand::List {
            channel,
            user,
            page,
        } => {
            api.list_files(channel.as_deref(), user.as_deref(), &page.into()).await
        }
        FilesCommand::Info { file } => api.file_info(&file).await,
        FilesCommand::Download { file, output } => {
            api.download_file(&file, output.as_deref()).await
        }
        FilesCommand::Upload {
            file,
            channel,
            title,
            message,
        } => {
            let options = UploadOptions {
                channel,
                title,
                comment: message,
            };
            api.upload_file(&file, &options).await
        }
        FilesCommand::Delete { file } => api.delete_file(&file).await,
    }
}

async fn stars(api: &Api, command: StarsCommand) -> Result<CmdResult> {
    match command {
        StarsCommand::Add { target } => api.star(&star_target(target)).await,
        StarsCommand::Remove { target } => api.unstar(&star_target(target)).await,
        StarsCommand::List { limit, cursor } => {
            let page = PageRequest {
                limit,
                cursor,
                all: false,
            };
            api.list_stars(&page).await
        }
    }
}

async fn bookmarks(api: &Api, command: BookmarksCommand) -> Result<CmdResult> {
    match command {
        BookmarksCommand::Add {
            channel,
            title,
            link,
            kind,
            emoji,
        } => {
            let bookmark = NewBookmark {
                title,
                link,
                kind,
                emoji,
            };
            api.add_bookmark(&channel, &bookmark).await
        }
        BookmarksCommand::Edit {
            channel,
            bookmark,
            title,
            link,
            emoji,
        } => {
            let change = BookmarkChange { title, link, emoji };
            api.edit_bookmark(&channel, &bookmark, &change).await
        }
        BookmarksCommand::List { channel } => api.list_bookmarks(&channel).await,
    }
}
