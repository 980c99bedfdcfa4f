use anyhow::{Context, Result};
use blogstore_core::config::{Config, StoreBackendKind};
use blogstore_core::core_msg::{
    Msg, MsgAddEditor, MsgCreatePost, MsgDeleteEditor, MsgDeletePost, MsgResponse, MsgServer,
    MsgUpdateParams, MsgUpdatePost,
};
use blogstore_core::core_post::{
    EventBroadcaster, Params, PostBackend, PostEvent, PostId, PostService, UserId,
};
use blogstore_core::logging::{init_logging_with_config, LogConfig};
use blogstore_core::metrics::init_metrics;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "blogstore")]
#[command(author, version, about = "Post store with editor-based authorization", long_about = None)]
struct Args {
    /// SQLite database file (overrides the configured store)
    #[arg(long, global = true)]
    db: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a post
    Create {
        #[arg(long)]
        creator: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Replace a post's title and body
    Update {
        id: u64,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Delete a post
    Delete {
        id: u64,
        #[arg(long)]
        actor: String,
    },

    /// Grant edit rights on a post
    AddEditor {
        id: u64,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        editor: String,
    },

    /// Revoke edit rights on a post
    RemoveEditor {
        id: u64,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        editor: String,
    },

    /// Print a post
    Show { id: u64 },

    /// Print the number of posts ever created
    Count,

    /// Print the current params
    Params,

    /// Replace the params (authority only)
    UpdateParams {
        #[arg(long)]
        authority: String,
        #[arg(long)]
        max_title_length: usize,
        #[arg(long)]
        max_body_length: usize,
    },
}

/// Result of a mutation together with the events it emitted
#[derive(Serialize)]
struct MutationOutput {
    #[serde(flatten)]
    response: MsgResponse,
    events: Vec<PostEvent>,
}

type Server = MsgServer<Box<dyn PostBackend>, EventBroadcaster>;

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;

    if let Some(db) = &args.db {
        config.store.backend = StoreBackendKind::Sqlite;
        config.store.path = PathBuf::from(shellexpand::tilde(db).into_owned());
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    Ok(config)
}

fn open_server(config: &Config) -> Result<(Server, broadcast::Receiver<PostEvent>)> {
    let backend = config
        .store
        .open_backend()
        .with_context(|| format!("opening store at {}", config.store.path.display()))?;

    let events = EventBroadcaster::new(config.events.channel_capacity);
    let rx = events.subscribe();

    let service = PostService::new(backend, events, UserId::new(config.module.authority.clone()))
        .with_genesis_params(config.module.params);

    Ok((MsgServer::new(service), rx))
}

fn drain(rx: &mut broadcast::Receiver<PostEvent>) -> Vec<PostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn into_msg(command: Command) -> Option<Msg> {
    let msg = match command {
        Command::Create {
            creator,
            title,
            body,
        } => Msg::CreatePost(MsgCreatePost::new(creator, title, body)),
        Command::Update {
            id,
            actor,
            title,
            body,
        } => Msg::UpdatePost(MsgUpdatePost::new(actor, PostId(id), title, body)),
        Command::Delete { id, actor } => Msg::DeletePost(MsgDeletePost::new(actor, PostId(id))),
        Command::AddEditor { id, actor, editor } => {
            Msg::AddEditor(MsgAddEditor::new(actor, PostId(id), editor))
        }
        Command::RemoveEditor { id, actor, editor } => {
            Msg::DeleteEditor(MsgDeleteEditor::new(actor, PostId(id), editor))
        }
        Command::UpdateParams {
            authority,
            max_title_length,
            max_body_length,
        } => Msg::UpdateParams(MsgUpdateParams::new(
            authority,
            Params {
                max_title_length,
                max_body_length,
            },
        )),
        Command::Show { .. } | Command::Count | Command::Params => return None,
    };
    Some(msg)
}

fn run(command: Command, server: &mut Server, rx: &mut broadcast::Receiver<PostEvent>) -> Result<()> {
    match command {
        Command::Show { id } => {
            let post = server.service().get_post(PostId(id))?;
            print_json(&post)
        }
        Command::Count => {
            let count = server.service().post_count()?;
            print_json(&serde_json::json!({ "count": count }))
        }
        Command::Params => {
            let params = server.service().params()?;
            print_json(&params)
        }
        mutation => {
            let Some(msg) = into_msg(mutation) else {
                return Ok(());
            };
            debug!(?msg, "Dispatching");

            let response = server.handle(msg)?;
            print_json(&MutationOutput {
                response,
                events: drain(rx),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;
    init_metrics();

    info!(backend = ?config.store.backend, "blogstore started");

    let (mut server, mut rx) = open_server(&config)?;
    run(args.command, &mut server, &mut rx)
}
