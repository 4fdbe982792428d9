mod commands;
mod output;
mod session;

use clap::{Parser, Subcommand};
use hush_sdk::cache::{JsonStore, MemoryStore, UpstashStore};
use hush_sdk::config::{load_config, ForumConfig};
use hush_sdk::models::Kind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hush", about = "Anonymous token-gated forum client")]
struct Cli {
    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,
    /// Wallet address the identity is derived from (overrides config)
    #[arg(long, global = true)]
    wallet: Option<String>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(clap::Args)]
struct Who {
    /// Group id
    #[arg(long, short)]
    group: u64,
    /// Username mixed into the identity
    #[arg(long)]
    user: Option<String>,
}

#[derive(clap::Args)]
struct Target {
    /// Group id
    #[arg(long, short)]
    group: u64,
    /// Item kind: post, comment or poll
    #[arg(long, default_value = "post", value_parser = parse_kind)]
    kind: Kind,
    /// Item id
    #[arg(long)]
    id: u64,
    /// Parent post id (comments only)
    #[arg(long, default_value_t = 0)]
    parent: u64,
    /// Username mixed into the identity
    #[arg(long)]
    user: Option<String>,
}

fn parse_kind(s: &str) -> Result<Kind, String> {
    match s {
        "post" => Ok(Kind::Post),
        "comment" => Ok(Kind::Comment),
        "poll" => Ok(Kind::Poll),
        other => Err(format!("unknown kind {other:?} (post, comment, poll)")),
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Show the identity commitment and Note for a group
    Note {
        #[command(flatten)]
        who: Who,
    },
    /// Generate circuit artifacts into the artifacts directory
    Setup,
    /// Create a post
    Post {
        #[command(flatten)]
        who: Who,
        #[arg(long)]
        title: String,
        body: String,
    },
    /// Comment on a post
    Comment {
        #[command(flatten)]
        who: Who,
        /// Post being answered
        #[arg(long)]
        post: u64,
        body: String,
    },
    /// Create a poll
    Poll {
        #[command(flatten)]
        who: Who,
        #[arg(long)]
        title: String,
        /// Poll option (repeat for each)
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        body: String,
    },
    /// Replace an item's content
    Edit {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        title: Option<String>,
        body: String,
        /// Act as moderator (no ownership proof)
        #[arg(long)]
        moderator: bool,
    },
    /// Delete an item
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        moderator: bool,
    },
    /// Vote on an item
    Vote {
        #[command(flatten)]
        target: Target,
        /// Downvote instead of upvote
        #[arg(long)]
        down: bool,
    },
    /// Join a group
    Join {
        #[command(flatten)]
        who: Who,
    },
    /// Create a group with yourself as first member
    CreateGroup {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Id the group is expected to get (default: next after the cached groups)
        #[arg(long, short)]
        group: Option<u64>,
        /// Username mixed into the identity
        #[arg(long)]
        user: Option<String>,
    },
    /// Convert between a CIDv0 and its bytes32 form
    Cid { value: String },
    /// Inspect the JSON cache
    Cache {
        #[command(subcommand)]
        action: CacheCmd,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

#[derive(Subcommand)]
enum CacheCmd {
    /// Print a cached document and its staleness
    Get { key: String },
    /// Print several documents in one round trip
    Mget { keys: Vec<String> },
    /// Drop a cached document
    Del { key: String },
}

#[derive(Subcommand)]
enum ConfigCmd {
    Show,
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    output::set_json_mode(cli.json);

    let mut config = load_config()?;
    if let Some(wallet) = cli.wallet {
        config.wallet = Some(wallet);
    }

    // commands that never touch the cache
    match cli.command {
        Cmd::Setup => return commands::setup::run(&config).await,
        Cmd::Cid { value } => return commands::cid::run(&value),
        Cmd::Config { action } => {
            return match action {
                ConfigCmd::Show => commands::config::show(&config),
                ConfigCmd::Set { key, value } => commands::config::set(&key, &value),
            }
        }
        Cmd::Note { who } => return commands::note::run(&config, who.group, who.user.as_deref()),
        command => match UpstashStore::from_config(&config) {
            Some(store) => dispatch(command, config, store).await,
            None => {
                output::warn("no remote cache configured, using a throwaway in-memory cache");
                dispatch(command, config, MemoryStore::new()).await
            }
        },
    }
}

async fn dispatch<S>(command: Cmd, config: ForumConfig, store: S) -> anyhow::Result<()>
where
    S: JsonStore + Clone + Send + Sync,
{
    use commands::{cache, group, item};
    let session = session::Session::new(config, store);
    match command {
        Cmd::Post { who, title, body } => {
            item::create(&session, who.group, who.user, Kind::Post, 0, item::body(Some(title), &body, vec![])).await
        }
        Cmd::Comment { who, post, body } => {
            item::create(&session, who.group, who.user, Kind::Comment, post, item::body(None, &body, vec![])).await
        }
        Cmd::Poll {
            who,
            title,
            options,
            body,
        } => item::create(&session, who.group, who.user, Kind::Poll, 0, item::body(Some(title), &body, options)).await,
        Cmd::Edit {
            target,
            title,
            body,
            moderator,
        } => item::edit(&session, &target.into(), item::body(title, &body, vec![]), moderator).await,
        Cmd::Delete { target, moderator } => item::delete(&session, &target.into(), moderator).await,
        Cmd::Vote { target, down } => item::vote(&session, &target.into(), down).await,
        Cmd::Join { who } => group::join(&session, who.group, who.user).await,
        Cmd::CreateGroup {
            name,
            description,
            tags,
            group: expected,
            user,
        } => group::create(&session, &name, description, tags, expected, user).await,
        Cmd::Cache { action } => match action {
            CacheCmd::Get { key } => cache::get(&session, &key).await,
            CacheCmd::Mget { keys } => cache::mget(&session, &keys).await,
            CacheCmd::Del { key } => cache::del(&session, &key).await,
        },
        Cmd::Setup | Cmd::Cid { .. } | Cmd::Config { .. } | Cmd::Note { .. } => Ok(()),
    }
}

impl From<Target> for commands::item::ItemRef {
    fn from(t: Target) -> Self {
        Self {
            group_id: t.group,
            kind: t.kind,
            id: t.id,
            parent_id: t.parent,
            user: t.user,
        }
    }
}
