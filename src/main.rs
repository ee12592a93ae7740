mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use echosoul::account::ProfileUpdate;
use echosoul::config::EchoConfig;
use echosoul::emotion::Emotion;
use echosoul::memory::types::MemoryKind;
use echosoul::vault::VaultSort;

#[derive(Parser)]
#[command(
    name = "echosoul",
    version,
    about = "Personal AI companion that remembers: memories, vault, emotions, over MCP"
)]
struct Cli {
    /// Config file (defaults to ~/.echosoul/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// "stdio" or "http"; overrides [server] transport
        #[arg(long)]
        transport: Option<String>,
        /// Port for the HTTP transport
        #[arg(long)]
        port: Option<u16>,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Create (or overwrite) an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign in and greet
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Talk to EchoSoul; starts a session when no message is given
    Chat {
        #[arg(long)]
        email: String,
        message: Option<String>,
    },
    /// Search memories by natural language
    Search {
        #[arg(long)]
        email: String,
        query: String,
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<MemoryKind>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete one memory
    Forget {
        #[arg(long)]
        email: String,
        id: String,
    },
    /// Chronological memories and emotional statistics
    Timeline {
        #[arg(long)]
        email: String,
        /// YYYY-MM-DD or RFC 3339, inclusive
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Only memories of this kind
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<MemoryKind>,
        /// Only print the statistics
        #[arg(long)]
        stats: bool,
    },
    /// Memory statistics for one account or the whole database
    Stats {
        #[arg(long)]
        email: Option<String>,
    },
    /// Encrypted private memories
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },
    /// EchoSoul's personality
    Personality {
        #[command(subcommand)]
        action: PersonalityAction,
    },
    /// Show or edit the account profile
    Profile {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<String>,
        /// One of UTC, EST, PST, GMT, IST, CET
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Export an account's memories as JSON to stdout
    Export {
        #[arg(long)]
        email: String,
    },
    /// Run diagnostics
    Doctor,
    /// Delete stored data (one account, or everything)
    Reset {
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.echosoul/models/
    Download,
}

#[derive(Subcommand)]
enum VaultAction {
    /// Store a private memory
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: String,
        #[arg(long = "type", value_parser = parse_kind, default_value = "personal")]
        kind: MemoryKind,
        /// Detected from the content when omitted
        #[arg(long, value_parser = parse_emotion)]
        emotion: Option<Emotion>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List (and search) vault memories
    List {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        query: Option<String>,
        /// newest, oldest or emotion
        #[arg(long, value_parser = parse_sort, default_value = "newest")]
        sort: VaultSort,
    },
    /// Delete a vault memory
    Delete {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        id: String,
    },
}

#[derive(Subcommand)]
enum PersonalityAction {
    Show {
        #[arg(long)]
        email: String,
    },
    /// Set traits, e.g. `tone=warm humor_level=high`
    Set {
        #[arg(long)]
        email: String,
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Restore the default personality
    Reset {
        #[arg(long)]
        email: String,
    },
}

fn parse_kind(s: &str) -> Result<MemoryKind, String> {
    s.parse()
}

fn parse_emotion(s: &str) -> Result<Emotion, String> {
    s.parse()
}

fn parse_sort(s: &str) -> Result<VaultSort, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EchoConfig::load_from(path)?,
        None => EchoConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC and command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport, port } => {
            if let Some(transport) = transport {
                config.server.transport = transport;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let transport = config.server.transport.clone();
            match transport.as_str() {
                "stdio" => echosoul::server::serve_stdio(config).await?,
                "http" => echosoul::server::serve_http(config).await?,
                other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
            }
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Register {
            email,
            name,
            password,
            confirm,
        } => cli::account::register(&config, &email, &name, password, confirm)?,
        Command::Login { email, password } => cli::account::login(&config, &email, password)?,
        Command::Chat { email, message } => cli::chat::chat(config, &email, message).await?,
        Command::Search {
            email,
            query,
            kind,
            limit,
        } => cli::search::search(&config, &email, &query, kind, limit).await?,
        Command::Forget { email, id } => cli::forget::forget(&config, &email, &id)?,
        Command::Timeline {
            email,
            start,
            end,
            kind,
            stats,
        } => cli::timeline::timeline(
            &config,
            &email,
            start.as_deref(),
            end.as_deref(),
            kind,
            stats,
        )?,
        Command::Stats { email } => cli::stats::stats(&config, email.as_deref())?,
        Command::Vault { action } => match action {
            VaultAction::Add {
                email,
                password,
                title,
                content,
                kind,
                emotion,
                tags,
            } => cli::vault::add(
                &config,
                &email,
                password,
                cli::vault::AddArgs {
                    title,
                    content,
                    kind,
                    emotion,
                    tags,
                },
            )?,
            VaultAction::List {
                email,
                password,
                query,
                sort,
            } => cli::vault::list(&config, &email, password, query.as_deref(), sort)?,
            VaultAction::Delete {
                email,
                password,
                id,
            } => cli::vault::delete(&config, &email, password, &id)?,
        },
        Command::Personality { action } => match action {
            PersonalityAction::Show { email } => cli::personality::show(&config, &email)?,
            PersonalityAction::Set { email, assignments } => {
                cli::personality::set(&config, &email, &assignments)?
            }
            PersonalityAction::Reset { email } => cli::personality::reset(&config, &email)?,
        },
        Command::Profile {
            email,
            name,
            birth_date,
            timezone,
            bio,
        } => cli::account::profile(
            &config,
            &email,
            ProfileUpdate {
                name,
                birth_date,
                timezone,
                bio,
            },
        )?,
        Command::Export { email } => cli::export::export(&config, &email)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset { email } => cli::reset::reset(&config, email.as_deref())?,
    }

    Ok(())
}
