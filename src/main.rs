use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use dispatch_bot::application::Bot;
use dispatch_bot::domain::traits::Platform;
use dispatch_bot::infrastructure::adapters::{ConsoleAdapter, DiscordAdapter, MemoryPlatform};
use dispatch_bot::infrastructure::config::{AdapterKind, Config, Credentials};
use dispatch_bot::infrastructure::logging;

#[derive(Parser)]
#[command(name = "dispatch-bot")]
#[command(about = "Slash-command bot with hot-reloadable handler modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// Bot token (overrides TOKEN and the secret file)
    #[arg(short, long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run {
        /// Read interactions from stdin instead of connecting to Discord
        #[arg(long)]
        console: bool,
    },
    /// Register slash commands without connecting
    Deploy,
    /// Load and validate every module, then list them
    Check,
    /// Show version
    Version,
    /// Write the default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (config, config_warning) = load_config(&cli.config);
    logging::init(&config.logging.level);
    if let Some(warning) = config_warning {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Run { console } => run_bot(config, cli.token, console).await,
        Commands::Deploy => deploy(config, cli.token).await,
        Commands::Check => check(config).await,
        Commands::Version => {
            println!("dispatch-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => init_config(&cli.config),
    }
}

fn load_config(path: &str) -> (Config, Option<String>) {
    if !Path::new(path).exists() {
        return (Config::load_env(), None);
    }
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (
            Config::load_env(),
            Some(format!("Failed to load config: {}, using defaults", e)),
        ),
    }
}

/// Credentials with a token, or exit with status 1
fn require_credentials(config: &Config, token_override: Option<String>) -> (Credentials, String) {
    let credentials = Credentials::resolve(&config.secrets).with_token(token_override);
    match credentials.require_token() {
        Ok(token) => {
            let token = token.to_string();
            (credentials, token)
        }
        Err(_) => {
            tracing::error!("TOKEN not found in the environment or {}", config.secrets.token_file.display());
            std::process::exit(1);
        }
    }
}

fn build_bot(config: Config, credentials: Credentials, platform: Arc<dyn Platform>) -> Bot {
    match Bot::new(config, credentials, platform) {
        Ok(bot) => bot,
        Err(e) => {
            tracing::error!("Failed to initialise bot: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_bot(config: Config, token_override: Option<String>, console: bool) {
    let console = console || config.bot.adapter == AdapterKind::Console;

    let (credentials, platform): (Credentials, Arc<dyn Platform>) = if console {
        let mut credentials = Credentials::resolve(&config.secrets).with_token(token_override);
        credentials.token.get_or_insert_with(|| "console".to_string());
        let platform: Arc<dyn Platform> = ConsoleAdapter::new();
        (credentials, platform)
    } else {
        let (credentials, token) = require_credentials(&config, token_override);
        let platform: Arc<dyn Platform> = Arc::new(DiscordAdapter::new(token));
        (credentials, platform)
    };

    let bot = build_bot(config, credentials, platform);
    if let Err(e) = bot.start().await {
        tracing::error!("Failed to start bot: {}", e);
        std::process::exit(1);
    }

    wait_for_shutdown(&bot).await;

    if let Err(e) = bot.shutdown().await {
        tracing::warn!("Error during shutdown: {}", e);
    }
}

/// Block until SIGINT, SIGTERM or the event stream closing; SIGHUP reloads
#[cfg(unix)]
async fn wait_for_shutdown(bot: &Bot) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut hangup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(terminate), Ok(hangup)) => (terminate, hangup),
        _ => {
            tracing::warn!("Failed to install signal handlers, only Ctrl-C will stop the bot");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = bot.client().closed() => {}
            }
            return;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
                break;
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM");
                break;
            }
            _ = hangup.recv() => {
                tracing::info!("Received SIGHUP, reloading modules");
                match bot.reload().await {
                    Ok((commands, events)) => {
                        tracing::info!(outcome = "success", "Reloaded {} commands and {} events", commands, events)
                    }
                    Err(e) => tracing::warn!("Reload failed: {}", e),
                }
            }
            _ = bot.client().closed() => {
                tracing::info!("Connection closed");
                break;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(bot: &Bot) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C"),
        _ = bot.client().closed() => tracing::info!("Connection closed"),
    }
}

async fn deploy(config: Config, token_override: Option<String>) {
    let (credentials, token) = require_credentials(&config, token_override);
    let has_client_id = credentials.client_id.is_some();

    let bot = build_bot(config, credentials, Arc::new(DiscordAdapter::new(token)));
    if let Err(e) = bot.commands().load_commands().await {
        tracing::error!("Failed to load commands: {}", e);
        std::process::exit(1);
    }

    if bot.deploy_commands().await.is_none() && has_client_id {
        std::process::exit(1);
    }
}

async fn check(config: Config) {
    let bot = build_bot(config, Credentials::default(), MemoryPlatform::new());
    if let Err(e) = bot.load().await {
        tracing::error!("Failed to load modules: {}", e);
        std::process::exit(1);
    }

    println!("Commands ({}):", bot.commands().len());
    for command in bot.commands().list() {
        println!("  /{:<12} {}  [{}]", command.name(), command.definition.description, command.source.display());
    }

    println!("Events ({}):", bot.events().len());
    for event in bot.events().list() {
        let mode = if event.once { "once" } else { "on" };
        println!("  {:<18} {:<4}  [{}]", event.name, mode, event.source.display());
    }
}

fn init_config(path: &str) {
    if Path::new(path).exists() {
        eprintln!("{} already exists, not overwriting", path);
        std::process::exit(1);
    }

    let yaml = match Config::default().to_yaml() {
        Ok(yaml) => yaml,
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            std::process::exit(1);
        }
    };

    match std::fs::write(path, &yaml) {
        Ok(()) => println!("Wrote default config to {}", path),
        Err(e) => {
            eprintln!("Failed to write {}: {}", path, e);
            println!("{}", yaml);
        }
    }
}
