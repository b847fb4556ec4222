//! Foxhelp - console host for the help module

mod console;

use clap::{Parser, Subcommand};
use console::Console;
use foxhelp_core::{
    AuthorityPermissions, Catalog, Config, Host, Manifest, MemoryStore, ModuleManager, ModuleResult, Registry,
    Session, UserRecord,
};
use foxhelp_modules::HelpModule;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const PLATFORM: &str = "console";
const USER_ID: &str = "local";

/// Foxhelp - localized, paginated help for chat-bot commands
#[derive(Parser)]
#[command(name = "foxhelp")]
#[command(about = "Render bot help from a command manifest")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "foxhelp.toml")]
    config: PathBuf,

    /// Command manifest describing the bot's commands
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Authority of the console user
    #[arg(short, long, default_value_t = 1)]
    authority: u32,

    /// Preferred locale of the console user
    #[arg(long)]
    locale: Option<String>,

    /// Pretend to speak in this guild channel instead of a direct conversation
    #[arg(long)]
    channel: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a single message and print the reply
    Render {
        /// The message, e.g. "/foxhelp echo"
        line: String,
    },
    /// Generate a default configuration file
    Config {
        /// Output file path
        #[arg(short, long, default_value = "foxhelp.toml")]
        output: PathBuf,
    },
    /// Check the configuration and manifest, then exit
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    if let Some(Commands::Config { output }) = &cli.command {
        generate_config(output)?;
        return Ok(());
    }

    let config = if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
        Config::from_file(&cli.config)?
    } else {
        info!("Configuration file not found, using defaults");
        Config::default()
    };
    config.validate()?;

    let console = Console::new();
    let (mut manager, host) = build_host(&config, cli.manifest.as_deref(), &console, cli.authority).await?;

    match &cli.command {
        Some(Commands::Validate) => {
            println!(
                "Configuration is valid: {} commands, modules {:?}",
                host.registry.len(),
                manager.get_loaded_modules()
            );
        }
        Some(Commands::Render { line }) => {
            let mut session = session(&cli);
            dispatch(&manager, &host, line, &mut session).await;
        }
        _ => {
            info!("Reading messages from stdin");
            while let Some(line) = console.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                let mut session = session(&cli);
                dispatch(&manager, &host, &line, &mut session).await;
            }
        }
    }

    manager.shutdown().await?;
    Ok(())
}

/// Load the catalog, commands and help module
async fn build_host(
    config: &Config,
    manifest: Option<&Path>,
    console: &Console,
    authority: u32,
) -> anyhow::Result<(ModuleManager, Host)> {
    let mut catalog = Catalog::new(&config.locale.default).with_min_similarity(config.help.shortcut_threshold);
    if let Some(dir) = &config.locale.directory {
        catalog.load_directory(dir)?;
    }

    let mut registry = Registry::new();
    let mut manager = ModuleManager::new();
    manager
        .load_module(Box::new(HelpModule::new(config.help.clone())), &mut registry)
        .await?;

    match manifest {
        Some(path) => {
            let count = Manifest::from_file(path)?.apply(&mut registry, &mut catalog)?;
            info!("Loaded {} commands from {:?}", count, path);
        }
        None => warn!("No manifest given, only the help command is available"),
    }

    let store = MemoryStore::new();
    store.insert_user(
        PLATFORM,
        USER_ID,
        UserRecord {
            authority,
            ..Default::default()
        },
    );

    let registry = Arc::new(registry);
    let host = Host {
        registry: registry.clone(),
        permissions: Arc::new(AuthorityPermissions::new(registry)),
        localizer: Arc::new(catalog),
        observer: Some(Arc::new(store)),
        suggester: Arc::new(console.clone()),
        prefixes: config.bot.prefix.clone(),
    };
    Ok((manager, host))
}

fn session(cli: &Cli) -> Session {
    let mut session = match &cli.channel {
        Some(channel) => Session::in_channel(PLATFORM, USER_ID, channel),
        None => Session::direct(PLATFORM, USER_ID),
    };
    if let Some(locale) = &cli.locale {
        session = session.with_locale(locale);
    }
    session
}

/// Parse and dispatch one message, printing the reply
async fn dispatch(manager: &ModuleManager, host: &Host, line: &str, session: &mut Session) {
    let Some(argv) = host.parse(line, session) else {
        info!("Ignoring message without a known command: {:?}", line);
        return;
    };

    match manager.handle_command(&argv, session, host).await {
        Ok(ModuleResult::Handled(Some(reply))) => println!("{}", reply),
        Ok(ModuleResult::Handled(None)) => {}
        Ok(ModuleResult::NotHandled) => info!("No module handled {}", argv.command),
        Err(e) => error!("Failed to handle {:?}: {}", line, e),
    }
}

/// Initialize logging
fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Generate default configuration file
fn generate_config(output: &Path) -> anyhow::Result<()> {
    let config = Config::default();
    config.to_file(output)?;
    println!("Generated default configuration file: {:?}", output);
    Ok(())
}
