use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use parley_bot::application::services::BotService;
use parley_bot::infrastructure::adapters::ConsoleAdapter;
use parley_bot::infrastructure::config::Config;
use parley_bot::infrastructure::sandbox::{worker, Evaluator};
use parley_bot::plugins::greet::Greetings;
use parley_bot::plugins::memo::Memos;
use parley_bot::plugins::seen::Seen;
use parley_bot::plugins::Registry;

#[derive(Parser)]
#[command(name = "parley-bot")]
#[command(about = "An extensible chat bot core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console adapter
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Internal: run the sandboxed evaluation worker loop
    #[command(name = "eval-worker", hide = true)]
    EvalWorker,
}

fn main() {
    let cli = Cli::parse();

    // The worker's stdout is the pipe protocol, so it runs before any
    // logging is set up.
    if matches!(cli.command, Commands::EvalWorker) {
        if let Err(e) = worker::run() {
            eprintln!("eval worker failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match cli.command {
        Commands::Run => run_bot(cli.config),
        Commands::Version => println!("parley-bot v{}", env!("CARGO_PKG_VERSION")),
        Commands::InitConfig => init_config(cli.config),
        Commands::EvalWorker => unreachable!("handled above"),
    }
}

fn run_bot(config_path: String) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting parley-bot as {}", config.bot.nickname);

    // The registry is mutable only during this setup phase; BotService
    // freezes it.
    let mut registry = Registry::new();
    register_plugins(&mut registry, &config);

    let evaluator = Arc::new(Mutex::new(Evaluator::new(config.evaluator_timeout())));
    BotService::register_defaults(&mut registry, evaluator);

    let service = BotService::new(registry, &config.bot.command_prefix);
    let adapter = ConsoleAdapter::new(&config.bot.nickname);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };
    rt.block_on(async {
        if let Err(e) = adapter.run(&service).await {
            tracing::error!("Bot terminated with error: {}", e);
        }
    });
}

/// Registers the bundled plugins named in the config. The plugin list is
/// an explicit startup decision; an unknown name is logged and skipped.
fn register_plugins(registry: &mut Registry, config: &Config) {
    for name in &config.plugins.enabled {
        let storage = match config.plugin_storage_dir(name) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Could not create storage for plugin '{}': {}", name, e);
                continue;
            }
        };
        match name.as_str() {
            "greet" => registry.register_plugin(Arc::new(Greetings::new(&storage))),
            "seen" => registry.register_plugin(Arc::new(Seen::new(&storage))),
            "memo" => registry.register_plugin(Arc::new(Memos::new(&storage))),
            other => tracing::warn!("Plugin '{}' could not be found.", other),
        }
    }
}

fn init_config(path: String) {
    let config = Config::default();
    match config.save(&path) {
        Ok(()) => println!("Wrote default config to {path}"),
        Err(e) => eprintln!("Failed to write config: {e}"),
    }
}
