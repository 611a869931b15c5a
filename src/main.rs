//! Mentor chat entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the LLM provider
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Spawn the idle session sweeper (unless disabled)
//!   8. Serve HTTP until shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use mentor_chat::comms::{self, AppState};
use mentor_chat::error::AppError;
use mentor_chat::llm::providers;
use mentor_chat::session;
use mentor_chat::{config, logger};

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let effective_log_level = args.log_level.unwrap_or(config.server.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level, config.server.log_file.as_deref())?;

    info!(
        bind = %config.server.bind,
        provider = %config.llm.provider,
        model = %config.llm.active_model(),
        configured_log_level = %config.server.log_level,
        effective_log_level = %effective_log_level,
        api_key_set = config.llm_api_key.is_some(),
        session_idle_secs = config.server.session_idle.map_or(0, |d| d.as_secs()),
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
    let state = AppState::new(provider, config.mentor.clone());

    // Shared shutdown token; Ctrl-C cancels it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    if let Some(idle) = config.server.session_idle {
        session::spawn_idle_sweeper(state.registry.clone(), idle, shutdown.clone());
    }

    comms::serve(&config.server.bind, state, shutdown).await
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut bind = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: mentor-chat [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -b, --bind <ADDR>          Listen address (overrides [server] bind and MENTOR_BIND)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "-b" | "--bind" => match iter.next() {
                Some(addr) => bind = Some(addr),
                None => {
                    eprintln!("error: -b/--bind requires an address argument");
                    std::process::exit(1);
                }
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs { log_level: logger::level_for_verbosity(verbosity), config_path, bind }
}
