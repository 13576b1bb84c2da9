use clap::Parser;
use depot_server::{
    config_path, install_shutdown_handler, resolve_home, InstanceLock, ServerConfig, ServerError,
    ServerState, PID_FILE,
};
use depot_store::Repository;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "depot", version, about = "Self-hosted artifact repository server")]
struct Cli {
    /// Home directory holding configuration, pid file and the default repository.
    /// Defaults to $DEPOT_HOME, then ~/.depot.
    #[arg(long)]
    home: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides the config file).
    #[arg(long)]
    bind: Option<String>,

    /// Repository root directory (overrides the config file).
    #[arg(long)]
    repository: Option<PathBuf>,

    /// Enable remote proxy fallback for local misses.
    #[arg(long, default_value_t = false)]
    proxy: bool,

    /// Number of request worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ServerError> {
    let home = cli.home.unwrap_or_else(resolve_home);
    let _lock = InstanceLock::acquire(&home.join(PID_FILE))?;

    let mut config = ServerConfig::load_or_init(&config_path(&home))?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(repository) = cli.repository {
        config.repository_root = Some(repository);
    }
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    config.proxy |= cli.proxy;

    let root = config.repository_root(&home);
    fs::create_dir_all(&root)?;

    let addr = config.addr();
    info!("starting depot on {addr}");
    info!("home directory: {}", home.display());
    info!("repository root: {}", root.display());
    if config.proxy {
        info!("remote proxy fallback enabled");
    }

    let repository = Repository::new(root).with_proxy(config.proxy);
    let state = Arc::new(ServerState::new(repository));
    let server = Arc::new(depot_server::bind(&addr)?);
    install_shutdown_handler(Arc::clone(&server), config.workers);

    depot_server::serve(&server, &state, config.workers);
    info!("depot stopped");
    Ok(())
}
